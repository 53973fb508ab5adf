//! Privilege requirements and platform privilege probes.
//!
//! Provides a platform-agnostic [`PlatformPrivileges`] trait with concrete
//! implementations:
//! - [`UnixPrivileges`]: effective-UID check via `nix`, `sudo -n` probe
//! - [`WindowsPrivileges`] (behind `cfg(windows)`): token-membership probe
//!   via `net session`, admin-group probe via `whoami /groups`
//!
//! Probe failures degrade to "not elevated" with a warning rather than
//! erroring; privilege state is advisory input to validation, and a probe
//! that cannot run means the privilege is not usably held.

use regex::RegexBuilder;

/// Platform-specific privilege queries.
///
/// One implementation per OS, selected once at construction. The
/// `can_elevate` probe must never prompt interactively.
pub trait PlatformPrivileges: Send + Sync {
    /// Whether the current process already runs with elevated privileges.
    fn has_elevation(&self) -> bool;

    /// Whether elevation is attainable without interaction (passwordless
    /// sudo, or membership in an administrators group).
    fn can_elevate(&self) -> bool;
}

/// POSIX privilege checks.
pub struct UnixPrivileges;

#[cfg(unix)]
impl PlatformPrivileges for UnixPrivileges {
    fn has_elevation(&self) -> bool {
        nix::unistd::geteuid().is_root()
    }

    fn can_elevate(&self) -> bool {
        // `sudo -n` fails immediately instead of prompting, which is the
        // whole point: this probe must never block on a password.
        match std::process::Command::new("sudo")
            .args(["-n", "true"])
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::warn!(error = %e, "sudo probe unavailable, assuming no elevation path");
                false
            }
        }
    }
}

#[cfg(not(unix))]
impl PlatformPrivileges for UnixPrivileges {
    fn has_elevation(&self) -> bool {
        tracing::warn!("POSIX privilege API unavailable on this platform");
        false
    }

    fn can_elevate(&self) -> bool {
        false
    }
}

/// Windows privilege checks.
#[cfg(windows)]
pub struct WindowsPrivileges;

#[cfg(windows)]
impl PlatformPrivileges for WindowsPrivileges {
    fn has_elevation(&self) -> bool {
        // `net session` succeeds only from a token with Administrators
        // membership; this stands in for an OpenProcessToken query
        // without a Win32 binding.
        match std::process::Command::new("net")
            .arg("session")
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
        {
            Ok(status) => status.success(),
            Err(e) => {
                tracing::warn!(error = %e, "token probe unavailable, assuming not elevated");
                false
            }
        }
    }

    fn can_elevate(&self) -> bool {
        // S-1-5-32-544 is the well-known Administrators group SID; its
        // presence in the token's group list means UAC elevation is
        // available to this account.
        match std::process::Command::new("whoami").args(["/groups"]).output() {
            Ok(output) => String::from_utf8_lossy(&output.stdout).contains("S-1-5-32-544"),
            Err(e) => {
                tracing::warn!(error = %e, "group probe unavailable, assuming no elevation path");
                false
            }
        }
    }
}

/// The privilege implementation for the current platform.
fn platform_privileges() -> Box<dyn PlatformPrivileges> {
    #[cfg(windows)]
    {
        Box::new(WindowsPrivileges)
    }
    #[cfg(not(windows))]
    {
        Box::new(UnixPrivileges)
    }
}

/// Administrative-operation signatures: commands that need elevation on
/// their native platform regardless of who asks.
const ADMIN_PATTERNS: &[(&str, &str)] = &[
    (
        r"\b(start|stop|restart|set|new)-service\b|\bsc(\.exe)?\s+(start|stop|config|create|delete)\b|\bnet\s+(start|stop)\b",
        "service control",
    ),
    (
        r"\bsystemctl\s+(start|stop|restart|reload|enable|disable|mask)\b|\bservice\s+\S+\s+(start|stop|restart)\b",
        "service control",
    ),
    (
        r"netsh\s+advfirewall|\b(new|set|remove)-netfirewallrule\b|set-netfirewallprofile|\bufw\b|\biptables\b|firewall-cmd",
        "firewall configuration",
    ),
    (
        r"\breg\s+(add|delete|import)\b|\b(set|new|remove)-itemproperty\s+.*(hklm:|hkey_local_machine)",
        "registry mutation",
    ),
    (
        r"\b(copy-item|move-item|cp|mv)\s+.*\s(c:\\windows|/usr/(bin|lib|sbin)|/etc)\b|>>?\s*/etc/",
        "system path mutation",
    ),
    (
        r"\bnet\s+(user|localgroup)\b|\b(new|remove)-localuser\b|\b(add|remove)-localgroupmember\b|\buser(add|mod|del)\b|\bgroup(add|mod|del)\b|\bchpasswd\b",
        "user or group management",
    ),
    (
        r"\bformat\s+[a-z]:|format-volume|clear-disk|initialize-disk|\bdiskpart\b|\bmkfs|\bfdisk\b|\bmount\b|\bumount\b",
        "disk management",
    ),
    (r"set-executionpolicy\b", "execution policy change"),
    (
        r"\b(apt|apt-get|yum|dnf|zypper)\s+(install|remove|purge|upgrade)\b|\bdpkg\s+-i\b|\bmsiexec\b|\bchoco\s+install\b",
        "system package management",
    ),
    (r"^\s*sudo\b|^\s*doas\b", "explicit privilege escalation"),
];

/// Determines whether commands need elevation and whether the process
/// has (or can obtain) it.
pub struct PermissionChecker {
    admin_patterns: Vec<(regex::Regex, &'static str)>,
    privileges: Box<dyn PlatformPrivileges>,
}

impl PermissionChecker {
    /// Checker with the platform-appropriate privilege implementation.
    pub fn new() -> Self {
        Self::with_privileges(platform_privileges())
    }

    /// Checker with an injected privilege implementation (tests, or an
    /// embedding that already knows its token state).
    pub fn with_privileges(privileges: Box<dyn PlatformPrivileges>) -> Self {
        let admin_patterns = ADMIN_PATTERNS
            .iter()
            .filter_map(|(pat, label)| {
                RegexBuilder::new(pat)
                    .case_insensitive(true)
                    .build()
                    .ok()
                    .map(|re| (re, *label))
            })
            .collect();
        Self {
            admin_patterns,
            privileges,
        }
    }

    /// Whether the command matches a fixed administrative-operation
    /// signature.
    pub fn requires_elevation(&self, command: &str) -> bool {
        self.matched_admin_operation(command).is_some()
    }

    /// The kind of administrative operation the command performs, if any.
    pub fn matched_admin_operation(&self, command: &str) -> Option<&'static str> {
        self.admin_patterns
            .iter()
            .find(|(re, _)| re.is_match(command))
            .map(|(_, label)| *label)
    }

    /// Whether the current process holds elevated privileges.
    pub fn has_elevation(&self) -> bool {
        self.privileges.has_elevation()
    }

    /// Whether elevation could be obtained without prompting.
    pub fn can_elevate(&self) -> bool {
        self.privileges.can_elevate()
    }

    /// Number of compiled administrative patterns.
    pub fn pattern_count(&self) -> usize {
        self.admin_patterns.len()
    }
}

impl Default for PermissionChecker {
    fn default() -> Self {
        Self::new()
    }
}
