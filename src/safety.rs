//! safety - denylist gate applied before any shell spawn
//!
//! This is a best-effort guard against the most destructive commands, not a
//! sandbox. Matching is case-insensitive substring only: no tokenization, no
//! path resolution, no argument parsing.

use crate::platform::Platform;

/// Substrings rejected on every platform.
const BLOCKED: &[&str] = &["rm ", "del ", "shutdown", "format"];

/// Substrings rejected on Windows only. `powershell -enc` covers
/// base64-obfuscated one-liners.
const BLOCKED_WINDOWS: &[&str] = &["powershell -enc"];

/// Decide whether a raw payload may be handed to the shell.
pub fn is_allowed(payload: &str, platform: Platform) -> bool {
    let lowered = payload.to_lowercase();

    if BLOCKED.iter().any(|blocked| lowered.contains(blocked)) {
        return false;
    }

    if platform == Platform::Windows
        && BLOCKED_WINDOWS.iter().any(|blocked| lowered.contains(blocked))
    {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_rm_anywhere_in_payload() {
        assert!(!is_allowed("rm -rf /", Platform::Posix));
        assert!(!is_allowed("echo hi && rm -rf /tmp/x", Platform::Posix));
        assert!(!is_allowed("RM -rf /", Platform::Windows));
    }

    #[test]
    fn test_rejects_shutdown_and_format_on_all_platforms() {
        assert!(!is_allowed("shutdown /s /t 0", Platform::Windows));
        assert!(!is_allowed("shutdown now", Platform::Posix));
        assert!(!is_allowed("format C:", Platform::Windows));
        assert!(!is_allowed("echo Format", Platform::Posix));
    }

    #[test]
    fn test_rejects_del() {
        assert!(!is_allowed("del C:\\temp\\x.txt", Platform::Windows));
        assert!(!is_allowed("DEL foo", Platform::Posix));
    }

    #[test]
    fn test_encoded_powershell_rejected_only_on_windows() {
        let payload = "powershell -EncodedCommand SQBFAFgA";
        assert!(!is_allowed(payload, Platform::Windows));
        assert!(is_allowed(payload, Platform::Posix));
    }

    #[test]
    fn test_allows_ordinary_commands() {
        assert!(is_allowed("notepad.exe", Platform::Windows));
        assert!(is_allowed("echo hello", Platform::Posix));
        // "rm" without the trailing space is not a denylist hit
        assert!(is_allowed("confirm", Platform::Posix));
    }
}
