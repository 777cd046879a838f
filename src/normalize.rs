//! normalize - platform rewriting of a payload before execution
//!
//! Windows-only heuristics for the two cases remote triggers actually hit:
//! opening a URL in the default browser, and launching an absolute path that
//! contains spaces. Everything else passes through untouched, as does every
//! payload on non-Windows platforms.

use crate::platform::Platform;
use regex::Regex;

lazy_static::lazy_static! {
    static ref URL_PATTERN: Regex = Regex::new(r"(?i)^(https?://|www\.)").unwrap();
    // Leading drive path, ending at an extension boundary or end of payload.
    static ref DRIVE_PATH: Regex =
        Regex::new(r#"^([A-Za-z]:\\[^"]+?\.[A-Za-z0-9]+)(\s|$)"#).unwrap();
}

/// Rewrite a payload for the target platform.
pub fn normalize(payload: &str, platform: Platform) -> String {
    if platform != Platform::Windows {
        return payload.to_string();
    }

    let trimmed = payload.trim();

    // URLs open through the default handler. The empty "" is the window
    // title, so the URL itself stays a single quoted argument.
    if URL_PATTERN.is_match(trimmed) {
        return format!("start \"\" \"{}\"", trimmed);
    }

    // Quote a leading drive path with spaces so cmd.exe does not split it.
    if let Some(caps) = DRIVE_PATH.captures(payload) {
        let path = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        if path.contains(' ') && !payload.starts_with('"') {
            return payload.replacen(path, &format!("\"{}\"", path), 1);
        }
    }

    payload.to_string()
}
