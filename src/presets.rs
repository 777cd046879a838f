//! presets - built-in multimedia command definitions
//!
//! Pure data served to the client; presets are never persisted. The Windows
//! variants press the virtual multimedia keys through WScript.Shell.

use crate::platform::Platform;
use serde::Serialize;

/// A preset button offered to the client alongside its stored commands.
#[derive(Debug, Clone, Serialize)]
pub struct PresetCommand {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub payload: &'static str,
    pub description: &'static str,
}

const fn preset(
    id: &'static str,
    label: &'static str,
    icon: &'static str,
    payload: &'static str,
    description: &'static str,
) -> PresetCommand {
    PresetCommand {
        id,
        label,
        icon,
        payload,
        description,
    }
}

// Virtual-key codes: 173 mute, 174 volume down, 175 volume up,
// 176 next track, 177 previous track, 179 play/pause.
const WINDOWS_PRESETS: &[PresetCommand] = &[
    preset(
        "preset-volume-up",
        "Volume Up",
        "🔊",
        "powershell -Command \"(New-Object -ComObject WScript.Shell).SendKeys([char]175)\"",
        "Raise the system volume",
    ),
    preset(
        "preset-volume-down",
        "Volume Down",
        "🔉",
        "powershell -Command \"(New-Object -ComObject WScript.Shell).SendKeys([char]174)\"",
        "Lower the system volume",
    ),
    preset(
        "preset-volume-mute",
        "Mute",
        "🔇",
        "powershell -Command \"(New-Object -ComObject WScript.Shell).SendKeys([char]173)\"",
        "Toggle system mute",
    ),
    preset(
        "preset-media-play-pause",
        "Play/Pause",
        "⏯️",
        "powershell -Command \"(New-Object -ComObject WScript.Shell).SendKeys([char]179)\"",
        "Play or pause the current audio",
    ),
    preset(
        "preset-media-next",
        "Next Track",
        "⏭️",
        "powershell -Command \"(New-Object -ComObject WScript.Shell).SendKeys([char]176)\"",
        "Skip to the next track",
    ),
    preset(
        "preset-media-previous",
        "Previous Track",
        "⏮️",
        "powershell -Command \"(New-Object -ComObject WScript.Shell).SendKeys([char]177)\"",
        "Return to the previous track",
    ),
];

const FALLBACK_PRESETS: &[PresetCommand] = &[preset(
    "preset-info",
    "Info",
    "ℹ️",
    "echo \"Multimedia presets are not available on this OS\"",
    "Multimedia presets target Windows",
)];

/// The static preset list for the given platform.
pub fn multimedia_presets(platform: Platform) -> &'static [PresetCommand] {
    match platform {
        Platform::Windows => WINDOWS_PRESETS,
        Platform::Posix => FALLBACK_PRESETS,
    }
}
