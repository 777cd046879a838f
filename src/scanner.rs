//! scanner - installed application discovery
//!
//! Windows-only convenience feature. Three independent source providers
//! (uninstall registry, Store packages, browser PWA shortcuts) each
//! contribute a script fragment; candidates are merged, deduplicated and
//! capped by a shared reducer. Every failure in the pipeline degrades to an
//! empty report, never to an error for the caller.

use crate::logging;
use crate::platform::{Platform, ShellAdapter};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use uuid::Uuid;

/// Candidate cap applied inside the scan script.
pub const SCRIPT_CANDIDATE_CAP: usize = 200;
/// Final cap applied when assembling the response.
pub const RESPONSE_CAP: usize = 100;

const COMPONENT: &str = "SCANNER";

/// One discovered application. Field names match the scan script's JSON
/// output (`Name`, `Icon`, `Path`, `Source`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledApp {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Icon", default)]
    pub icon: String,
    #[serde(rename = "Path", default)]
    pub path: String,
    #[serde(rename = "Source", default)]
    pub source: String,
}

/// Scan result returned to the API surface.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub success: bool,
    pub apps: Vec<InstalledApp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ScanReport {
    fn unsupported() -> Self {
        Self {
            success: false,
            apps: Vec::new(),
            message: Some("Installed application discovery is only available on Windows".to_string()),
        }
    }

    fn degraded(message: &str) -> Self {
        Self {
            success: false,
            apps: Vec::new(),
            message: Some(message.to_string()),
        }
    }
}

/// Registry source: both uninstall hives, generic update entries skipped,
/// kept when the name matches the consumer allow-list or the install
/// location is under Program Files.
fn registry_source_fragment() -> &'static str {
    r#"
$paths = @(
  'HKLM:\Software\Microsoft\Windows\CurrentVersion\Uninstall\*',
  'HKLM:\Software\Wow6432Node\Microsoft\Windows\CurrentVersion\Uninstall\*'
)

foreach ($path in $paths) {
  Get-ItemProperty $path -ErrorAction SilentlyContinue | Where-Object {
    $_.DisplayName -and $_.DisplayName -notlike 'Update for*'
  } | ForEach-Object {
    $icon = if ($_.DisplayIcon) { $_.DisplayIcon } else { '' }
    $location = if ($_.InstallLocation) { $_.InstallLocation } else { '' }
    $displayName = $_.DisplayName

    $isValid = $false

    $popularApps = @('Steam', 'Discord', 'Spotify', 'Chrome', 'Firefox', 'Brave', 'Opera', 'Visual Studio Code', 'Slack', 'Telegram', 'WhatsApp', 'Zoom', 'OBS', 'VLC', 'Netflix', 'Microsoft Word', 'Microsoft Excel', 'Microsoft PowerPoint', 'Microsoft Outlook', 'Microsoft OneNote', 'Microsoft Access', 'Microsoft Publisher', 'Microsoft Teams', 'Microsoft Office')
    foreach ($app in $popularApps) {
      if ($displayName -like "*$app*") {
        $isValid = $true
        break
      }
    }

    if (-not $isValid -and $location -like '*Program Files*') {
      $isValid = $true
    }

    if ($isValid) {
      $apps += [PSCustomObject]@{
        Name = $displayName
        Icon = $icon
        Path = $location
        Source = 'Registry'
      }
    }
  }
}
"#
}

/// Store-package source: store-signed AppX packages, platform and runtime
/// packages excluded, kept for allow-listed titles (with friendly-name
/// remapping) or any human-readable display name.
fn store_package_source_fragment() -> &'static str {
    r#"
try {
  $popularStoreApps = @('Netflix', 'Spotify', 'Disney', 'Prime Video', 'WhatsApp', 'Instagram', 'Facebook', 'Twitter', 'TikTok', 'Zoom')

  Get-AppxPackage | Where-Object {
    $_.NonRemovable -eq $false -and
    $_.Name -notlike '*Microsoft.Windows*' -and
    $_.Name -notlike '*Microsoft.VCLibs*' -and
    $_.Name -notlike '*Microsoft.NET*' -and
    $_.Name -notlike '*.NET*' -and
    $_.SignatureKind -eq 'Store'
  } | ForEach-Object {
    $manifest = Get-AppxPackageManifest $_.PackageFullName -ErrorAction SilentlyContinue
    $displayName = if ($manifest.Package.Properties.DisplayName) {
      $manifest.Package.Properties.DisplayName
    } else {
      $_.Name
    }

    $isPopular = $false
    foreach ($app in $popularStoreApps) {
      if ($_.Name -like "*$app*" -or $displayName -like "*$app*") {
        $isPopular = $true
        if ($_.Name -like "*Netflix*") { $displayName = "Netflix" }
        elseif ($_.Name -like "*Spotify*") { $displayName = "Spotify" }
        elseif ($_.Name -like "*Disney*") { $displayName = "Disney+" }
        elseif ($_.Name -like "*Prime*") { $displayName = "Prime Video" }
        break
      }
    }

    if (($isPopular -or ($displayName -notlike 'ms-resource:*' -and $displayName -notlike '*Framework*')) -and $displayName) {
      $apps += [PSCustomObject]@{
        Name = $displayName
        Icon = ''
        Path = $_.InstallLocation
        Source = 'Store'
      }
    }
  }
} catch {
}
"#
}

/// Shortcut source: `.lnk` files in the start menu, pinned taskbar and
/// desktop whose target is a known browser invoked with an app id. Those are
/// installed browser-hosted mini apps.
fn shortcut_source_fragment() -> &'static str {
    r#"
try {
  $shell = New-Object -ComObject WScript.Shell

  $searchPaths = @(
    "$env:APPDATA\Microsoft\Windows\Start Menu\Programs",
    "$env:APPDATA\Microsoft\Internet Explorer\Quick Launch\User Pinned\TaskBar",
    "$env:USERPROFILE\Desktop"
  )

  foreach ($searchPath in $searchPaths) {
    if (Test-Path $searchPath) {
      Get-ChildItem -Path $searchPath -Recurse -Filter "*.lnk" -ErrorAction SilentlyContinue | ForEach-Object {
        try {
          $shortcut = $shell.CreateShortcut($_.FullName)
          $targetPath = $shortcut.TargetPath
          $arguments = $shortcut.Arguments

          $isHostedApp = (
            ($targetPath -like "*chrome.exe" -or
             $targetPath -like "*msedge.exe" -or
             $targetPath -like "*chrome_proxy.exe" -or
             $targetPath -like "*brave.exe") -and
            $arguments -like "*--app-id=*"
          )

          if ($isHostedApp) {
            $appName = $_.BaseName
            if ($appName -notlike '*Uninstall*' -and $appName -notlike '*Update*') {
              $browser = "PWA"
              if ($targetPath -like "*chrome_proxy.exe" -or $targetPath -like "*brave.exe") {
                $browser = "Brave"
              } elseif ($targetPath -like "*chrome.exe") {
                $browser = "Chrome"
              } elseif ($targetPath -like "*msedge.exe") {
                $browser = "Edge"
              }

              $apps += [PSCustomObject]@{
                Name = "$appName ($browser)"
                Icon = $shortcut.IconLocation
                Path = """$targetPath"" $arguments"
                Source = 'PWA'
              }
            }
          }
        } catch {
        }
      }
    }
  }
} catch {
}
"#
}

/// Assemble the full scan script from the source fragments plus the shared
/// sort/dedup/cap tail.
pub fn build_scan_script() -> String {
    let mut script = String::from("$apps = @()\n");
    for fragment in [
        registry_source_fragment(),
        store_package_source_fragment(),
        shortcut_source_fragment(),
    ] {
        script.push_str(fragment);
    }
    script.push_str(&format!(
        r#"
$unique = $apps | Sort-Object Name -Unique | Select-Object -First {SCRIPT_CANDIDATE_CAP}
if ($unique.Count -gt 0) {{
  $unique | ConvertTo-Json -Depth 3 -Compress
}} else {{
  '[]'
}}
"#
    ));
    script
}

/// Merge candidate lists from all sources: sort by name, keep the first
/// occurrence per unique name, cap the result.
pub fn reduce_candidates(sources: Vec<Vec<InstalledApp>>, cap: usize) -> Vec<InstalledApp> {
    let mut merged: Vec<InstalledApp> = sources.into_iter().flatten().collect();
    merged.sort_by(|a, b| a.name.cmp(&b.name));
    merged.dedup_by(|a, b| a.name == b.name);
    merged.truncate(cap);
    merged
}

/// Parse the scan script's JSON output into candidates. A single object is
/// tolerated as a one-element list, entries without a name are dropped, and
/// unparseable output yields an empty list with a logged diagnostic.
pub fn candidates_from_json(raw: &str) -> Vec<InstalledApp> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "[]" {
        return Vec::new();
    }

    let value: serde_json::Value = match serde_json::from_str(trimmed) {
        Ok(v) => v,
        Err(e) => {
            logging::warn(
                COMPONENT,
                &format!("failed to parse scan output: {} (first bytes: {:.120})", e, trimmed),
            );
            return Vec::new();
        }
    };

    let items = match value {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };

    items
        .into_iter()
        .filter_map(|item| serde_json::from_value::<InstalledApp>(item).ok())
        .filter(|app| !app.name.is_empty())
        .collect()
}

/// Installed application scanner bound to the platform shell.
pub struct AppScanner {
    adapter: ShellAdapter,
}

impl AppScanner {
    pub fn new(adapter: ShellAdapter) -> Self {
        Self { adapter }
    }

    /// Run a full scan. Never fails past this boundary: unsupported
    /// platforms and pipeline failures both produce a degraded report.
    pub async fn scan(&self) -> ScanReport {
        if self.adapter.platform() != Platform::Windows {
            return ScanReport::unsupported();
        }

        match self.scan_windows().await {
            Ok(apps) => {
                logging::info(COMPONENT, &format!("discovered {} applications", apps.len()));
                ScanReport {
                    success: true,
                    apps,
                    message: None,
                }
            }
            Err(e) => {
                logging::warn(COMPONENT, &format!("scan failed: {:#}", e));
                ScanReport::degraded("Failed to enumerate installed applications")
            }
        }
    }

    async fn scan_windows(&self) -> Result<Vec<InstalledApp>> {
        let script_path = temp_script_path();
        fs::write(&script_path, build_scan_script())
            .await
            .context("Failed to write scan script")?;

        let command = format!(
            "powershell -NoProfile -ExecutionPolicy Bypass -File \"{}\"",
            script_path.display()
        );
        let outcome = self.adapter.spawn(&command).await;

        // Cleanup is best-effort; a leftover script is not surfaced.
        let _ = fs::remove_file(&script_path).await;

        let outcome = outcome.context("Failed to run scan script")?;
        if !outcome.exit_ok {
            bail!("scan script exited with an error: {}", outcome.stderr.trim());
        }

        let candidates = candidates_from_json(&outcome.stdout);
        Ok(reduce_candidates(vec![candidates], RESPONSE_CAP))
    }
}

fn temp_script_path() -> PathBuf {
    std::env::temp_dir().join(format!("deck-scan-{}.ps1", Uuid::new_v4()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app(name: &str, source: &str) -> InstalledApp {
        InstalledApp {
            name: name.to_string(),
            icon: String::new(),
            path: String::new(),
            source: source.to_string(),
        }
    }

    #[test]
    fn test_script_includes_all_three_sources() {
        let script = build_scan_script();
        assert!(script.contains("CurrentVersion\\Uninstall"));
        assert!(script.contains("Get-AppxPackage"));
        assert!(script.contains("--app-id="));
        assert!(script.contains("Sort-Object Name -Unique"));
        assert!(script.contains("-First 200"));
    }

    #[test]
    fn test_reducer_dedups_by_name_keeping_first_after_sort() {
        let registry = vec![app("Spotify", "Registry"), app("Steam", "Registry")];
        let store = vec![app("Spotify", "Store"), app("Netflix", "Store")];

        let reduced = reduce_candidates(vec![registry, store], RESPONSE_CAP);
        let names: Vec<_> = reduced.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Netflix", "Spotify", "Steam"]);
        // first occurrence in sorted order wins
        assert_eq!(reduced[1].source, "Registry");
    }

    #[test]
    fn test_reducer_is_case_sensitive_on_names() {
        let reduced = reduce_candidates(
            vec![vec![app("spotify", "Registry"), app("Spotify", "Store")]],
            RESPONSE_CAP,
        );
        assert_eq!(reduced.len(), 2);
    }

    #[test]
    fn test_reducer_caps_result() {
        let many: Vec<InstalledApp> = (0..250).map(|i| app(&format!("App {:03}", i), "Registry")).collect();
        let reduced = reduce_candidates(vec![many], RESPONSE_CAP);
        assert_eq!(reduced.len(), RESPONSE_CAP);
    }

    #[test]
    fn test_candidates_from_json_accepts_array_and_single_object() {
        let array = r#"[{"Name":"Steam","Icon":"","Path":"C:\\Steam","Source":"Registry"}]"#;
        assert_eq!(candidates_from_json(array).len(), 1);

        let single = r#"{"Name":"Steam","Source":"Registry"}"#;
        let apps = candidates_from_json(single);
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].icon, "");
    }

    #[test]
    fn test_candidates_from_json_drops_nameless_entries() {
        let raw = r#"[{"Name":"Steam"},{"Icon":"x"},{"Name":""}]"#;
        let apps = candidates_from_json(raw);
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].name, "Steam");
    }

    #[test]
    fn test_candidates_from_json_tolerates_garbage() {
        assert!(candidates_from_json("").is_empty());
        assert!(candidates_from_json("[]").is_empty());
        assert!(candidates_from_json("not json at all").is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_scan_is_unsupported_off_windows() {
        let scanner = AppScanner::new(ShellAdapter::new(Platform::Posix));
        let report = scanner.scan().await;
        assert!(!report.success);
        assert!(report.apps.is_empty());
        assert!(report.message.unwrap().contains("Windows"));
    }
}
