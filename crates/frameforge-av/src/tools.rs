//! External tool discovery.
//!
//! Only the command backend uses external tools. A configured path wins
//! when it exists; otherwise the tool is looked up on `PATH` with
//! [`which::which`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use frameforge_common::{Error, Result};
use serde::Serialize;

use crate::command::DEFAULT_TIMEOUT;

/// Tools the command backend can use.
pub const KNOWN_TOOLS: &[&str] = &["ffmpeg"];

/// Where to find external tools and how long they may run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSettings {
    /// Explicit ffmpeg location, used when it exists.
    pub ffmpeg_path: Option<PathBuf>,
    /// Maximum run time of one tool invocation.
    pub timeout: Duration,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ToolSettings {
    fn override_for(&self, name: &str) -> Option<&Path> {
        match name {
            "ffmpeg" => self.ffmpeg_path.as_deref(),
            _ => None,
        }
    }
}

/// Availability of one tool, as returned by [`check_tools`].
#[derive(Debug, Clone, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub available: bool,
    /// First line of the tool's version banner, if it ran.
    pub version: Option<String>,
    pub path: Option<PathBuf>,
}

/// Resolve a tool's executable path.
pub fn find_tool(name: &str, settings: &ToolSettings) -> Option<PathBuf> {
    match settings.override_for(name) {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        _ => which::which(name).ok(),
    }
}

/// Resolve a tool or fail with [`Error::Tool`].
pub fn require_tool(name: &str, settings: &ToolSettings) -> Result<PathBuf> {
    find_tool(name, settings)
        .ok_or_else(|| Error::tool(name, format!("{name} not found; is it installed and in PATH?")))
}

/// Check every known tool.
pub fn check_tools(settings: &ToolSettings) -> Vec<ToolInfo> {
    KNOWN_TOOLS
        .iter()
        .map(|&name| match find_tool(name, settings) {
            Some(path) => ToolInfo {
                name: name.to_string(),
                available: true,
                version: detect_version(&path),
                path: Some(path),
            },
            None => ToolInfo {
                name: name.to_string(),
                available: false,
                version: None,
                path: None,
            },
        })
        .collect()
}

fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tools_lists_known_tools() {
        let infos = check_tools(&ToolSettings::default());
        let names: Vec<&str> = infos.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, KNOWN_TOOLS);
        for info in &infos {
            assert_eq!(info.available, info.path.is_some());
        }
    }

    #[test]
    fn test_require_missing_tool() {
        let err = require_tool("nonexistent_tool_xyz", &ToolSettings::default()).unwrap_err();
        assert!(matches!(err, Error::Tool { .. }));
    }

    #[test]
    fn test_existing_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("ffmpeg-custom");
        std::fs::write(&fake, b"").unwrap();

        let settings = ToolSettings {
            ffmpeg_path: Some(fake.clone()),
            ..ToolSettings::default()
        };
        assert_eq!(find_tool("ffmpeg", &settings), Some(fake));
    }

    #[test]
    fn test_tool_info_serializes() {
        let info = ToolInfo {
            name: "ffmpeg".into(),
            available: false,
            version: None,
            path: None,
        };
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"available\":false"));
    }
}
