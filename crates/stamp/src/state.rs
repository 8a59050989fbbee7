use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StampError;

/// Remembered between runs: the date stamp the next template run replaces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StampState {
    pub old_text: String,
    #[serde(default)]
    pub template: Option<String>,
}

impl StampState {
    pub fn new(old_text: impl Into<String>) -> Self {
        Self {
            old_text: old_text.into(),
            template: None,
        }
    }

    /// Saved state, or a fresh one when the file is missing or unreadable
    pub fn load(path: &Path, default_old_text: &str) -> Self {
        let Ok(raw) = fs::read_to_string(path) else {
            return Self::new(default_old_text);
        };
        match serde_json::from_str::<StampState>(&raw) {
            Ok(state) if !state.old_text.is_empty() => state,
            Ok(_) => Self::new(default_old_text),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable stamp state");
                Self::new(default_old_text)
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StampError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
