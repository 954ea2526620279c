use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// One group's entry in the settings file. Older files hold a bare string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupEntry {
    Text(String),
    Record {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        welcome_text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        welcome_img: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WelcomeOverride {
    pub text: Option<String>,
    pub img: Option<String>,
}

impl From<&GroupEntry> for WelcomeOverride {
    fn from(entry: &GroupEntry) -> Self {
        match entry {
            GroupEntry::Text(text) => WelcomeOverride {
                text: Some(text.clone()),
                img: None,
            },
            GroupEntry::Record {
                welcome_text,
                welcome_img,
            } => WelcomeOverride {
                text: welcome_text.clone(),
                img: welcome_img.clone(),
            },
        }
    }
}

impl From<WelcomeOverride> for GroupEntry {
    fn from(value: WelcomeOverride) -> Self {
        GroupEntry::Record {
            welcome_text: value.text,
            welcome_img: value.img,
        }
    }
}

pub type GroupSettings = BTreeMap<String, GroupEntry>;

/// Per-group settings kept in one JSON object, rewritten on every change.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self) -> Result<GroupSettings> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(GroupSettings::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("settings file {} not found, starting empty", self.path.display());
                Ok(GroupSettings::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn save(&self, settings: &GroupSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn welcome(&self, group_id: i64) -> Result<WelcomeOverride> {
        let settings = self.load()?;
        Ok(settings
            .get(&group_id.to_string())
            .map(WelcomeOverride::from)
            .unwrap_or_default())
    }

    pub fn set_welcome_text(&self, group_id: i64, text: &str) -> Result<()> {
        self.update(group_id, |w| w.text = Some(text.to_string()))
    }

    pub fn set_welcome_img(&self, group_id: i64, url: &str) -> Result<()> {
        self.update(group_id, |w| w.img = Some(url.to_string()))
    }

    /// Returns whether an entry was removed.
    pub fn clear_welcome(&self, group_id: i64) -> Result<bool> {
        let mut settings = self.load()?;
        let removed = settings.remove(&group_id.to_string()).is_some();
        if removed {
            self.save(&settings)?;
        } else {
            debug!("no welcome override to clear for group {}", group_id);
        }
        Ok(removed)
    }

    fn update(&self, group_id: i64, apply: impl FnOnce(&mut WelcomeOverride)) -> Result<()> {
        let mut settings = self.load()?;
        let key = group_id.to_string();
        let mut current = settings
            .get(&key)
            .map(WelcomeOverride::from)
            .unwrap_or_default();
        apply(&mut current);
        settings.insert(key, current.into());
        self.save(&settings)
    }
}
