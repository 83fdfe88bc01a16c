// Theme - Light/dark appearance, persisted per device

use crate::host::Storage;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const THEME_KEY: &str = "metronomeTheme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    /// Stored theme, or dark if missing or unrecognized
    pub fn load(storage: &dyn Storage) -> Self {
        match storage.get(THEME_KEY) {
            Some(value) => Self::parse(&value).unwrap_or_else(|| {
                log::warn!("Unknown stored theme {:?}, using dark", value);
                Theme::Dark
            }),
            None => Theme::Dark,
        }
    }

    pub fn save(&self, storage: &mut dyn Storage) {
        if let Err(e) = storage.set(THEME_KEY, self.as_str()) {
            log::warn!("Could not persist theme: {}", e);
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
