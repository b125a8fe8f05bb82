use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::store::StoreConfig;
use crate::texts::{Texts, EN, ES};

pub const CONFIG_FILE: &str = "modclean.json";
pub const LOG_FILE: &str = "modclean.log";
pub const DEFAULT_BACKUP_DIR: &str = "backups";

// -----------------------------------------------------------------------------
// Theme & locale
// -----------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn detect() -> Self {
        Self::from_colorfgbg(env::var("COLORFGBG").ok().as_deref())
    }

    /// `COLORFGBG` is `fg;bg` (sometimes `fg;default;bg`). Backgrounds 0-6
    /// and 8 are the dark ANSI colors.
    pub fn from_colorfgbg(value: Option<&str>) -> Self {
        let bg = value
            .and_then(|v| v.rsplit(';').next())
            .and_then(|bg| bg.trim().parse::<u8>().ok());
        match bg {
            Some(0..=6) | Some(8) => Theme::Dark,
            _ => Theme::Light,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Es,
}

impl Locale {
    pub fn detect() -> Self {
        let tag = ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|key| env::var(key).ok())
            .find(|v| !v.is_empty());
        Self::from_tag(tag.as_deref())
    }

    /// English for `en*` and the C/POSIX locales, Spanish for everything else.
    pub fn from_tag(tag: Option<&str>) -> Self {
        let tag = match tag {
            Some(t) => t.trim().to_ascii_lowercase(),
            None => return Locale::En,
        };
        if tag.starts_with("en") || tag == "c" || tag.starts_with("c.") || tag == "posix" {
            Locale::En
        } else {
            Locale::Es
        }
    }

    pub fn texts(self) -> &'static Texts {
        match self {
            Locale::En => &EN,
            Locale::Es => &ES,
        }
    }
}

/// Resolved once at startup and handed to the shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub theme: Theme,
    pub locale: Locale,
}

// -----------------------------------------------------------------------------
// Config file
// -----------------------------------------------------------------------------

fn default_backup_dir() -> PathBuf {
    PathBuf::from(DEFAULT_BACKUP_DIR)
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    #[serde(default)]
    pub theme: Option<Theme>,

    #[serde(default)]
    pub locale: Option<Locale>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backup_dir: default_backup_dir(),
            theme: None,
            locale: None,
        }
    }
}

impl AppConfig {
    /// Reads `modclean.json` from `base_dir`. A missing file gives defaults;
    /// a relative `backup_dir` is taken from `base_dir`.
    pub fn load(base_dir: &Path) -> Result<Self> {
        let path = base_dir.join(CONFIG_FILE);
        let mut config = match fs::read_to_string(&path) {
            Ok(txt) => serde_json::from_str::<AppConfig>(&txt)
                .map_err(|e| Error::Parse { path, source: e })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => AppConfig::default(),
            Err(e) => return Err(Error::io(&path, e)),
        };

        if config.backup_dir.is_relative() {
            config.backup_dir = base_dir.join(&config.backup_dir);
        }
        Ok(config)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            backup_dir: self.backup_dir.clone(),
        }
    }

    pub fn settings(&self) -> Settings {
        Settings {
            theme: self.theme.unwrap_or_else(Theme::detect),
            locale: self.locale.unwrap_or_else(Locale::detect),
        }
    }
}

/// Directory holding the executable; backups, config and log live there.
pub fn program_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
