use crate::errors::{CliError, Result};

use hyperkey_core::deploy::ShellToolchain;
use hyperkey_core::persistence::RecordStore;
use hyperkey_core::store::BaseData;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use xdg::BaseDirectories;

const CONFIG_FILE: &str = "config.ron";

fn home() -> PathBuf {
    std::env::var_os("HOME").map_or_else(|| PathBuf::from("."), PathBuf::from)
}

/// Where the rules project lives and how to build and install it.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(default)]
pub struct Config {
    pub project_dir: PathBuf,
    /// Defaults to `rules.ts` inside `project_dir`.
    pub source_path: Option<PathBuf>,
    pub build_command: String,
    /// Build output, relative to `project_dir`.
    pub artifact: PathBuf,
    pub install_path: PathBuf,
    /// Overrides the xdg data directory for the editor bundle.
    pub data_dir: Option<PathBuf>,
    /// Keys the base rules reserve, e.g. the Hyper key itself.
    pub reserved_keys: Vec<String>,
    /// Keys claimed by rules outside the Hyper layout.
    pub third_party_keys: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        let home = home();
        Self {
            project_dir: home.join("karabiner-config"),
            source_path: None,
            build_command: "npm run build".to_owned(),
            artifact: PathBuf::from("karabiner.json"),
            install_path: home.join(".config").join("karabiner").join("karabiner.json"),
            data_dir: None,
            reserved_keys: vec!["caps_lock".to_owned()],
            third_party_keys: Vec::new(),
        }
    }
}

impl Config {
    pub fn source_path(&self) -> PathBuf {
        self.source_path
            .clone()
            .unwrap_or_else(|| self.project_dir.join("rules.ts"))
    }

    pub fn toolchain(&self) -> ShellToolchain {
        ShellToolchain {
            project_dir: self.project_dir.clone(),
            build_command: self.build_command.clone(),
            artifact: self.artifact.clone(),
            install_path: self.install_path.clone(),
        }
    }

    pub fn base_data(&self) -> BaseData {
        BaseData::new(self.reserved_keys.iter().cloned(), self.third_party_keys.iter().cloned())
    }

    /// # Errors
    ///
    /// Fails when the xdg data directory cannot be created.
    pub fn records(&self) -> Result<RecordStore> {
        match &self.data_dir {
            Some(dir) => Ok(RecordStore::new(dir)),
            None => Ok(RecordStore::default_location()?),
        }
    }
}

impl TryFrom<String> for Config {
    type Error = CliError;

    fn try_from(contents: String) -> Result<Self> {
        Ok(ron::from_str(&contents)?)
    }
}

/// # Errors
///
/// Errors when the config file exists but cannot be read or parsed. A missing file yields the
/// defaults.
pub fn load() -> Result<Config> {
    let path = BaseDirectories::with_prefix(hyperkey_core::HYPERKEY_DIR_NAME);
    let file_name = path.place_config_file(CONFIG_FILE)?;
    load_from(&file_name)
}

pub fn load_from(file_name: &Path) -> Result<Config> {
    if !file_name.exists() {
        tracing::info!("No config at {}, using defaults", file_name.display());
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(file_name)?;
    Config::try_from(contents)
}
