use crate::model::Status;
use crate::period::PeriodMode;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Period shown when no `--mode` is given.
    #[serde(default)]
    pub mode: PeriodMode,

    /// Status preselected for new todos, as an emoji or a status name.
    #[serde(default, rename = "default_emoji")]
    pub default_status: Status,

    /// Store directory used when no project `.dayplan` directory is found.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}


impl Config {
    pub fn load() -> Result<Self> {
        let path = project_dirs()?.config_dir().join("config.yml");
        Config::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
        let config: Config =
            serde_yaml::from_str(&data).with_context(|| format!("parsing {:?}", path))?;
        Ok(config)
    }
}

pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "dayplan").context("locating data directory")
}
