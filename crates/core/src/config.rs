use crate::planner::DEFAULT_TEMPLATE;
use crate::rules::RenameRule;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApplyModeSetting {
    #[default]
    Copy,
    Rename,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub template: String,
    pub recursive_default: bool,
    pub include_hidden_default: bool,
    pub apply_mode: ApplyModeSetting,
    // Kept last: TOML writes arrays of tables after plain keys.
    pub rules: Vec<RenameRule>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            recursive_default: false,
            include_hidden_default: false,
            apply_mode: ApplyModeSetting::Copy,
            rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
    pub presets_path: PathBuf,
}

impl AppPaths {
    pub fn in_dir(config_dir: &Path) -> Self {
        Self {
            config_path: config_dir.join("config.toml"),
            presets_path: config_dir.join("presets.json"),
            config_dir: config_dir.to_path_buf(),
        }
    }
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "pattern-renamer", "pattern-renamer")
        .context("could not determine the OS config directory")?;
    Ok(AppPaths::in_dir(proj.config_dir()))
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&app_paths()?.config_path)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    save_config_to(config, &app_paths()?)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("could not read config file: {}", path.display()))?;
    let config = toml::from_str::<AppConfig>(&raw)
        .with_context(|| format!("could not parse config file: {}", path.display()))?;
    Ok(config)
}

pub fn save_config_to(config: &AppConfig, paths: &AppPaths) -> Result<()> {
    fs::create_dir_all(&paths.config_dir).with_context(|| {
        format!(
            "could not create config directory: {}",
            paths.config_dir.display()
        )
    })?;
    let body = toml::to_string_pretty(config).context("could not serialize config")?;
    fs::write(&paths.config_path, body).with_context(|| {
        format!(
            "could not write config file: {}",
            paths.config_path.display()
        )
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let temp = tempdir().expect("tempdir");
        let config = load_config_from(&temp.path().join("config.toml")).expect("load");
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let temp = tempdir().expect("tempdir");
        let paths = AppPaths::in_dir(&temp.path().join("nested"));
        let config = AppConfig {
            template: "@param2_@counter".to_string(),
            rules: vec![RenameRule::new("IMG", "PHOTO")],
            recursive_default: true,
            include_hidden_default: false,
            apply_mode: ApplyModeSetting::Rename,
        };

        save_config_to(&config, &paths).expect("save");
        assert_eq!(load_config_from(&paths.config_path).expect("load"), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "apply_mode = \"rename\"\n").expect("write");
        let config = load_config_from(&path).expect("load");
        assert_eq!(config.apply_mode, ApplyModeSetting::Rename);
        assert_eq!(config.template, DEFAULT_TEMPLATE);
    }

    #[test]
    fn broken_file_is_reported() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "template = [").expect("write");
        let err = load_config_from(&path).expect_err("must fail");
        assert!(err.to_string().contains("could not parse config file"));
    }
}
