use crate::core::ConfigProvider;
use crate::domain::model::{
    ClassificationRule, MarkerSettings, DEFAULT_COLOR, DEFAULT_FALLBACK_TITLE, DEFAULT_FPS,
    DEFAULT_PREFIX_LENGTH,
};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use chrono::{DateTime, TimeZone};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PROJECT_FILE: &str = "draft_content.json";
pub const DEFAULT_BACKUP_SUFFIX: &str = "_backup.bak";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub paths: PathsConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    pub backup: Option<BackupConfig>,
    #[serde(default)]
    pub rules: Vec<ClassificationRule>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Folder holding one sub-folder per editor project.
    pub projects_folder: String,
    pub xml_folder: String,
    pub project_file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsConfig {
    pub default_color: Option<String>,
    pub fallback_title: Option<String>,
    pub default_fps: Option<f64>,
    pub prefix_length: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupConfig {
    pub enabled: Option<bool>,
    pub suffix: Option<String>,
    pub timestamped: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown names stay as written.
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("paths.projects_folder", &self.paths.projects_folder)?;
        validation::validate_path("paths.xml_folder", &self.paths.xml_folder)?;
        validation::validate_path("paths.project_file", self.project_file())?;

        validation::validate_hex_color("settings.default_color", self.default_color())?;
        validation::validate_non_empty_string("settings.fallback_title", self.fallback_title())?;
        validation::validate_positive_float("settings.default_fps", self.default_fps())?;
        validation::validate_range("settings.prefix_length", self.prefix_length(), 1, 64)?;

        if let Some(backup) = &self.backup {
            if let Some(suffix) = &backup.suffix {
                validation::validate_non_empty_string("backup.suffix", suffix)?;
            }
        }

        for (i, rule) in self.rules.iter().enumerate() {
            validation::validate_hex_signature(
                &format!("rules[{}].signature_hex", i),
                &rule.signature_hex,
            )?;
            validation::validate_hex_color(&format!("rules[{}].color", i), &rule.color)?;
            validation::validate_non_empty_string(&format!("rules[{}].title", i), &rule.title)?;
        }

        Ok(())
    }

    pub fn project_file(&self) -> &str {
        self.paths
            .project_file
            .as_deref()
            .unwrap_or(DEFAULT_PROJECT_FILE)
    }

    pub fn default_color(&self) -> &str {
        self.settings.default_color.as_deref().unwrap_or(DEFAULT_COLOR)
    }

    pub fn fallback_title(&self) -> &str {
        self.settings
            .fallback_title
            .as_deref()
            .unwrap_or(DEFAULT_FALLBACK_TITLE)
    }

    pub fn default_fps(&self) -> f64 {
        self.settings.default_fps.unwrap_or(DEFAULT_FPS)
    }

    pub fn prefix_length(&self) -> usize {
        self.settings.prefix_length.unwrap_or(DEFAULT_PREFIX_LENGTH)
    }

    pub fn backup_enabled(&self) -> bool {
        self.backup
            .as_ref()
            .and_then(|b| b.enabled)
            .unwrap_or(true)
    }

    /// Name of the backup copy made next to the project file, if enabled.
    pub fn backup_file_name<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<String>
    where
        Tz::Offset: std::fmt::Display,
    {
        if !self.backup_enabled() {
            return None;
        }
        let backup = self.backup.clone().unwrap_or_default();
        let suffix = backup.suffix.as_deref().unwrap_or(DEFAULT_BACKUP_SUFFIX);

        if backup.timestamped.unwrap_or(false) {
            Some(format!(
                "{}_{}{}",
                self.project_file(),
                now.format("%Y%m%d_%H%M%S"),
                suffix
            ))
        } else {
            Some(format!("{}{}", self.project_file(), suffix))
        }
    }

    pub fn log_level(&self) -> Option<&str> {
        self.monitoring.as_ref().and_then(|m| m.log_level.as_deref())
    }
}

impl ConfigProvider for TomlConfig {
    fn xml_folder(&self) -> &str {
        &self.paths.xml_folder
    }

    fn project_file(&self) -> &str {
        TomlConfig::project_file(self)
    }

    fn prefix_length(&self) -> usize {
        TomlConfig::prefix_length(self)
    }

    fn marker_settings(&self) -> MarkerSettings {
        MarkerSettings {
            default_color: self.default_color().to_string(),
            fallback_title: self.fallback_title().to_string(),
            default_fps: self.default_fps(),
            rules: self.rules.clone(),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
