use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{GeneratorError, Result};

pub const DEFAULT_DATA_ROWS: u32 = 200;
pub const DEFAULT_VERSION_ID: &str = "public.RF_CURRENT";
pub const DEFAULT_START_COLUMN: &str = "StartMonth";
pub const DEFAULT_END_COLUMN: &str = "EndMonth";

// ---------------------------------------------------------------------------
// Application settings (~/.config/sacgen/settings.json)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_projects_dir_string")]
    pub projects_dir: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            projects_dir: default_projects_dir_string(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("sacgen")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_projects_dir_string() -> String {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("sacgen")
        .to_string_lossy()
        .to_string()
}

pub fn load_settings() -> AppSettings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        serde_json::from_str(&content).unwrap_or_default()
    } else {
        AppSettings::default()
    }
}

pub fn save_settings(settings: &AppSettings) -> Result<()> {
    std::fs::create_dir_all(config_dir())?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| GeneratorError::Configuration(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn get_projects_dir() -> PathBuf {
    PathBuf::from(&load_settings().projects_dir)
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

// ---------------------------------------------------------------------------
// Project settings (config/project.json)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub sac_connection: Connection,
    #[serde(default)]
    pub version: VersionConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<ManualDateRange>,
    #[serde(default)]
    pub settings: GenerationSettings,
    #[serde(default)]
    pub colors: Palette,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub model_id: String,
    #[serde(default)]
    pub version_model_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionConfig {
    #[serde(default = "default_version_id")]
    pub version_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub start_column: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub end_column: String,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            version_id: default_version_id(),
            start_column: String::new(),
            end_column: String::new(),
        }
    }
}

impl VersionConfig {
    /// Configured start column, or `StartMonth` when blank.
    pub fn start_column(&self) -> &str {
        match self.start_column.trim() {
            "" => DEFAULT_START_COLUMN,
            col => col,
        }
    }

    /// Configured end column, or `EndMonth` when blank.
    pub fn end_column(&self) -> &str {
        match self.end_column.trim() {
            "" => DEFAULT_END_COLUMN,
            col => col,
        }
    }
}

fn default_version_id() -> String {
    DEFAULT_VERSION_ID.to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManualDateRange {
    #[serde(default)]
    pub start_month: String,
    #[serde(default)]
    pub end_month: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default = "default_data_rows")]
    pub data_rows: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            data_rows: default_data_rows(),
        }
    }
}

fn default_data_rows() -> u32 {
    DEFAULT_DATA_ROWS
}

/// Upload sheet fills as `#RRGGBB` strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Palette {
    #[serde(default = "default_dim_header")]
    pub dim_header: String,
    #[serde(default = "default_date_header")]
    pub date_header: String,
    #[serde(default = "default_dim_cell")]
    pub dim_cell: String,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            dim_header: default_dim_header(),
            date_header: default_date_header(),
            dim_cell: default_dim_cell(),
        }
    }
}

fn default_dim_header() -> String {
    "#C6E0B4".to_string()
}

fn default_date_header() -> String {
    "#BDD7EE".to_string()
}

fn default_dim_cell() -> String {
    "#E2EFDA".to_string()
}

impl ProjectSettings {
    /// Starter document written by `init`.
    pub fn starter(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: "SAC Template Generator Project".to_string(),
            sac_connection: Connection {
                base_url: "https://YOUR-TENANT.eu20.analytics.cloud.sap".to_string(),
                model_id: "YOUR_MODEL_ID".to_string(),
                version_model_id: "YOUR_VERSION_MODEL_ID".to_string(),
            },
            ..Self::default()
        }
    }

    pub fn base_url_configured(&self) -> bool {
        let url = self.sac_connection.base_url.trim();
        !url.is_empty() && !url.contains("YOUR-TENANT")
    }

    pub fn model_id_configured(&self) -> bool {
        let id = self.sac_connection.model_id.trim();
        !id.is_empty() && !id.contains("YOUR_MODEL_ID")
    }
}
