//! Configuration loading and audio folder resolution
//!
//! Bootstrap configuration comes from a single TOML file. Every key is
//! optional; a missing file means compiled defaults.
//!
//! # Resolution priority
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`SFA_CONFIG`, `SFA_AUDIO_FOLDER`)
//! 3. TOML config file (`~/.config/sfa/config.toml`)
//! 4. Compiled defaults

use crate::rules::Rule;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "SFA_CONFIG";

/// Environment variable naming the audio folder
pub const AUDIO_FOLDER_ENV_VAR: &str = "SFA_AUDIO_FOLDER";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    /// Audio folder to reconcile (optional, may come from CLI or environment)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_folder: Option<PathBuf>,

    /// Name of the holding subdirectory for unassociated files
    pub holding_folder: String,

    /// Compare base names case-sensitively
    pub case_sensitive: bool,

    /// When no rule applies, expect a recording even if the field is empty
    pub include_empty_fields: bool,

    /// File extensions (without dot, matched case-insensitively) treated as audio
    pub audio_extensions: Vec<String>,

    /// Names of the distinguished catalog fields
    pub fields: FieldNames,

    /// File names of the logs written into the audio folder
    pub log_files: LogFileNames,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Field name -> inclusion rule
    pub rules: BTreeMap<String, Rule>,

    /// Group name -> member field names
    pub groups: BTreeMap<String, Vec<String>>,

    /// Group name -> inclusion rule inherited by member fields
    pub group_rules: BTreeMap<String, Rule>,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            audio_folder: None,
            holding_folder: "orphans".to_string(),
            case_sensitive: false,
            include_empty_fields: true,
            audio_extensions: vec!["wav".to_string()],
            fields: FieldNames::default(),
            log_files: LogFileNames::default(),
            logging: LoggingConfig::default(),
            rules: BTreeMap::new(),
            groups: BTreeMap::new(),
            group_rules: BTreeMap::new(),
        }
    }
}

/// Distinguished catalog field names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FieldNames {
    pub sound_file: String,
    pub reference: String,
    pub gloss: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            sound_file: "SoundFile".to_string(),
            reference: "Reference".to_string(),
            gloss: "Gloss".to_string(),
        }
    }
}

/// Log file names, relative to the audio folder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LogFileNames {
    pub history: String,
    pub change_log: String,
    pub todo_log: String,
}

impl Default for LogFileNames {
    fn default() -> Self {
        Self {
            history: "soundfile_changes.json".to_string(),
            change_log: "soundfile_changes.md".to_string(),
            todo_log: "unrecorded_fields.md".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Locate the config file following the resolution priority
///
/// Returns `None` when no explicit path was given and the default location
/// does not exist.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|p| p.exists())
}

/// Platform config location (`~/.config/sfa/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sfa").join("config.toml"))
}

/// Load configuration, falling back to defaults when no file is found
///
/// An explicitly named file (CLI or environment) that does not exist is an
/// error; a missing default file is not.
pub fn load_config(cli_arg: Option<&Path>) -> Result<TomlConfig> {
    let explicit = cli_arg.is_some() || std::env::var_os(CONFIG_ENV_VAR).is_some();

    match resolve_config_path(cli_arg) {
        Some(path) if path.exists() => {
            let config = load_toml_config(&path)?;
            info!(path = %path.display(), "Loaded configuration");
            Ok(config)
        }
        Some(path) if explicit => Err(Error::Config(format!(
            "Config file not found: {}",
            path.display()
        ))),
        _ => {
            warn!("No config file found, using compiled defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;
    debug!(
        path = %path.display(),
        rules = config.rules.len(),
        groups = config.groups.len(),
        "Parsed TOML config"
    );
    Ok(config)
}

/// Resolve the audio folder: CLI → environment → TOML
pub fn resolve_audio_folder(cli_arg: Option<&Path>, config: &TomlConfig) -> Result<PathBuf> {
    if let Some(path) = cli_arg {
        return Ok(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(AUDIO_FOLDER_ENV_VAR) {
        if !path.trim().is_empty() {
            return Ok(PathBuf::from(path));
        }
    }

    config.audio_folder.clone().ok_or_else(|| {
        Error::Config(format!(
            "Audio folder not configured. Use --audio-folder, {} or audio_folder in the config file",
            AUDIO_FOLDER_ENV_VAR
        ))
    })
}

/// Write config atomically (temp file + rename)
///
/// On Unix the file is created with 0600 permissions.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }

    debug!(path = %path.display(), "Wrote TOML config");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_keys_missing() {
        let config: TomlConfig = toml::from_str("case_sensitive = true").unwrap();
        assert!(config.case_sensitive);
        assert_eq!(config.holding_folder, "orphans");
        assert!(config.include_empty_fields);
        assert_eq!(config.audio_extensions, vec!["wav".to_string()]);
        assert_eq!(config.fields.sound_file, "SoundFile");
        assert_eq!(config.log_files.todo_log, "unrecorded_fields.md");
    }

    #[test]
    fn test_partial_field_names_keep_defaults() {
        let config: TomlConfig = toml::from_str("[fields]\ngloss = \"English\"\n").unwrap();
        assert_eq!(config.fields.gloss, "English");
        assert_eq!(config.fields.reference, "Reference");
    }

    #[test]
    fn test_audio_folder_from_config() {
        let config = TomlConfig {
            audio_folder: Some(PathBuf::from("/data/audio")),
            ..Default::default()
        };
        let folder = resolve_audio_folder(Some(Path::new("/cli/audio")), &config).unwrap();
        assert_eq!(folder, PathBuf::from("/cli/audio"));
    }
}
