//! Project context
//!
//! Everything a reconciliation pass needs to know about the folder it works
//! on. Built once from the resolved configuration and passed to each call;
//! nothing here is global.

use sfa_common::config::{self, FieldNames, LogFileNames, TomlConfig};
use sfa_common::{Error, Result};
use std::path::{Path, PathBuf};

use crate::models::LogPaths;
use crate::utils::filename::is_bare_filename;

#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub audio_folder: PathBuf,
    /// Holding directory name, relative to the audio folder
    pub holding_folder: String,
    pub case_sensitive: bool,
    pub audio_extensions: Vec<String>,
    pub fields: FieldNames,
    pub log_files: LogFileNames,
}

impl ProjectContext {
    /// Context with default settings for `audio_folder`
    pub fn new(audio_folder: impl Into<PathBuf>) -> Self {
        let defaults = TomlConfig::default();
        Self {
            audio_folder: audio_folder.into(),
            holding_folder: defaults.holding_folder,
            case_sensitive: defaults.case_sensitive,
            audio_extensions: defaults.audio_extensions,
            fields: defaults.fields,
            log_files: defaults.log_files,
        }
    }

    /// Build from configuration
    ///
    /// **Audio folder priority:** CLI argument → `SFA_AUDIO_FOLDER` → TOML
    ///
    /// The holding folder must be a bare directory name inside the audio
    /// folder.
    pub fn from_config(audio_folder_arg: Option<&Path>, toml_config: &TomlConfig) -> Result<Self> {
        if !is_bare_filename(&toml_config.holding_folder) {
            return Err(Error::Config(format!(
                "holding_folder must be a plain directory name, got '{}'",
                toml_config.holding_folder
            )));
        }

        let audio_folder = config::resolve_audio_folder(audio_folder_arg, toml_config)?;
        tracing::info!(folder = %audio_folder.display(), "Audio folder resolved");

        Ok(Self {
            audio_folder,
            holding_folder: toml_config.holding_folder.clone(),
            case_sensitive: toml_config.case_sensitive,
            audio_extensions: toml_config.audio_extensions.clone(),
            fields: toml_config.fields.clone(),
            log_files: toml_config.log_files.clone(),
        })
    }

    pub fn with_holding_folder(mut self, name: impl Into<String>) -> Self {
        self.holding_folder = name.into();
        self
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn holding_path(&self) -> PathBuf {
        self.audio_folder.join(&self.holding_folder)
    }

    pub fn history_path(&self) -> PathBuf {
        self.audio_folder.join(&self.log_files.history)
    }

    pub fn change_log_path(&self) -> PathBuf {
        self.audio_folder.join(&self.log_files.change_log)
    }

    pub fn todo_log_path(&self) -> PathBuf {
        self.audio_folder.join(&self.log_files.todo_log)
    }

    pub fn log_paths(&self) -> LogPaths {
        LogPaths {
            history: self.history_path(),
            change_log: self.change_log_path(),
            todo_log: self.todo_log_path(),
        }
    }
}
