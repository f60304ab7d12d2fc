use crate::compiler_messages::compiler_errors::CompilerError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const DISPOSE_RULE_ID: &str = "DISPOSE001";
pub const CONFIG_FILE_NAME: &str = "leakcheck.toml";

/// Which exit states count as a leak
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisposeAnalysisKind {
    /// Not disposed, or only disposed or escaped inside exception handlers
    #[default]
    NonExceptionPaths,

    /// Exactly `NotDisposed` at exit
    OnlyNotDisposed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub kind: DisposeAnalysisKind,

    // `Type.Method`, bare `Method`, or `Type.*`
    pub excluded_methods: Vec<String>,
    pub sort_diagnostics: bool,
    pub parallel: bool,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            kind: DisposeAnalysisKind::default(),
            excluded_methods: Vec::new(),
            sort_diagnostics: true,
            parallel: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub analysis: AnalysisSettings,
}

impl Config {
    pub fn from_toml_str(source: &str, path: &Path) -> Result<Self, CompilerError> {
        toml::from_str(source).map_err(|error| {
            CompilerError::new_config_error(path, format!("Invalid config file: {error}"))
        })
    }

    /// A missing file means the defaults
    pub fn load(path: &Path) -> Result<Self, CompilerError> {
        match fs::read_to_string(path) {
            Ok(source) => Self::from_toml_str(&source, path),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(CompilerError::new_config_error(
                path,
                format!("Could not read config file: {error}"),
            )),
        }
    }

    pub fn is_excluded(&self, containing_type: &str, method_name: &str) -> bool {
        self.analysis.excluded_methods.iter().any(|pattern| {
            if let Some(type_pattern) = pattern.strip_suffix(".*") {
                return type_pattern == containing_type;
            }

            match pattern.rsplit_once('.') {
                Some((type_name, name)) => type_name == containing_type && name == method_name,
                None => pattern == method_name,
            }
        })
    }
}

#[cfg(test)]
#[path = "tests/settings_tests.rs"]
mod tests;
