use crate::filter::{FieldAliases, FilterParser, Logic};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Free-form label for the loaded profile.
    pub profile_name: String,
    /// Extra field aliases, layered over the built-in table.
    pub aliases: BTreeMap<String, String>,
    /// Logic for filters that do not spell out AND or OR.
    pub default_logic: Logic,
    /// Drop the built-in alias table and use only `aliases`.
    pub replace_builtin_aliases: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            profile_name: "base".to_string(),
            aliases: BTreeMap::new(),
            default_logic: Logic::And,
            replace_builtin_aliases: false,
        }
    }
}

impl QueryConfig {
    /// The alias table described by this config
    pub fn field_aliases(&self) -> FieldAliases {
        let mut aliases = if self.replace_builtin_aliases {
            FieldAliases::empty()
        } else {
            FieldAliases::default()
        };
        aliases.extend(&self.aliases);
        aliases
    }

    pub fn parser(&self) -> FilterParser {
        FilterParser::new(self.field_aliases()).with_default_logic(self.default_logic)
    }
}

pub fn load_config(path: Option<&Path>) -> Result<QueryConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<QueryConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    let config = toml::from_str::<QueryConfig>(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })?;
    log::info!(
        "loaded config profile '{}' with {} aliases",
        config.profile_name,
        config.aliases.len()
    );
    Ok(config)
}

pub fn default_config() -> &'static QueryConfig {
    static DEFAULT_CONFIG: LazyLock<QueryConfig> = LazyLock::new(QueryConfig::default);
    &DEFAULT_CONFIG
}
