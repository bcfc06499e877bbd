use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::annotate::DEFAULT_EXCLUDED_SPECIES;
use crate::error::AnnotateError;
use crate::store::{StoreLayout, StoreNames};

pub const DEFAULT_CONFIG_FILE: &str = "seqtax-annotate.json";
pub const STORE_DIR_ENV: &str = "SQLITEDB";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub db_dir: Option<String>,
    pub species_map: String,
    pub output_suffix: String,
    pub failure_path: String,
    pub excluded_species: Vec<String>,
    pub stores: StoreNames,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_dir: None,
            species_map: "data/jgi_species_map.csv".to_string(),
            output_suffix: ".an".to_string(),
            failure_path: "failure.fasta".to_string(),
            excluded_species: DEFAULT_EXCLUDED_SPECIES
                .iter()
                .map(|code| code.to_string())
                .collect(),
            stores: StoreNames::default(),
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub db_dir: Option<String>,
    pub species_map: Option<String>,
    pub failure_path: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub layout: StoreLayout,
    pub species_map: PathBuf,
    pub output_suffix: String,
    pub failure_path: PathBuf,
    pub excluded_species: Vec<String>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Reads `path`, or the default config file when it exists, or falls back
    /// to built-in defaults.
    pub fn load(path: Option<&str>) -> Result<Config, AnnotateError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| AnnotateError::ConfigRead(config_path.clone()))?;
        serde_json::from_str(&content).map_err(|err| AnnotateError::ConfigParse(err.to_string()))
    }

    pub fn resolve(
        path: Option<&str>,
        overrides: ConfigOverrides,
    ) -> Result<ResolvedConfig, AnnotateError> {
        let config = Self::load(path)?;
        Self::resolve_config(config, overrides, std::env::var(STORE_DIR_ENV).ok())
    }

    /// Store directory precedence: flag, config file, then the environment.
    pub fn resolve_config(
        config: Config,
        overrides: ConfigOverrides,
        env_db_dir: Option<String>,
    ) -> Result<ResolvedConfig, AnnotateError> {
        let db_dir = overrides
            .db_dir
            .or(config.db_dir)
            .or(env_db_dir)
            .filter(|dir| !dir.trim().is_empty())
            .ok_or(AnnotateError::MissingStoreDir)?;

        Ok(ResolvedConfig {
            layout: StoreLayout::with_names(Utf8PathBuf::from(db_dir), config.stores),
            species_map: PathBuf::from(overrides.species_map.unwrap_or(config.species_map)),
            output_suffix: config.output_suffix,
            failure_path: PathBuf::from(overrides.failure_path.unwrap_or(config.failure_path)),
            excluded_species: config.excluded_species,
        })
    }
}
