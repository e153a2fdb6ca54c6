//! # PMOPhoto Configuration Module
//!
//! This module provides configuration management for PMOPhoto, including:
//! - Loading configuration from YAML files
//! - Merging with embedded default configuration
//! - Environment variable overrides
//! - Type-safe getters and setters for configuration values
//!
//! There is no global instance: the application loads a [`Config`] once and
//! hands it (usually as an `Arc<Config>`) to the components that need it.
//!
//! ## Usage
//!
//! ```no_run
//! use pmoconfig::Config;
//!
//! let config = Config::load_config("")?;
//!
//! // Access configuration values
//! let interval = config.get_photo_interval();
//! let photos = config.get_photo_dir()?;
//!
//! // Update configuration values
//! config.set_photo_interval(std::time::Duration::from_secs(30))?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::{anyhow, Result};
use dirs::home_dir;
use parking_lot::Mutex;
use serde_yaml::{Mapping, Number, Value};
use std::{
    env,
    ffi::OsString,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{info, warn};

// Configuration par défaut intégrée
const DEFAULT_CONFIG: &str = include_str!("pmophoto.yaml");

const ENV_CONFIG_DIR: &str = "PMOPHOTO_CONFIG";
const ENV_PREFIX: &str = "PMOPHOTO_CONFIG__";
const CONFIG_DIR_NAME: &str = ".pmophoto";

// Default values for configuration
const DEFAULT_LOG_MIN_LEVEL: &str = "INFO";
const DEFAULT_LOG_ENABLE_CONSOLE: bool = true;
const DEFAULT_PHOTO_INTERVAL_SECS: u64 = 20;
const DEFAULT_FIRST_PHOTO_DELAY_SECS: u64 = 1;
const DEFAULT_PHOTO_DIR: &str = "photos";
const DEFAULT_PHOTO_EXTENSION: &str = "jpg";
const DEFAULT_RESCAN_INTERVAL_SECS: u64 = 2;

/// Macro to generate getter/setter for bool values with default
macro_rules! impl_bool_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> bool {
            match self.get_value($path) {
                Ok(Value::Bool(b)) => b,
                _ => $default,
            }
        }

        pub fn $setter(&self, value: bool) -> Result<()> {
            self.set_value($path, Value::Bool(value))
        }
    };
}

/// Macro to generate getter/setter for durations stored as whole seconds
macro_rules! impl_secs_config {
    ($getter:ident, $setter:ident, $path:expr, $default:expr) => {
        pub fn $getter(&self) -> Duration {
            Duration::from_secs(self.get_secs($path, $default))
        }

        pub fn $setter(&self, value: Duration) -> Result<()> {
            let n = Number::from(value.as_secs());
            self.set_value($path, Value::Number(n))
        }
    };
}

/// Configuration manager for PMOPhoto
///
/// This structure manages the application configuration, including:
/// - Loading configuration from YAML files
/// - Merging with default configuration
/// - Handling environment variable overrides
/// - Providing typed getters/setters for configuration values
#[derive(Debug)]
pub struct Config {
    config_dir: PathBuf,
    path: PathBuf,
    data: Mutex<Value>,
}

impl Config {
    /// Finds a config directory by trying different locations in order
    fn find_config_dir(directory: &str) -> PathBuf {
        // 1. Try provided directory
        if !directory.is_empty() {
            return PathBuf::from(directory);
        }

        // 2. Try environment variable
        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var=ENV_CONFIG_DIR, path=%env_path, "Trying to load config from env");
            return PathBuf::from(env_path);
        }

        // 3. Try current directory
        if Path::new(CONFIG_DIR_NAME).exists() {
            return PathBuf::from(CONFIG_DIR_NAME);
        }

        // 4. Try home directory
        if let Some(home) = home_dir() {
            let home_config = home.join(CONFIG_DIR_NAME);
            if home_config.exists() {
                return home_config;
            }
        }

        // Default fallback
        PathBuf::from(CONFIG_DIR_NAME)
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        // Create if doesn't exist
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        // Verify it's a directory
        if !path.is_dir() {
            return Err(anyhow!("{} is not a directory", path.display()));
        }

        // Test write permission
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        // Test read permission
        fs::read_dir(path)?;

        Ok(())
    }

    /// Determines and validates the configuration directory
    ///
    /// The directory is searched in the following order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `PMOPHOTO_CONFIG` environment variable
    /// 3. `.pmophoto` in the current directory
    /// 4. `.pmophoto` in the user's home directory
    ///
    /// The directory is created if it doesn't exist, and validated for read/write permissions.
    pub fn config_dir(directory: &str) -> Result<PathBuf> {
        let dir_path = Self::find_config_dir(directory);
        Self::validate_config_dir(&dir_path)?;
        Ok(dir_path)
    }

    /// Loads the configuration from the specified directory
    ///
    /// This method:
    /// 1. Determines the configuration directory
    /// 2. Loads the default embedded configuration
    /// 3. Merges it with the external config.yaml file if present
    /// 4. Applies environment variable overrides
    /// 5. Saves the merged configuration
    ///
    /// # Arguments
    ///
    /// * `directory` - The directory containing the config.yaml file, or empty to use defaults
    pub fn load_config(directory: &str) -> Result<Self> {
        let config_dir = Self::config_dir(directory)?;
        info!(config_dir=%config_dir.display(), "Using config directory");

        let path = config_dir.join("config.yaml");

        // Charger la configuration par défaut
        let mut config_value = lower_keys_value(serde_yaml::from_str(DEFAULT_CONFIG)?);

        // Merger avec le fichier externe s'il existe
        match fs::read(&path) {
            Ok(data) => {
                info!(config_file=%path.display(), "Loaded config file");
                let external_value = lower_keys_value(serde_yaml::from_slice(&data)?);
                merge_yaml(&mut config_value, &external_value);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(config_file=%path.display(), "Config file not found, using default embedded config");
            }
            Err(e) => {
                return Err(anyhow!("Cannot read {}: {}", path.display(), e));
            }
        }

        // Appliquer les overrides depuis les variables d'environnement
        apply_overrides(&mut config_value, env::vars_os());

        let config = Config {
            config_dir,
            path,
            data: Mutex::new(config_value),
        };

        config.save()?;
        Ok(config)
    }

    /// Directory holding config.yaml
    pub fn directory(&self) -> &Path {
        &self.config_dir
    }

    /// Saves the current configuration to the config.yaml file
    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&*self.data.lock())?;
        fs::write(&self.path, yaml)?;
        Ok(())
    }

    /// Sets a configuration value at the specified path and saves it
    ///
    /// # Arguments
    ///
    /// * `path` - Array of keys representing the path (e.g., `&["slideshow", "photo_interval_secs"]`)
    /// * `value` - The YAML value to set
    pub fn set_value(&self, path: &[&str], value: Value) -> Result<()> {
        set_value_internal(&mut self.data.lock(), path, value)?;
        self.save()
    }

    /// Gets a configuration value at the specified path
    ///
    /// Returns an error if the path doesn't exist.
    pub fn get_value(&self, path: &[&str]) -> Result<Value> {
        let data = self.data.lock();
        get_value_internal(&data, path)
    }

    fn get_secs(&self, path: &[&str], default: u64) -> u64 {
        match self.get_value(path) {
            Ok(Value::Number(n)) => match n.as_u64() {
                Some(secs) => secs,
                None => {
                    warn!(path = %path.join("."), value = %n, default, "Invalid duration, using default");
                    default
                }
            },
            Ok(Value::String(s)) => s.trim().parse::<u64>().unwrap_or_else(|_| {
                warn!(path = %path.join("."), value = %s, default, "Invalid duration, using default");
                default
            }),
            Ok(_) | Err(_) => {
                warn!(path = %path.join("."), default, "Duration not configured, using default");
                default
            }
        }
    }

    /// Résout un chemin relatif ou absolu et crée le répertoire si nécessaire
    fn resolve_and_create_dir(&self, dir_path: &str) -> Result<PathBuf> {
        let path = Path::new(dir_path);

        // Chemin relatif : le résoudre par rapport à config_dir
        let absolute_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        };

        if !absolute_path.exists() {
            fs::create_dir_all(&absolute_path)?;
            info!(directory=%absolute_path.display(), "Created managed directory");
        }

        Ok(absolute_path)
    }

    /// Récupère un répertoire géré par la configuration
    ///
    /// Le répertoire peut être absolu ou relatif au répertoire de
    /// configuration. Il est créé s'il n'existe pas ; la valeur par défaut est
    /// enregistrée si la clé est absente.
    pub fn get_managed_dir(&self, path: &[&str], default: &str) -> Result<PathBuf> {
        let dir_path = match self.get_value(path) {
            Ok(Value::String(s)) if !s.is_empty() => s,
            _ => {
                self.set_managed_dir(path, default.to_string())?;
                default.to_string()
            }
        };
        self.resolve_and_create_dir(&dir_path)
    }

    /// Définit un répertoire géré par la configuration
    pub fn set_managed_dir(&self, path: &[&str], directory: String) -> Result<()> {
        self.set_value(path, Value::String(directory))
    }

    impl_bool_config!(
        get_log_enable_console,
        set_log_enable_console,
        &["host", "logger", "enable_console"],
        DEFAULT_LOG_ENABLE_CONSOLE
    );

    /// Récupère le niveau de log minimum depuis la configuration
    pub fn get_log_min_level(&self) -> String {
        match self.get_value(&["host", "logger", "min_level"]) {
            Ok(Value::String(s)) => s,
            _ => DEFAULT_LOG_MIN_LEVEL.to_string(),
        }
    }

    /// Définit le niveau de log minimum dans la configuration
    pub fn set_log_min_level(&self, level: String) -> Result<()> {
        self.set_value(&["host", "logger", "min_level"], Value::String(level))
    }

    impl_secs_config!(
        get_photo_interval,
        set_photo_interval,
        &["slideshow", "photo_interval_secs"],
        DEFAULT_PHOTO_INTERVAL_SECS
    );

    impl_secs_config!(
        get_first_photo_delay,
        set_first_photo_delay,
        &["slideshow", "first_photo_delay_secs"],
        DEFAULT_FIRST_PHOTO_DELAY_SECS
    );

    impl_secs_config!(
        get_rescan_interval,
        set_rescan_interval,
        &["scanner", "rescan_interval_secs"],
        DEFAULT_RESCAN_INTERVAL_SECS
    );

    /// Gets the watched photo directory, creating it if needed
    ///
    /// Relative paths are resolved against the configuration directory.
    pub fn get_photo_dir(&self) -> Result<PathBuf> {
        self.get_managed_dir(&["scanner", "directory"], DEFAULT_PHOTO_DIR)
    }

    /// Sets the watched photo directory
    pub fn set_photo_dir(&self, directory: String) -> Result<()> {
        self.set_managed_dir(&["scanner", "directory"], directory)
    }

    /// Gets the accepted file extensions (lower case, without leading dot)
    ///
    /// A single string is accepted as a one-element list.
    pub fn get_photo_extensions(&self) -> Vec<String> {
        let raw: Vec<String> = match self.get_value(&["scanner", "extensions"]) {
            Ok(Value::Sequence(seq)) => seq
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            Ok(Value::String(s)) => vec![s],
            _ => Vec::new(),
        };

        let extensions: Vec<String> = raw
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        if extensions.is_empty() {
            warn!(
                default = DEFAULT_PHOTO_EXTENSION,
                "No photo extension configured, using default"
            );
            return vec![DEFAULT_PHOTO_EXTENSION.to_string()];
        }
        extensions
    }

    /// Sets the accepted file extensions
    pub fn set_photo_extensions(&self, extensions: &[&str]) -> Result<()> {
        let seq = extensions
            .iter()
            .map(|e| Value::String(e.to_string()))
            .collect();
        self.set_value(&["scanner", "extensions"], Value::Sequence(seq))
    }
}

fn set_value_internal(data: &mut Value, path: &[&str], value: Value) -> Result<()> {
    if path.is_empty() {
        *data = value;
        return Ok(());
    }
    if let Value::Mapping(map) = data {
        let key_value = Value::String(path[0].to_lowercase());
        if path.len() == 1 {
            map.insert(key_value, value);
        } else {
            let entry = map
                .entry(key_value)
                .or_insert(Value::Mapping(Mapping::new()));
            set_value_internal(entry, &path[1..], value)?;
        }
        Ok(())
    } else {
        Err(anyhow!("Current node is not a map"))
    }
}

fn get_value_internal(data: &Value, path: &[&str]) -> Result<Value> {
    let mut current = data;
    for (i, key) in path.iter().enumerate() {
        if let Value::Mapping(map) = current {
            let key = key.to_lowercase();

            if let Some(next) = map.get(&Value::String(key)) {
                current = next;
            } else {
                return Err(anyhow!("Path {} does not exist", path[..=i].join(".")));
            }
        } else {
            return Err(anyhow!("Path {} is not a Config", path[..i].join(".")));
        }
    }
    Ok(current.clone())
}

/// Applies `PMOPHOTO_CONFIG__SECTION__KEY=value` overrides
///
/// Variables whose name or value is not valid UTF-8 are skipped.
fn apply_overrides<I>(config: &mut Value, vars: I)
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    for (key, value) in vars {
        let (Ok(key), Ok(value)) = (key.into_string(), value.into_string()) else {
            continue;
        };
        if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
            let key_path = stripped.split("__").collect::<Vec<_>>();
            let yaml_value = convert_env_value(&value);
            if let Err(e) = set_value_internal(config, &key_path, yaml_value) {
                warn!(env_var = %key, error = %e, "Ignoring config override");
            }
        }
    }
}

fn convert_env_value(value: &str) -> Value {
    if let Ok(parsed) = serde_yaml::from_str::<Value>(value) {
        return parsed;
    }
    Value::String(value.to_string())
}

fn lower_keys_value(value: Value) -> Value {
    match value {
        Value::Mapping(map) => {
            let mut new_map = Mapping::new();
            for (k, v) in map {
                let new_key = match k {
                    Value::String(s) => Value::String(s.to_lowercase()),
                    other => other,
                };
                new_map.insert(new_key, lower_keys_value(v));
            }
            Value::Mapping(new_map)
        }
        Value::Sequence(seq) => Value::Sequence(seq.into_iter().map(lower_keys_value).collect()),
        _ => value,
    }
}

/// Merges external YAML configuration into default configuration
///
/// - For mappings (objects), it merges keys from external into default
/// - For scalars and sequences, external values replace default values
fn merge_yaml(default: &mut Value, external: &Value) {
    match (default, external) {
        (Value::Mapping(dmap), Value::Mapping(emap)) => {
            for (k, v) in emap {
                match dmap.get_mut(k) {
                    Some(dv) => merge_yaml(dv, v),
                    None => {
                        dmap.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        (d, e) => *d = e.clone(), // pour les scalaires ou séquences, on remplace
    }
}
