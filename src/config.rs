use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub todo_file: Option<PathBuf>,
    pub log_path: Option<PathBuf>,
}

impl Config {
    /// Resolves a leading `~` in configured paths against `home`. Paths are
    /// left as written when no home directory is known.
    pub fn expand_home(self, home: Option<&Path>) -> Self {
        Self {
            todo_file: self.todo_file.map(|path| expand_tilde(path, home)),
            log_path: self.log_path.map(|path| expand_tilde(path, home)),
        }
    }
}

fn expand_tilde(path: PathBuf, home: Option<&Path>) -> PathBuf {
    let Some(home) = home else {
        return path;
    };
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path,
    }
}

#[derive(Debug)]
pub struct LoadedConfig {
    pub config: Config,
    pub warnings: Vec<String>,
}

pub fn load_config(path: &Path) -> Result<LoadedConfig, String> {
    let content = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read config {}: {}", path.display(), err))?;
    load_config_from_str(&path.display().to_string(), &content)
}

pub fn load_config_from_str(label: &str, content: &str) -> Result<LoadedConfig, String> {
    let value: Value = serde_yaml::from_str(content)
        .map_err(|err| format!("Failed to parse config {}: {}", label, err))?;
    let mapping = match value {
        // An empty document is an empty config.
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        _ => return Err(format!("Config {} must be a YAML mapping", label)),
    };

    let warnings = unknown_top_level_keys(&mapping);
    emit_unknown_key_warnings(&warnings);
    validate_optional_fields(&mapping)?;

    let config: Config = serde_yaml::from_value(Value::Mapping(mapping))
        .map_err(|err| format!("Failed to parse config {}: {}", label, err))?;

    Ok(LoadedConfig { config, warnings })
}

fn emit_unknown_key_warnings(keys: &[String]) {
    for key in keys {
        eprintln!("Warning: unknown config key: {}", key);
    }
}

fn unknown_top_level_keys(mapping: &Mapping) -> Vec<String> {
    let allowed = ["todo_file", "log_path"];

    mapping
        .keys()
        .filter_map(|key| key.as_str().map(|value| value.to_string()))
        .filter(|key| !allowed.contains(&key.as_str()))
        .collect()
}

fn validate_optional_fields(mapping: &Mapping) -> Result<(), String> {
    optional_non_empty_string(mapping, "todo_file")?;
    optional_non_empty_string(mapping, "log_path")?;
    Ok(())
}

fn optional_non_empty_string(mapping: &Mapping, key_name: &str) -> Result<(), String> {
    let key = Value::String(key_name.to_string());
    match mapping.get(&key) {
        None | Some(Value::Null) => Ok(()),
        Some(Value::String(value)) => {
            if value.trim().is_empty() {
                Err(format!("{} must not be empty", key_name))
            } else {
                Ok(())
            }
        }
        Some(_) => Err(format!("{} must be a string", key_name)),
    }
}
