use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::error::ConfigError;

/// Load a YAML file and merge its `section` mapping into `out`.
///
/// A missing file is not an error.
pub(crate) fn load_yaml_file(path: &Path, section: &str, out: &mut Mapping) -> Result<(), ConfigError> {
    if path.exists() {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Load(e.to_string()))?;
        load_yaml_str(&content, section, out)?;
    }
    Ok(())
}

/// Parse a YAML document and merge its `section` mapping into `out`.
pub(crate) fn load_yaml_str(content: &str, section: &str, out: &mut Mapping) -> Result<(), ConfigError> {
    let yaml: Value =
        serde_yaml::from_str(content).map_err(|e| ConfigError::Load(e.to_string()))?;
    match yaml.get(section) {
        Some(Value::Mapping(map)) => {
            for (k, v) in map {
                out.insert(k.clone(), v.clone());
            }
            Ok(())
        }
        Some(Value::Null) | None => Ok(()),
        Some(_) => Err(ConfigError::Load(format!(
            "'{section}' must be a mapping"
        ))),
    }
}

/// Overlay environment variables starting with `prefix`.
///
/// Convention: `OBJPERM_LOG_VERBOSITY=2` <-> `objperm.log_verbosity: 2`.
/// Values are parsed as YAML scalars so booleans and numbers keep their type.
pub(crate) fn overlay_env(prefix: &str, out: &mut Mapping) {
    for (env_key, env_val) in std::env::vars() {
        let Some(rest) = env_key.strip_prefix(prefix) else {
            continue;
        };
        if rest.is_empty() {
            continue;
        }
        let value = match serde_yaml::from_str::<Value>(&env_val) {
            Ok(v @ (Value::Bool(_) | Value::Number(_) | Value::String(_))) => v,
            _ => Value::String(env_val),
        };
        out.insert(Value::String(rest.to_lowercase()), value);
    }
}
