//! Handler functions for config CLI commands.
//!
//! Implements `glnav config {path,get,set,init}` and the TOML dotted-key
//! helpers behind them.

use std::path::{Path, PathBuf};

use glnav_core::{Error, Result};

use crate::cli::ConfigAction;
use crate::config::GlnavConfig;

/// Keys whose values are never printed in full.
const SECRET_KEYS: &[&str] = &["gitlab.private_token"];

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle a config subcommand.
///
/// Receives the raw `--config` path (not a loaded config) because some
/// commands (path, init) work before a config file exists.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => cmd_config_path(config_path),
        ConfigAction::Get { key } => {
            let config = GlnavConfig::load(config_path)?;
            println!("{}", config_value(&config, &key)?);
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let path = resolve(config_path)?;
            set_in_file(&path, &key, &value)?;
            println!("Set {key} in {}", path.display());
            Ok(())
        }
        ConfigAction::Init { file, force } => {
            let path = match file {
                Some(p) => PathBuf::from(p),
                None => GlnavConfig::default_config_path()
                    .ok_or_else(|| Error::config("Could not determine config directory"))?,
            };
            init_file(&path, force)?;
            println!("Config file created at {}", path.display());
            Ok(())
        }
    }
}

// ============================================================================
// Command handlers
// ============================================================================

fn resolve(config_path: Option<&str>) -> Result<PathBuf> {
    GlnavConfig::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory for this platform"))
}

/// Show the resolved config file path.
fn cmd_config_path(config_path: Option<&str>) -> Result<()> {
    let path = resolve(config_path)?;
    println!("{}", path.display());
    if !path.exists() {
        eprintln!("(file does not exist; run `glnav config init` to create it)");
    }
    Ok(())
}

/// The value at a dotted key of the resolved configuration, ready to print.
fn config_value(config: &GlnavConfig, key: &str) -> Result<String> {
    let value = toml::Value::try_from(config).map_err(|e| Error::config(e.to_string()))?;
    let found = get_nested_value(&value, key)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))?;
    let text = format_toml_value(found);
    Ok(if SECRET_KEYS.contains(&key) {
        redact(&text)
    } else {
        text
    })
}

/// Set a dotted key in an existing config file.
///
/// The raw value is typed (bool, integer, float, string) and then checked
/// against the configuration schema; a value the schema rejects is retried
/// as a plain string, so `glnav config set gitlab.private_token 1234`
/// stores a string.
fn set_in_file(path: &Path, key: &str, raw: &str) -> Result<()> {
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `glnav config init` first.",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
    let table: toml::Table = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
    let mut doc = toml::Value::Table(table);

    set_nested_value(&mut doc, key, parse_value(raw))?;
    if doc.clone().try_into::<GlnavConfig>().is_err() {
        set_nested_value(&mut doc, key, toml::Value::String(raw.to_string()))?;
        doc.clone()
            .try_into::<GlnavConfig>()
            .map_err(|e| Error::config(format!("Invalid value for {key}: {e}")))?;
    }

    let toml_str = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    std::fs::write(path, toml_str).map_err(|e| Error::io_with_path(e, path))
}

/// Write a default configuration file.
fn init_file(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }
    let toml_str = GlnavConfig::default().to_toml_string()?;
    std::fs::write(path, toml_str).map_err(|e| Error::io_with_path(e, path))
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

/// Navigate a dotted key path in a TOML value tree.
fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (parents, last) = match key.rsplit_once('.') {
        Some((parents, last)) => (Some(parents), last),
        None => (None, key),
    };
    if last.is_empty() {
        return Err(Error::config("Empty key path"));
    }

    let mut current = root;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config("Cannot navigate into a non-table value"))?;
        current = table
            .entry(part.to_string())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }
    current
        .as_table_mut()
        .ok_or_else(|| Error::config("Cannot set key on a non-table value"))?
        .insert(last.to_string(), value);
    Ok(())
}

/// Parse a string value into a TOML value, auto-detecting the type.
///
/// Priority: bool → integer → float → string.
fn parse_value(s: &str) -> toml::Value {
    match s {
        "true" => toml::Value::Boolean(true),
        "false" => toml::Value::Boolean(false),
        _ => s
            .parse::<i64>()
            .map(toml::Value::Integer)
            .or_else(|_| s.parse::<f64>().map(toml::Value::Float))
            .unwrap_or_else(|_| toml::Value::String(s.to_string())),
    }
}

/// Format a TOML value for display on stdout.
fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(_) | toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

/// Keep at most four leading characters of a secret.
fn redact(secret: &str) -> String {
    let shown: String = secret.chars().take(4).collect();
    format!("{shown}****")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::tests::{clean_env, env_lock};

    fn written(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_cmd_config_path_explicit() {
        assert!(cmd_config_path(Some("/explicit/config.toml")).is_ok());
    }

    #[test]
    fn test_config_value_nested_key() {
        let config = GlnavConfig::default();
        assert_eq!(config_value(&config, "picker.height").unwrap(), "20%");
        assert_eq!(config_value(&config, "gitlab.timeout_secs").unwrap(), "20");
    }

    #[test]
    fn test_config_value_redacts_token() {
        let mut config = GlnavConfig::default();
        config.gitlab.private_token = Some("glpat-secret-value".into());
        assert_eq!(config_value(&config, "gitlab.private_token").unwrap(), "glpa****");
    }

    #[test]
    fn test_config_value_missing_key() {
        let err = config_value(&GlnavConfig::default(), "gitlab.url").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_get_through_loaded_file() {
        let _lock = env_lock();
        let _env = clean_env();
        let (_dir, path) = written("[gitlab]\nurl = \"https://gitlab.example.com\"\n");
        let result = handle_config_command(
            Some(path.to_str().unwrap()),
            ConfigAction::Get {
                key: "gitlab.url".into(),
            },
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_set_in_file_types_values() {
        let (_dir, path) = written(&GlnavConfig::default().to_toml_string().unwrap());
        set_in_file(&path, "gitlab.timeout_secs", "45").unwrap();
        set_in_file(&path, "picker.height", "40%").unwrap();

        let config: GlnavConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.gitlab.timeout_secs, 45);
        assert_eq!(config.picker.height, "40%");
    }

    #[test]
    fn test_set_numeric_token_stays_string() {
        let (_dir, path) = written("[gitlab]\n");
        set_in_file(&path, "gitlab.private_token", "123456").unwrap();

        let config: GlnavConfig = toml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(config.gitlab.private_token.as_deref(), Some("123456"));
    }

    #[test]
    fn test_set_rejects_invalid_value() {
        let (_dir, path) = written("[gitlab]\n");
        let err = set_in_file(&path, "gitlab.timeout_secs", "soon").unwrap_err();
        assert!(err.to_string().contains("gitlab.timeout_secs"));
    }

    #[test]
    fn test_set_missing_file() {
        let err = set_in_file(Path::new("/nonexistent/config.toml"), "gitlab.url", "x").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_init_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("glnav").join("config.toml");
        init_file(&path, false).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("[gitlab]"));
        assert!(content.contains("[picker]"));
    }

    #[test]
    fn test_init_no_overwrite_without_force() {
        let (_dir, path) = written("existing");
        let err = init_file(&path, false).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        init_file(&path, true).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("[picker]"));
    }

    #[test]
    fn test_nested_value_helpers() {
        let mut val = toml::Value::Table(toml::map::Map::new());
        set_nested_value(&mut val, "gitlab.url", toml::Value::String("u".into())).unwrap();
        assert_eq!(
            get_nested_value(&val, "gitlab.url"),
            Some(&toml::Value::String("u".into()))
        );
        assert!(get_nested_value(&val, "gitlab.nonexistent").is_none());
        assert!(set_nested_value(&mut val, "gitlab.", toml::Value::Integer(1)).is_err());
        assert!(set_nested_value(&mut val, "gitlab.url.deeper", toml::Value::Integer(1)).is_err());
    }

    #[test]
    fn test_parse_value_types() {
        assert_eq!(parse_value("true"), toml::Value::Boolean(true));
        assert_eq!(parse_value("42"), toml::Value::Integer(42));
        assert_eq!(parse_value("2.5"), toml::Value::Float(2.5));
        assert_eq!(parse_value("20%"), toml::Value::String("20%".into()));
    }

    #[test]
    fn test_redact_short_secret() {
        assert_eq!(redact("ab"), "ab****");
    }
}
