//! Settings file loading and root folder resolution
//!
//! Settings files are flat `key=value` lists. Blank lines, `#`/`;` comments
//! and `[section]` headers are skipped; matching quotes around a value are
//! stripped. Files ending in `.toml` are parsed as TOML and flattened by bare
//! key, so section names are ignored the same way. The one exception is a
//! `naming_convention` table, whose entries keep the `naming_convention.`
//! prefix so per-series conventions can be written as dotted keys.

use crate::{Code, Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable consulted during root folder resolution
pub const ROOT_ENV_VAR: &str = "SETMAN_ROOT";

/// Default settings file name
pub const DEFAULT_CONFIG_FILE: &str = "setman.conf";

/// Flat key/value settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    values: BTreeMap<String, String>,
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a settings file from disk
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::with_message(
                Code::FileDoesntExist,
                format!("{} does not exist.", path.display()),
            ));
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::with_message(
                Code::FileOpenFailed,
                format!("Failed to open {}: {}", path.display(), e),
            )
        })?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let settings = if is_toml {
            Self::parse_toml(&content)?
        } else {
            Self::parse(&content)
        };

        tracing::debug!(
            path = %path.display(),
            keys = settings.values.len(),
            "Loaded settings file"
        );

        Ok(settings)
    }

    /// Parse `key=value` text. Malformed lines are skipped, never fatal.
    pub fn parse(content: &str) -> Self {
        let mut settings = Self::new();

        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if line.starts_with('[') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };

            settings.set(key.trim(), unquote(value.trim()));
        }

        settings
    }

    /// Parse TOML text, flattening tables into bare keys
    pub fn parse_toml(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)
            .map_err(|e| Error::with_message(Code::ConfigError, format!("Invalid TOML: {}", e)))?;

        let mut settings = Self::new();
        flatten_into(&mut settings, &table);
        Ok(settings)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn find(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn find_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.find(key).unwrap_or(default)
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    /// Naming convention for a series: `naming_convention.<code>` then `naming_convention`
    pub fn naming_convention(&self, series_code: &str) -> Option<&str> {
        self.find(&format!("naming_convention.{}", series_code))
            .or_else(|| self.find("naming_convention"))
    }

    /// API key for an AI collaborator, stored as `<service>_api_key`
    pub fn api_key(&self, service: &str) -> Option<&str> {
        self.find(&format!("{}_api_key", service))
    }
}

fn unquote(value: &str) -> &str {
    let bytes = value.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Tables whose keys are looked up with the table name as a prefix
const PREFIXED_TABLES: [&str; 1] = ["naming_convention"];

fn flatten_into(settings: &mut Settings, table: &toml::Table) {
    flatten_with_prefix(settings, table, None);
}

fn flatten_with_prefix(settings: &mut Settings, table: &toml::Table, prefix: Option<&str>) {
    for (key, value) in table {
        let full_key = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.clone(),
        };
        match value {
            toml::Value::Table(inner) if PREFIXED_TABLES.contains(&key.as_str()) => {
                flatten_with_prefix(settings, inner, Some(key))
            }
            toml::Value::Table(inner) => flatten_with_prefix(settings, inner, prefix),
            toml::Value::String(s) => settings.set(full_key, s.clone()),
            toml::Value::Array(_) => {
                tracing::debug!(key = %full_key, "Skipping array value in settings file");
            }
            other => settings.set(full_key, other.to_string()),
        }
    }
}

/// Find a settings file: `./<filename>`, then `$HOME/.setman_<filename>`
pub fn find_config(filename: &str) -> Option<PathBuf> {
    let local = std::env::current_dir().ok().map(|d| d.join(filename));
    if let Some(path) = local {
        if path.exists() {
            return Some(path);
        }
    }

    let home = dirs::home_dir().map(|d| d.join(format!(".setman_{}", filename)));
    home.filter(|path| path.exists())
}

/// Root folder resolution, highest priority first:
/// 1. Command-line argument
/// 2. `SETMAN_ROOT` environment variable
/// 3. `root_folder` key of the settings file
/// 4. OS-dependent default
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    settings: Option<Settings>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, settings: Option<Settings>) -> Self {
        Self { cli_arg, settings }
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(root) = self.settings.as_ref().and_then(|s| s.find("root_folder")) {
            return PathBuf::from(root);
        }

        default_root_folder()
    }
}

/// OS-dependent default root folder
pub fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("setman"))
        .unwrap_or_else(|| PathBuf::from("./setman_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_comments_and_headers() {
        let settings = Settings::parse(
            "# comment\n; other comment\n[general]\n\nkey = value\nnoequals\n",
        );
        assert_eq!(settings.keys(), vec!["key"]);
        assert_eq!(settings.find("key"), Some("value"));
    }

    #[test]
    fn test_parse_strips_matching_quotes_only() {
        let settings = Settings::parse("a=\"quoted\"\nb='single'\nc=\"mismatched'\n");
        assert_eq!(settings.find("a"), Some("quoted"));
        assert_eq!(settings.find("b"), Some("single"));
        assert_eq!(settings.find("c"), Some("\"mismatched'"));
    }

    #[test]
    fn test_value_may_contain_equals() {
        let settings = Settings::parse("token=abc=def\n");
        assert_eq!(settings.find("token"), Some("abc=def"));
    }

    #[test]
    fn test_later_keys_overwrite() {
        let settings = Settings::parse("k=1\nk=2\n");
        assert_eq!(settings.find("k"), Some("2"));
    }

    #[test]
    fn test_find_or_and_has() {
        let settings = Settings::parse("present=yes\n");
        assert!(settings.has("present"));
        assert!(!settings.has("absent"));
        assert_eq!(settings.find_or("absent", "fallback"), "fallback");
    }

    #[test]
    fn test_naming_convention_lookup_order() {
        let settings = Settings::parse(
            "naming_convention={series}_{cut}\nnaming_convention.ABC={series}_{episode}_{cut}{stage}\n",
        );
        assert_eq!(
            settings.naming_convention("ABC"),
            Some("{series}_{episode}_{cut}{stage}")
        );
        assert_eq!(settings.naming_convention("XYZ"), Some("{series}_{cut}"));
    }

    #[test]
    fn test_api_key_lookup() {
        let settings = Settings::parse("deepl_api_key = secret\n");
        assert_eq!(settings.api_key("deepl"), Some("secret"));
        assert_eq!(settings.api_key("openrouter"), None);
    }

    #[test]
    fn test_parse_toml_flattens_sections() {
        let settings = Settings::parse_toml(
            "root_folder = \"/data\"\n[ai]\ndeepl_api_key = \"k\"\nretries = 3\n",
        )
        .unwrap();
        assert_eq!(settings.find("root_folder"), Some("/data"));
        assert_eq!(settings.find("deepl_api_key"), Some("k"));
        assert_eq!(settings.find("retries"), Some("3"));
    }

    #[test]
    fn test_parse_toml_dotted_naming_conventions() {
        let settings = Settings::parse_toml("naming_convention.ABC = \"{series}_{cut}\"\n").unwrap();
        assert_eq!(settings.naming_convention("ABC"), Some("{series}_{cut}"));
        assert_eq!(settings.naming_convention("XYZ"), None);

        let settings = Settings::parse_toml(
            "[naming_convention]\nABC = \"{series}_{cut}\"\n\
             [ai]\ndeepl_api_key = \"k\"\n",
        )
        .unwrap();
        assert_eq!(settings.naming_convention("ABC"), Some("{series}_{cut}"));
        assert_eq!(settings.find("ABC"), None);
        assert_eq!(settings.find("deepl_api_key"), Some("k"));
    }

    #[test]
    fn test_parse_toml_rejects_invalid() {
        let err = Settings::parse_toml("not = [valid").unwrap_err();
        assert_eq!(err.code(), Code::ConfigError);
    }
}
