//! Property source and its loader.

use crate::error::{PropertyError, Result};
use crate::parser;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Prefix shared by every key the monitoring core reserves for itself.
pub const PREFIX: &str = "monitoring.";

/// Key naming the configuration file to load.
pub const CONFIGURATION_KEY: &str = "monitoring.configuration";

/// Environment variable alias of [`CONFIGURATION_KEY`].
pub const CONFIGURATION_ENV: &str = "MONITORING_CONFIGURATION";

/// File loaded when no configuration key is set.
pub const DEFAULT_CONFIGURATION_FILE: &str = "monitoring.properties";

/// Read-only string properties.
///
/// Lookups consult the loaded file first and fall back to the environment
/// snapshot captured at load time.
#[derive(Debug, Clone, Default)]
pub struct PropertySource {
    loaded: HashMap<String, String>,
    environment: HashMap<String, String>,
}

impl PropertySource {
    /// Load properties from the process environment and the default
    /// configuration file. Never fails; load problems are logged.
    pub fn load() -> Self {
        Self::builder().environment(std::env::vars()).build()
    }

    /// Start building a property source from explicit inputs.
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Create a property source holding exactly the given pairs, without an
    /// environment snapshot.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            loaded: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            environment: HashMap::new(),
        }
    }

    /// Get a value if configured.
    pub fn get_opt(&self, key: &str) -> Option<&str> {
        self.loaded
            .get(key)
            .or_else(|| self.environment.get(key))
            .map(String::as_str)
    }

    /// Get a value, or `default` when the key is absent.
    pub fn get<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_opt(key).unwrap_or(default)
    }

    /// Check whether a key is configured.
    pub fn contains(&self, key: &str) -> bool {
        self.get_opt(key).is_some()
    }

    /// Get a boolean value.
    ///
    /// Accepts `true`/`false` in any case. A configured value that is
    /// neither is an error rather than a silent fallback to `default`.
    pub fn get_bool(&self, key: &str, default: bool) -> Result<bool> {
        let Some(value) = self.get_opt(key) else {
            return Ok(default);
        };
        match value.trim() {
            v if v.eq_ignore_ascii_case("true") => Ok(true),
            v if v.eq_ignore_ascii_case("false") => Ok(false),
            _ => Err(PropertyError::InvalidBoolean {
                key: key.to_string(),
                value: value.to_string(),
            }),
        }
    }

    /// Get a 32-bit integer value.
    pub fn get_int(&self, key: &str, default: i32) -> Result<i32> {
        self.parse_int(key, default)
    }

    /// Get a 64-bit integer value.
    pub fn get_long(&self, key: &str, default: i64) -> Result<i64> {
        self.parse_int(key, default)
    }

    fn parse_int<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        match self.get_opt(key) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse()
                .map_err(|source| PropertyError::InvalidInteger {
                    key: key.to_string(),
                    value: value.to_string(),
                    source,
                }),
        }
    }

    /// Keys of the loaded file, excluding the environment snapshot.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.loaded.keys().map(String::as_str)
    }

    /// Number of keys loaded from the file.
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    /// Returns `true` if nothing was loaded from a file.
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

/// Builder for [`PropertySource`].
#[derive(Debug, Default)]
pub struct Builder {
    environment: HashMap<String, String>,
    path: Option<PathBuf>,
    bundled: Option<String>,
    overrides: Vec<(String, String)>,
}

impl Builder {
    /// Use the given pairs as the environment snapshot.
    pub fn environment<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Load this file instead of the one named by the environment.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Property text used when no file is found on the filesystem.
    pub fn bundled(mut self, text: impl Into<String>) -> Self {
        self.bundled = Some(text.into());
        self
    }

    /// Set a value that takes precedence over the file.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.overrides.push((key.into(), value.into()));
        self
    }

    /// Resolve the configuration file and build the source.
    ///
    /// A missing or unreadable file leaves only the environment snapshot.
    pub fn build(self) -> PropertySource {
        let path = self.path.clone().unwrap_or_else(|| {
            self.environment
                .get(CONFIGURATION_KEY)
                .or_else(|| self.environment.get(CONFIGURATION_ENV))
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIGURATION_FILE))
        });

        let bundled = self.bundled.as_deref();
        let mut loaded: HashMap<String, String> = match read_configuration(&path, bundled) {
            Ok(Some(entries)) => entries.into_iter().collect(),
            Ok(None) => {
                tracing::debug!(path = %path.display(), "No monitoring configuration found");
                HashMap::new()
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load monitoring configuration"
                );
                HashMap::new()
            }
        };
        loaded.extend(self.overrides);
        tracing::debug!(keys = loaded.len(), "Loaded monitoring properties");

        PropertySource {
            loaded,
            environment: self.environment,
        }
    }
}

fn read_configuration(path: &Path, bundled: Option<&str>) -> Result<Option<Vec<(String, String)>>> {
    if path.exists() {
        let text = std::fs::read_to_string(path).map_err(|source| PropertyError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        return parser::parse(&text).map(Some);
    }

    match bundled {
        Some(text) => parser::parse(text).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(text: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_get_with_default() {
        let props = PropertySource::from_pairs([("a", "1")]);
        assert_eq!(props.get("a", "x"), "1");
        assert_eq!(props.get("missing", "x"), "x");
    }

    #[test]
    fn test_file_takes_precedence_over_environment() {
        let file = write_config("shared=file\nonly.file=yes\n");
        let props = PropertySource::builder()
            .environment([("shared", "env"), ("only.env", "yes")])
            .path(file.path())
            .build();

        assert_eq!(props.get_opt("shared"), Some("file"));
        assert_eq!(props.get_opt("only.file"), Some("yes"));
        assert_eq!(props.get_opt("only.env"), Some("yes"));
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_configuration_key_in_environment() {
        let file = write_config("from.key=1\n");
        let path = file.path().to_string_lossy().to_string();
        let props = PropertySource::builder()
            .environment([(CONFIGURATION_KEY, path.as_str())])
            .build();
        assert_eq!(props.get_opt("from.key"), Some("1"));
    }

    #[test]
    fn test_configuration_env_alias() {
        let file = write_config("from.env=1\n");
        let path = file.path().to_string_lossy().to_string();
        let props = PropertySource::builder()
            .environment([(CONFIGURATION_ENV, path.as_str())])
            .build();
        assert_eq!(props.get_opt("from.env"), Some("1"));
    }

    #[test]
    fn test_missing_file_falls_back_to_environment() {
        let props = PropertySource::builder()
            .environment([("only.env", "yes")])
            .path("/nonexistent/monitoring.properties")
            .build();
        assert!(props.is_empty());
        assert_eq!(props.get_opt("only.env"), Some("yes"));
    }

    #[test]
    fn test_bundled_used_when_file_missing() {
        let props = PropertySource::builder()
            .path("/nonexistent/monitoring.properties")
            .bundled("bundled=1\n")
            .build();
        assert_eq!(props.get_opt("bundled"), Some("1"));
    }

    #[test]
    fn test_malformed_file_is_not_fatal() {
        let file = write_config("bad=\\uZZZZ\n");
        let props = PropertySource::builder()
            .environment([("only.env", "yes")])
            .path(file.path())
            .build();
        assert!(props.is_empty());
        assert_eq!(props.get_opt("only.env"), Some("yes"));
    }

    #[test]
    fn test_overrides_win() {
        let props = PropertySource::builder()
            .bundled("a=1\n")
            .path("/nonexistent")
            .set("a", "2")
            .build();
        assert_eq!(props.get_opt("a"), Some("2"));
    }

    #[test]
    fn test_get_bool() {
        let props = PropertySource::from_pairs([("yes", "TRUE"), ("no", "false"), ("bad", "1")]);
        assert!(props.get_bool("yes", false).unwrap());
        assert!(!props.get_bool("no", true).unwrap());
        assert!(props.get_bool("missing", true).unwrap());
        assert!(matches!(
            props.get_bool("bad", true),
            Err(PropertyError::InvalidBoolean { .. })
        ));
    }

    #[test]
    fn test_get_int_and_long() {
        let props = PropertySource::from_pairs([
            ("small", "42"),
            ("big", "9000000000"),
            ("bad", "forty"),
        ]);
        assert_eq!(props.get_int("small", 0).unwrap(), 42);
        assert_eq!(props.get_int("missing", 7).unwrap(), 7);
        assert_eq!(props.get_long("big", 0).unwrap(), 9_000_000_000);
        assert!(props.get_int("big", 0).is_err());
        assert!(matches!(
            props.get_int("bad", 0),
            Err(PropertyError::InvalidInteger { .. })
        ));
    }
}
