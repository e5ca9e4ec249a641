//! Run configuration
//!
//! Loaded from a TOML file or taken from the built-in platform table:
//!
//! ```toml
//! cache_dir = "/var/cache/qtsrc"
//!
//! [generator]
//! program = "qtbindgen"
//! manifest = "qt.bindings.toml"
//!
//! [[platform]]
//! os = "linux"
//! libc = "gnu"
//! arch = "x86_64"
//! version = "5.15.2"
//! triple = "x86_64-unknown-linux-gnu"
//! pointer_size = 8
//! endianness = "little"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::platform::PlatformSpec;
use super::version::DEFAULT_MIRROR;

/// Errors reading or validating a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config declares no platforms")]
    NoPlatforms,
}

/// How the binding generator is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Program name or path
    pub program: String,
    /// Manifest file passed as the first argument
    pub manifest: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            program: "qtbindgen".to_string(),
            manifest: "qt.bindings.toml".to_string(),
        }
    }
}

/// Everything a run needs besides the command line.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Shared download/unpack root
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Mirror root for release archives
    #[serde(default = "default_mirror")]
    pub mirror: String,

    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Target platforms in generation order
    #[serde(rename = "platform", default)]
    pub platforms: Vec<PlatformSpec>,
}

fn default_mirror() -> String {
    DEFAULT_MIRROR.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: None,
            mirror: default_mirror(),
            generator: GeneratorConfig::default(),
            platforms: builtin_platforms(),
        }
    }
}

impl Config {
    /// Parse configuration text. `origin` is only used in error messages.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        if config.platforms.is_empty() {
            return Err(ConfigError::NoPlatforms);
        }
        Ok(config)
    }

    /// Load a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }
}

/// Platforms generated when no configuration file is given.
pub fn builtin_platforms() -> Vec<PlatformSpec> {
    vec![
        PlatformSpec::new(
            "linux",
            "gnu",
            "x86_64",
            "5.15.2",
            "x86_64-unknown-linux-gnu",
            8,
            "little",
        ),
        PlatformSpec::new(
            "linux",
            "gnu",
            "aarch64",
            "5.15.2",
            "aarch64-unknown-linux-gnu",
            8,
            "little",
        ),
        PlatformSpec::new(
            "linux",
            "gnu",
            "x86_64",
            "5.11.3",
            "x86_64-unknown-linux-gnu",
            8,
            "little",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let text = r#"
cache_dir = "/var/cache/qtsrc"
mirror = "https://mirror.example.org/qt"

[generator]
program = "/opt/bin/gen"
manifest = "bindings.toml"

[[platform]]
os = "linux"
libc = "musl"
arch = "x86_64"
version = "5.12"
triple = "x86_64-unknown-linux-musl"
pointer_size = 8
endianness = "little"

[[platform]]
os = "linux"
libc = "gnu"
arch = "armv7"
version = "5.9.8"
triple = "armv7-unknown-linux-gnueabihf"
pointer_size = 4
endianness = "little"
"#;
        let config = Config::from_toml(text, Path::new("test.toml")).unwrap();
        assert_eq!(config.cache_dir, Some(PathBuf::from("/var/cache/qtsrc")));
        assert_eq!(config.mirror, "https://mirror.example.org/qt");
        assert_eq!(config.generator.program, "/opt/bin/gen");
        assert_eq!(config.platforms.len(), 2);
        assert_eq!(config.platforms[1].pointer_size, 4);
        assert_eq!(config.platforms[0].libc, "musl");
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let text = r#"
[[platform]]
os = "linux"
libc = "gnu"
arch = "x86_64"
version = "5.15.2"
triple = "x86_64-unknown-linux-gnu"
pointer_size = 8
endianness = "little"
"#;
        let config = Config::from_toml(text, Path::new("test.toml")).unwrap();
        assert_eq!(config.cache_dir, None);
        assert_eq!(config.mirror, DEFAULT_MIRROR);
        assert_eq!(config.generator, GeneratorConfig::default());
    }

    #[test]
    fn test_missing_field_is_parse_error() {
        let text = r#"
[[platform]]
os = "linux"
version = "5.15.2"
"#;
        let err = Config::from_toml(text, Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_empty_platform_list_rejected() {
        let err = Config::from_toml("mirror = \"x\"\n", Path::new("c.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NoPlatforms));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/nonexistent/qtprep.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_builtin_table_is_valid() {
        let config = Config::default();
        assert!(!config.platforms.is_empty());
        for spec in &config.platforms {
            assert!(crate::QtVersion::parse(&spec.version).is_ok());
        }
    }
}
