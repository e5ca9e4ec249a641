//! Target platforms
//!
//! A [`Platform`] is one (os, libc, arch, Qt version) combination the binding
//! generator runs for. It owns the resolved Qt locations the generator needs;
//! these default to the paths of a tree configured in the cache root and are
//! replaced when targeting an already-installed Qt (see [`crate::probe`]).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::version::{QtVersion, VersionError};

/// Environment variable names handed to the binding generator
pub mod env_keys {
    pub const QTDIR: &str = "QTDIR";
    pub const QMAKE: &str = "QMAKE";
    pub const QT_LIBS_DIR: &str = "QT_LIBS_DIR";
    pub const QT_INCLUDE_DIR: &str = "QT_INCLUDE_DIR";
    pub const TARGET_TRIPLE: &str = "TARGET_TRIPLE";
    pub const BINDING_PLATFORM: &str = "BINDING_PLATFORM";
}

/// One platform record as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlatformSpec {
    pub os: String,
    pub libc: String,
    pub arch: String,
    pub version: String,
    pub triple: String,
    pub pointer_size: u32,
    pub endianness: String,
}

impl PlatformSpec {
    pub fn new(
        os: &str,
        libc: &str,
        arch: &str,
        version: &str,
        triple: &str,
        pointer_size: u32,
        endianness: &str,
    ) -> Self {
        Self {
            os: os.to_string(),
            libc: libc.to_string(),
            arch: arch.to_string(),
            version: version.to_string(),
            triple: triple.to_string(),
            pointer_size,
            endianness: endianness.to_string(),
        }
    }
}

/// A platform with its Qt version and resolved install locations.
#[derive(Debug, Clone)]
pub struct Platform {
    pub os: String,
    pub libc: String,
    pub arch: String,
    pub triple: String,
    pub pointer_size: u32,
    pub endianness: String,
    version: QtVersion,
    install_root: PathBuf,
    qmake: PathBuf,
    lib_dir: PathBuf,
    include_dir: Option<PathBuf>,
}

impl Platform {
    /// Build a platform whose Qt lives in `cache_root`.
    pub fn from_spec(spec: &PlatformSpec, cache_root: &Path) -> Result<Self, VersionError> {
        let version = QtVersion::parse(&spec.version)?;
        Ok(Self {
            os: spec.os.clone(),
            libc: spec.libc.clone(),
            arch: spec.arch.clone(),
            triple: spec.triple.clone(),
            pointer_size: spec.pointer_size,
            endianness: spec.endianness.clone(),
            install_root: version.install_prefix(cache_root),
            qmake: version.qmake_path(cache_root),
            lib_dir: version.lib_dir(cache_root),
            include_dir: None,
            version,
        })
    }

    /// Point the platform at an installed Qt instead of the cache root.
    pub fn with_install_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.install_root = dir.into();
        self
    }

    pub fn with_qmake(mut self, path: impl Into<PathBuf>) -> Self {
        self.qmake = path.into();
        self
    }

    pub fn with_lib_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.lib_dir = dir.into();
        self
    }

    /// Without an include directory the generator detects headers itself.
    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dir = Some(dir.into());
        self
    }

    pub fn version(&self) -> &QtVersion {
        &self.version
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    pub fn qmake(&self) -> &Path {
        &self.qmake
    }

    pub fn lib_dir(&self) -> &Path {
        &self.lib_dir
    }

    pub fn include_dir(&self) -> Option<&Path> {
        self.include_dir.as_deref()
    }

    /// Stable identifier, e.g. `linux-gnu-x86_64-qt5.15.2`
    pub fn target_id(&self) -> String {
        format!(
            "{}-{}-{}-qt{}",
            self.os, self.libc, self.arch, self.version
        )
    }

    /// Environment for the binding generator.
    pub fn environment(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert(
            env_keys::QTDIR.to_string(),
            self.install_root.display().to_string(),
        );
        env.insert(env_keys::QMAKE.to_string(), self.qmake.display().to_string());
        env.insert(
            env_keys::QT_LIBS_DIR.to_string(),
            self.lib_dir.display().to_string(),
        );
        env.insert(env_keys::TARGET_TRIPLE.to_string(), self.triple.clone());
        env.insert(env_keys::BINDING_PLATFORM.to_string(), self.target_id());
        if let Some(ref include) = self.include_dir {
            env.insert(
                env_keys::QT_INCLUDE_DIR.to_string(),
                include.display().to_string(),
            );
        }
        env
    }

    /// `--var` pairs for the binding generator, in invocation order.
    pub fn generator_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            ("arch", self.arch.clone()),
            ("libc", self.libc.clone()),
            ("os", self.os.clone()),
            ("pointer_size", self.pointer_size.to_string()),
            ("endianness", self.endianness.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux_spec(version: &str) -> PlatformSpec {
        PlatformSpec::new(
            "linux",
            "gnu",
            "x86_64",
            version,
            "x86_64-unknown-linux-gnu",
            8,
            "little",
        )
    }

    #[test]
    fn test_target_id() {
        let p = Platform::from_spec(&linux_spec("5.15.2"), Path::new("/cache")).unwrap();
        assert_eq!(p.target_id(), "linux-gnu-x86_64-qt5.15.2");
    }

    #[test]
    fn test_invalid_version_rejected() {
        let err = Platform::from_spec(&linux_spec("5.x"), Path::new("/cache")).unwrap_err();
        assert!(matches!(err, VersionError::InvalidVersionFormat { .. }));
    }

    #[test]
    fn test_environment_defaults_to_cache_tree() {
        let p = Platform::from_spec(&linux_spec("5.15.2"), Path::new("/cache")).unwrap();
        let env = p.environment();

        assert_eq!(env["QTDIR"], "/cache/qt-everywhere-src-5.15.2/qtbase");
        assert_eq!(env["QMAKE"], "/cache/qt-everywhere-src-5.15.2/qtbase/bin/qmake");
        assert_eq!(env["QT_LIBS_DIR"], "/cache/qt-everywhere-src-5.15.2/qtbase/lib");
        assert_eq!(env["TARGET_TRIPLE"], "x86_64-unknown-linux-gnu");
        assert_eq!(env["BINDING_PLATFORM"], "linux-gnu-x86_64-qt5.15.2");
        assert!(!env.contains_key("QT_INCLUDE_DIR"));
        assert_eq!(env.len(), 5);
    }

    #[test]
    fn test_environment_with_overrides() {
        let p = Platform::from_spec(&linux_spec("5.15"), Path::new("/cache"))
            .unwrap()
            .with_install_root("/usr/lib/qt5")
            .with_qmake("/usr/bin/qmake-qt5")
            .with_lib_dir("/usr/lib64")
            .with_include_dir("/usr/include/qt5");
        let env = p.environment();

        assert_eq!(env["QTDIR"], "/usr/lib/qt5");
        assert_eq!(env["QMAKE"], "/usr/bin/qmake-qt5");
        assert_eq!(env["QT_LIBS_DIR"], "/usr/lib64");
        assert_eq!(env["QT_INCLUDE_DIR"], "/usr/include/qt5");
        assert_eq!(env.len(), 6);
    }

    #[test]
    fn test_generator_vars_order() {
        let p = Platform::from_spec(&linux_spec("5.15.2"), Path::new("/cache")).unwrap();
        let names: Vec<_> = p.generator_vars().into_iter().map(|(k, _)| k).collect();
        assert_eq!(names, ["arch", "libc", "os", "pointer_size", "endianness"]);
        assert!(p.generator_vars().contains(&("pointer_size", "8".to_string())));
    }
}
