//! Qt version parsing and version-derived paths
//!
//! A [`QtVersion`] turns a dotted version string into the archive name,
//! download URL and on-disk locations used by every pipeline stage:
//!
//! ```text
//! 5.15.2 -> qt-everywhere-src-5.15.2.tar.xz
//!           https://download.qt.io/archive/qt/5.15/5.15.2/single/qt-everywhere-src-5.15.2.tar.xz
//! 5.9    -> qt-everywhere-opensource-src-5.9.0.tar.xz
//! ```
//!
//! Releases before 5.12 shipped under the `opensource-src` name.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Default mirror for Qt release archives
pub const DEFAULT_MIRROR: &str = "https://download.qt.io/archive/qt";

/// First release using the short `qt-everywhere-src-*` archive name
const SHORT_NAMING_SINCE: (u32, u32) = (5, 12);

/// Archive extension for every supported release
const ARCHIVE_EXT: &str = "tar.xz";

/// Errors produced while parsing a version string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    #[error("invalid version format '{raw}': {reason}")]
    InvalidVersionFormat { raw: String, reason: String },
}

/// A parsed Qt release version.
///
/// Identity is the raw string: `"5.15"` and `"5.15.0"` are different
/// descriptors even though they resolve to the same paths.
#[derive(Debug, Clone)]
pub struct QtVersion {
    raw: String,
    major: u32,
    minor: u32,
    patch: u32,
}

impl QtVersion {
    /// Parse a version with one to three numeric components.
    pub fn parse(raw: &str) -> Result<Self, VersionError> {
        let invalid = |reason: &str| VersionError::InvalidVersionFormat {
            raw: raw.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty version"));
        }

        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.len() > 3 {
            return Err(invalid("expected at most three components"));
        }

        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
                return Err(invalid(&format!("component '{}' is not numeric", part)));
            }
            *slot = part
                .parse()
                .map_err(|_| invalid(&format!("component '{}' is out of range", part)))?;
        }

        Ok(Self {
            raw: trimmed.to_string(),
            major: numbers[0],
            minor: numbers[1],
            patch: numbers[2],
        })
    }

    /// The version string as declared
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn major(&self) -> u32 {
        self.major
    }

    pub fn minor(&self) -> u32 {
        self.minor
    }

    pub fn patch(&self) -> u32 {
        self.patch
    }

    /// `major.minor`
    pub fn short(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }

    /// `major.minor.patch`, padded with zeros
    pub fn full(&self) -> String {
        format!("{}.{}.{}", self.major, self.minor, self.patch)
    }

    /// Whether this release uses the `qt-everywhere-src-*` naming
    pub fn uses_short_naming(&self) -> bool {
        (self.major, self.minor) >= SHORT_NAMING_SINCE
    }

    /// Directory name of the unpacked source tree
    pub fn source_stem(&self) -> String {
        if self.uses_short_naming() {
            format!("qt-everywhere-src-{}", self.full())
        } else {
            format!("qt-everywhere-opensource-src-{}", self.full())
        }
    }

    /// File name of the release archive
    pub fn archive_name(&self) -> String {
        format!("{}.{}", self.source_stem(), ARCHIVE_EXT)
    }

    /// Download URL below the given mirror root
    pub fn download_url(&self, mirror: &str) -> String {
        format!(
            "{}/{}/{}/single/{}",
            mirror.trim_end_matches('/'),
            self.short(),
            self.full(),
            self.archive_name()
        )
    }

    /// Local path of the downloaded archive
    pub fn archive_path(&self, cache_root: &Path) -> PathBuf {
        cache_root.join(self.archive_name())
    }

    /// Local path of the unpacked source tree
    pub fn unpack_path(&self, cache_root: &Path) -> PathBuf {
        cache_root.join(self.source_stem())
    }

    /// Install prefix passed to `configure`
    pub fn install_prefix(&self, cache_root: &Path) -> PathBuf {
        self.unpack_path(cache_root).join("qtbase")
    }

    /// Location of `qmake` once the tree is configured
    pub fn qmake_path(&self, cache_root: &Path) -> PathBuf {
        self.install_prefix(cache_root).join("bin").join("qmake")
    }

    /// Library directory of the configured tree
    pub fn lib_dir(&self, cache_root: &Path) -> PathBuf {
        self.install_prefix(cache_root).join("lib")
    }
}

impl PartialEq for QtVersion {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for QtVersion {}

impl Hash for QtVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for QtVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl std::str::FromStr for QtVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
