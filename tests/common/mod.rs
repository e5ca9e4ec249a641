//! Common test utilities for pipeline integration tests.

#![allow(dead_code)]

pub use qtsrc_prep::testing::{FakeRunner, write_executable};

use qtsrc_prep::{Config, PlatformSpec};

/// Linux/glibc platform record for `arch` and `version`
pub fn linux(arch: &str, version: &str) -> PlatformSpec {
    PlatformSpec::new(
        "linux",
        "gnu",
        arch,
        version,
        &format!("{}-unknown-linux-gnu", arch),
        8,
        "little",
    )
}

/// Configuration with the given platforms and default generator
pub fn config_with(platforms: Vec<PlatformSpec>) -> Config {
    Config {
        platforms,
        ..Config::default()
    }
}
