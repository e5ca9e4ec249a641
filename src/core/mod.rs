//! Core value types and infrastructure
//!
//! Version and platform descriptors, configuration, console output and the
//! cache lock.

pub mod config;
pub mod lock;
pub mod output;
pub mod platform;
pub mod version;
