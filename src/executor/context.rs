//! Execution context shared by all pipeline stages.

use std::path::PathBuf;

use crate::core::version::DEFAULT_MIRROR;

/// Execution context shared by all pipeline stages.
#[derive(Debug, Clone)]
pub struct Context {
    /// Shared download/unpack root
    pub cache_root: PathBuf,
    /// Mirror root for release archives
    pub mirror: String,
    /// Parallel jobs for the header build
    pub nproc: usize,
    /// If true, log commands without executing them
    pub dry_run: bool,
    /// If true, print commands as they execute
    pub verbose: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            cache_root: std::env::temp_dir().join("qtsrc-prep"),
            mirror: DEFAULT_MIRROR.to_string(),
            nproc: num_cpus::get(),
            dry_run: false,
            verbose: false,
        }
    }
}

impl Context {
    /// Create a new context rooted at the given cache directory.
    ///
    /// A relative root is resolved against the current directory: tools run
    /// inside the unpacked tree and must see the same paths.
    pub fn with_cache_root(cache_root: impl Into<PathBuf>) -> Self {
        let cache_root = cache_root.into();
        Self {
            cache_root: std::path::absolute(&cache_root).unwrap_or(cache_root),
            ..Default::default()
        }
    }

    /// Set the download mirror.
    pub fn mirror(mut self, mirror: impl Into<String>) -> Self {
        self.mirror = mirror.into();
        self
    }

    /// Set the number of parallel build jobs.
    pub fn nproc(mut self, nproc: usize) -> Self {
        self.nproc = nproc.max(1);
        self
    }

    /// Set dry run mode.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set verbose mode.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_default() {
        let ctx = Context::default();
        assert_eq!(ctx.mirror, DEFAULT_MIRROR);
        assert!(ctx.nproc >= 1);
        assert!(!ctx.dry_run);
        assert!(!ctx.verbose);
    }

    #[test]
    fn test_context_builder() {
        let ctx = Context::with_cache_root("/srv/qt")
            .mirror("https://mirror.example.org/qt")
            .nproc(0)
            .dry_run(true)
            .verbose(true);

        assert_eq!(ctx.cache_root, PathBuf::from("/srv/qt"));
        assert_eq!(ctx.mirror, "https://mirror.example.org/qt");
        assert_eq!(ctx.nproc, 1);
        assert!(ctx.dry_run);
        assert!(ctx.verbose);
    }

    #[test]
    fn test_relative_cache_root_is_absolutized() {
        let ctx = Context::with_cache_root("qt-cache");
        assert!(ctx.cache_root.is_absolute());
        assert_eq!(
            ctx.cache_root,
            std::env::current_dir().unwrap().join("qt-cache")
        );
    }
}
