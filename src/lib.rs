//! Qt source preparation for binding generation
//!
//! Prepares Qt source trees for a binding generator across a list of target
//! platforms. Each distinct Qt version goes through three idempotent stages
//! in a shared cache directory:
//!
//! 1. **download** - `curl` the release archive (transient failures retried)
//! 2. **unpack** - `tar` it into the cache
//! 3. **configure** - `./configure` with every optional module skipped,
//!    then `make qmake_all` to generate headers
//!
//! The binding generator then runs once per platform with `--var` arguments
//! and an environment describing where Qt lives (`QTDIR`, `QMAKE`,
//! `QT_LIBS_DIR`, `TARGET_TRIPLE`, `BINDING_PLATFORM`, optionally
//! `QT_INCLUDE_DIR`).
//!
//! # Example
//!
//! ```no_run
//! use qtsrc_prep::{Config, Context, RunOptions, SystemRunner, orchestrator};
//!
//! let config = Config::default();
//! let ctx = Context::with_cache_root("/var/cache/qtsrc");
//! let report = orchestrator::run(&config, ctx, &SystemRunner, RunOptions::default())?;
//! println!("generated bindings for {} platform(s)", report.generated);
//! # Ok::<(), qtsrc_prep::PipelineError>(())
//! ```
//!
//! # System mode
//!
//! With [`Mode::System`] nothing is downloaded: `qmake -query` of the Qt on
//! `PATH` supplies the install locations for a single host platform.

pub mod core;
pub mod discovery;
mod executor;
pub mod orchestrator;
pub mod probe;

pub use crate::core::config::{Config, ConfigError, GeneratorConfig};
pub use crate::core::lock;
pub use crate::core::output;
pub use crate::core::platform::{Platform, PlatformSpec};
pub use crate::core::version::{QtVersion, VersionError};
pub use discovery::{Discovery, ManifestKind};
pub use executor::{
    CURL_RETRY_POLICY, Context, ExitClass, Executor, Invocation, KEEP_MODULES, PipelineError,
    RetryPolicy, StageSummary, SystemRunner, ToolOutput, ToolRunner, VersionState,
    configure_args, fetch, generator_invocation, skip_modules, unique_versions, version_state,
};
pub use orchestrator::{Mode, RunOptions, RunReport};
pub use probe::ProbeError;

#[doc(hidden)]
pub use executor::testing;
