//! objperm: row-level authorization for axum services.
//!
//! This facade crate re-exports the objperm sub-crates through a single
//! dependency with feature flags. Import everything you need with:
//!
//! ```ignore
//! use objperm::prelude::*;
//! ```
//!
//! # Feature flags
//!
//! | Feature | Default | Crate           |
//! |---------|---------|-----------------|
//! | `guard` | **yes** | `objperm-guard` |

pub extern crate objperm_core;

// Re-export everything from objperm-core at the top level for convenience.
pub use objperm_core::*;

#[cfg(feature = "guard")]
pub use objperm_guard;

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info,objperm_core=info,objperm_guard=info";

/// Install a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Permission decisions are traced at `trace` level and guard denials at
/// `debug`, so `RUST_LOG=objperm_core=trace` shows every check. Does nothing
/// if a global subscriber is already installed.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::init_tracing;
    pub use objperm_core::prelude::*;

    #[cfg(feature = "guard")]
    pub use objperm_guard::prelude::*;
}
