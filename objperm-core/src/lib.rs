//! Object-level (row-level) permissions for objperm.
//!
//! This crate decides whether a user holds a permission on one specific
//! object, layered on top of an ordinary model-level permission system.
//!
//! # Overview
//!
//! - **[`PermissionStore`]** answers model-level questions: does this user
//!   hold `blog.delete_post` at all?
//! - **[`ObjectPermissions`]** is implemented by domain objects that restrict
//!   permissions per instance, with a user-scope and a group-scope rule per
//!   codename.
//! - **[`ObjectPermissionsBackend`]** combines both. The model-level
//!   permission is always required; object rules can only narrow it.
//! - **[`OlpUser`]** wraps a loaded user with a decision cache and a
//!   [`Loggable`] store for decision traces.
//!
//! # Setup
//!
//! ```ignore
//! use objperm_core::{MemoryPermissionStore, ModelKey, ObjectPermissionsBackend, OlpConfig, OlpUser};
//!
//! let store = MemoryPermissionStore::new();
//! let post = ModelKey::new("blog", "post");
//! store.register_defaults(&post);
//! store.grant_group("writers", "blog.delete_post");
//!
//! let config = OlpConfig::load("dev")?;
//! let backend = ObjectPermissionsBackend::with_config(store, config);
//!
//! let user = OlpUser::new(current_user);
//! if backend.has_perm(&user, "blog.delete_post", Some(&post_row)) {
//!     // ...
//! }
//! ```
//!
//! # Decision logs
//!
//! With `log_verbosity` above 0, every uncached object-level check writes a
//! named log (`auto-<perm>-<pk>`) on the user:
//!
//! ```text
//! Permission: blog.delete_post
//! User: alice (1)
//! Object: blog.post (42)
//! Model-level Result: Granted
//!
//! _user_can_delete_post: Denied
//! _group_can_delete_post: Granted
//!
//! RESULT: Permission Granted
//! ```
//!
//! Access checks may add their own lines through [`Loggable::log`] on the
//! user they receive.

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod log;
pub mod object;
pub mod store;
pub mod user;

// Re-exports
pub use backend::ObjectPermissionsBackend;
pub use cache::{Access, CacheKey, PermCache, Scope};
pub use config::OlpConfig;
pub use error::{ConfigError, LogError, PermissionDenied};
pub use log::{LogStore, Loggable};
pub use object::{access_fn_name, codename, AccessCheck, ModelKey, ObjectPermissions};
pub use store::{MemoryPermissionStore, PermissionStore};
pub use user::{AuthUser, Group, OlpUser};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::backend::ObjectPermissionsBackend;
    pub use crate::config::OlpConfig;
    pub use crate::error::PermissionDenied;
    pub use crate::log::Loggable;
    pub use crate::object::{AccessCheck, ModelKey, ObjectPermissions};
    pub use crate::store::{MemoryPermissionStore, PermissionStore};
    pub use crate::user::{AuthUser, Group, OlpUser};
}
