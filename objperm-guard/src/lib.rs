//! Request guards for objperm.
//!
//! Wraps [`ObjectPermissionsBackend`](objperm_core::ObjectPermissionsBackend)
//! checks around request handlers. A denied request is redirected to the login
//! page (`<login_url>?next=<path>`) or rejected with 403.
//!
//! # Function guard
//!
//! ```ignore
//! use objperm_guard::{permission_required, GuardContext, ViewArgs};
//!
//! async fn edit_post(
//!     State(app): State<App>,
//!     RawPathParams(params): RawPathParams,
//!     headers: HeaderMap,
//!     uri: Uri,
//! ) -> Response {
//!     let user = app.current_user(&headers);
//!     let ctx = GuardContext {
//!         backend: &app.backend,
//!         registry: &app.registry,
//!         headers: &headers,
//!         uri: &uri,
//!         user: user.as_ref(),
//!     };
//!
//!     permission_required([("blog.change_post", "post_id")])
//!         .call(&ctx, ViewArgs::from_raw(&params), |args| {
//!             let post: &Post = args.downcast("post_id").unwrap();
//!             Json(post.clone())
//!         })
//! }
//! ```
//!
//! # Handler types
//!
//! Implement [`PermissionRequiredView`] and call
//! [`dispatch`](PermissionRequiredView::dispatch).
//!
//! # Object arguments
//!
//! A `(permission, argument)` spec reads the primary key from the named
//! argument, loads the object of the permission's model through the
//! [`ModelRegistry`] (404 if missing) and checks the permission against it.
//! The argument is then replaced by the object, so the handler receives it
//! already loaded.
//!
//! Malformed or unknown permission names are denials, never errors.

pub mod args;
pub mod error;
pub mod guard;
pub mod redirect;
pub mod registry;
pub mod view;

// Re-exports
pub use args::{ModelObject, ViewArg, ViewArgs};
pub use error::{error_response, Rejection};
pub use guard::{permission_required, GuardContext, PermSpec, PermissionGuard};
pub use registry::{MemoryRegistry, ModelRegistry};
pub use view::PermissionRequiredView;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::args::ViewArgs;
    pub use crate::error::Rejection;
    pub use crate::guard::{permission_required, GuardContext, PermSpec};
    pub use crate::registry::{MemoryRegistry, ModelRegistry};
    pub use crate::view::PermissionRequiredView;
}
