//! Permission checks for handler types.

use axum::response::{IntoResponse, Response};
use objperm_core::AuthUser;

use crate::args::ViewArgs;
use crate::error::Rejection;
use crate::guard::{check_perms, denial, GuardContext, PermSpec};

/// Permission requirements declared by a handler type.
///
/// The trait counterpart of [`permission_required`](crate::permission_required):
/// implement [`permission_required`](Self::permission_required) and route
/// requests through [`dispatch`](Self::dispatch).
///
/// ```ignore
/// struct EditPost;
///
/// impl PermissionRequiredView<User> for EditPost {
///     fn permission_required(&self) -> Option<Vec<PermSpec>> {
///         Some(vec![("blog.change_post", "post_id").into()])
///     }
/// }
///
/// EditPost.dispatch(&ctx, args, |args| render_edit_form(args))
/// ```
pub trait PermissionRequiredView<U: AuthUser> {
    /// Permissions every request must hold. `None` is a configuration error.
    fn permission_required(&self) -> Option<Vec<PermSpec>> {
        None
    }

    /// Login page for denied requests. Defaults to the configured login URL.
    fn login_url(&self) -> Option<String> {
        None
    }

    /// Reject with 403 instead of redirecting. Defaults to the configured value.
    fn raise_exception(&self) -> Option<bool> {
        None
    }

    /// Whether the request's user holds every required permission.
    ///
    /// Object arguments are resolved in `args` as with the guard.
    fn has_permission(
        &self,
        ctx: &GuardContext<'_, U>,
        args: &mut ViewArgs<U>,
    ) -> Result<bool, Rejection> {
        let perms = self
            .permission_required()
            .filter(|perms| !perms.is_empty())
            .ok_or_else(|| {
                Rejection::ImproperlyConfigured(format!(
                    "{} is missing permission_required",
                    std::any::type_name::<Self>()
                ))
            })?;
        check_perms(ctx, &perms, args)
    }

    /// The rejection for a request without permission.
    fn handle_no_permission(&self, ctx: &GuardContext<'_, U>) -> Rejection {
        denial(ctx, self.login_url().as_deref(), self.raise_exception())
    }

    /// Check permissions, then run `handler` or answer with the rejection.
    fn dispatch<F, R>(&self, ctx: &GuardContext<'_, U>, mut args: ViewArgs<U>, handler: F) -> Response
    where
        F: FnOnce(ViewArgs<U>) -> R,
        R: IntoResponse,
    {
        match self.has_permission(ctx, &mut args) {
            Ok(true) => handler(args).into_response(),
            Ok(false) => self.handle_no_permission(ctx).into_response(),
            Err(rejection) => rejection.into_response(),
        }
    }
}
