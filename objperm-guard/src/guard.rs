//! The `permission_required` guard.

use std::sync::Arc;

use axum::http::{HeaderMap, Uri};
use axum::response::{IntoResponse, Response};
use objperm_core::{AuthUser, ObjectPermissionsBackend, OlpUser};

use crate::args::{ViewArg, ViewArgs};
use crate::error::Rejection;
use crate::redirect::{next_target, redirect_to_login};
use crate::registry::ModelRegistry;

/// A permission a guarded handler requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermSpec {
    /// Model-level permission, e.g. `"blog.add_post"`.
    Model(String),
    /// Permission on the object whose primary key is in the view argument
    /// `arg`, e.g. `("blog.change_post", "post_id")`.
    Object { perm: String, arg: String },
}

impl PermSpec {
    pub fn perm(&self) -> &str {
        match self {
            PermSpec::Model(perm) => perm.as_str(),
            PermSpec::Object { perm, .. } => perm.as_str(),
        }
    }
}

impl From<&str> for PermSpec {
    fn from(perm: &str) -> Self {
        PermSpec::Model(perm.to_string())
    }
}

impl From<String> for PermSpec {
    fn from(perm: String) -> Self {
        PermSpec::Model(perm)
    }
}

impl From<(&str, &str)> for PermSpec {
    fn from((perm, arg): (&str, &str)) -> Self {
        PermSpec::Object {
            perm: perm.to_string(),
            arg: arg.to_string(),
        }
    }
}

/// Context available to permission guards before the handler runs.
pub struct GuardContext<'a, U: AuthUser> {
    pub backend: &'a ObjectPermissionsBackend,
    pub registry: &'a dyn ModelRegistry<U>,
    pub headers: &'a HeaderMap,
    pub uri: &'a Uri,
    /// The authenticated user, `None` for anonymous requests.
    pub user: Option<&'a OlpUser<U>>,
}

impl<'a, U: AuthUser> GuardContext<'a, U> {
    /// The request path.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// The request query string, if any.
    pub fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }
}

/// Guard requiring every listed permission.
///
/// # Examples
///
/// ```ignore
/// use objperm_guard::permission_required;
///
/// // Model-level only
/// let guard = permission_required(["blog.add_post"]);
///
/// // Object-level: "post_id" holds the primary key and is replaced by the post
/// let guard = permission_required([("blog.change_post", "post_id")])
///     .raise_exception(true);
///
/// guard.call(&ctx, args, |args| {
///     let post: &Post = args.downcast("post_id").unwrap();
///     Json(post.summary())
/// })
/// ```
#[derive(Debug, Clone)]
pub struct PermissionGuard {
    perms: Vec<PermSpec>,
    login_url: Option<String>,
    raise_exception: Option<bool>,
}

/// Build a [`PermissionGuard`] for `perms`.
///
/// Each entry is a permission name or a `(permission, view argument)` pair.
pub fn permission_required<I, P>(perms: I) -> PermissionGuard
where
    I: IntoIterator<Item = P>,
    P: Into<PermSpec>,
{
    PermissionGuard {
        perms: perms.into_iter().map(Into::into).collect(),
        login_url: None,
        raise_exception: None,
    }
}

impl PermissionGuard {
    /// Add another permission (builder style).
    pub fn and(mut self, perm: impl Into<PermSpec>) -> Self {
        self.perms.push(perm.into());
        self
    }

    /// Redirect denied requests here instead of the configured login URL.
    pub fn login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = Some(url.into());
        self
    }

    /// Reject with 403 (`true`) or redirect to login (`false`), overriding the
    /// configured default.
    pub fn raise_exception(mut self, raise: bool) -> Self {
        self.raise_exception = Some(raise);
        self
    }

    pub fn perms(&self) -> &[PermSpec] {
        &self.perms
    }

    /// Check every permission, resolving object arguments in `args`.
    pub fn check<U: AuthUser>(
        &self,
        ctx: &GuardContext<'_, U>,
        args: &mut ViewArgs<U>,
    ) -> Result<(), Rejection> {
        if self.perms.is_empty() {
            return Err(Rejection::ImproperlyConfigured(
                "permission_required needs at least one permission".into(),
            ));
        }
        if check_perms(ctx, &self.perms, args)? {
            Ok(())
        } else {
            Err(denial(
                ctx,
                self.login_url.as_deref(),
                self.raise_exception,
            ))
        }
    }

    /// Run `handler` with the resolved arguments if every permission holds,
    /// otherwise answer with the rejection.
    pub fn call<U, F, R>(&self, ctx: &GuardContext<'_, U>, mut args: ViewArgs<U>, handler: F) -> Response
    where
        U: AuthUser,
        F: FnOnce(ViewArgs<U>) -> R,
        R: IntoResponse,
    {
        match self.check(ctx, &mut args) {
            Ok(()) => handler(args).into_response(),
            Err(rejection) => rejection.into_response(),
        }
    }
}

/// Whether the context's user holds every permission in `perms`.
///
/// Object specs replace their view argument with the loaded object. Checking
/// stops at the first permission not held.
pub(crate) fn check_perms<U: AuthUser>(
    ctx: &GuardContext<'_, U>,
    perms: &[PermSpec],
    args: &mut ViewArgs<U>,
) -> Result<bool, Rejection> {
    for spec in perms {
        let granted = match spec {
            PermSpec::Model(perm) => match ctx.user {
                Some(user) => ctx.backend.check_model(user, perm),
                None => false,
            },
            PermSpec::Object { perm, arg } => {
                let mut parts = perm.split('.');
                let well_formed = matches!(
                    (parts.next(), parts.next(), parts.next()),
                    (Some(app), Some(code), None) if !app.is_empty() && !code.is_empty()
                );
                let model = if well_formed {
                    ctx.backend.store().model_for_perm(perm)
                } else {
                    None
                };
                let Some(model) = model else {
                    tracing::debug!(perm = %perm, "unknown or malformed permission");
                    return Ok(false);
                };

                let obj = match args.get(arg) {
                    // Already resolved by an earlier permission
                    Some(ViewArg::Object(existing)) if existing.model() == model => {
                        Arc::clone(existing)
                    }
                    Some(arg_value) => {
                        let pk = match arg_value {
                            ViewArg::Value(pk) => pk.clone(),
                            ViewArg::Object(existing) => existing.pk(),
                        };
                        ctx.registry.get(&model, &pk).ok_or_else(|| {
                            Rejection::NotFound(format!("No {} matches pk '{}'", model, pk))
                        })?
                    }
                    None => {
                        return Err(Rejection::ImproperlyConfigured(format!(
                            "view argument '{}' not found",
                            arg
                        )))
                    }
                };
                args.insert_object(arg.clone(), obj.clone());

                match ctx.user {
                    Some(user) => ctx.backend.check(user, perm, Some(&*obj)),
                    None => false,
                }
            }
        };

        if !granted {
            tracing::debug!(
                user = ctx.user.map(|u| u.pk()).unwrap_or("<anonymous>"),
                perm = %spec.perm(),
                path = %ctx.path(),
                "permission denied"
            );
            return Ok(false);
        }
    }
    Ok(true)
}

/// The rejection for a denied request.
pub(crate) fn denial<U: AuthUser>(
    ctx: &GuardContext<'_, U>,
    login_url: Option<&str>,
    raise_exception: Option<bool>,
) -> Rejection {
    let config = ctx.backend.config();
    if raise_exception.unwrap_or(config.default_403) {
        return Rejection::Forbidden;
    }
    let login_url = login_url.unwrap_or(config.login_url.as_str());
    let next = next_target(ctx.uri, ctx.headers, login_url);
    Rejection::Redirect(redirect_to_login(&next, login_url))
}
