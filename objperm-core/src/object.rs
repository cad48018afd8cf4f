//! Objects that carry their own access rules.

use std::fmt;

use crate::cache::Scope;
use crate::error::PermissionDenied;
use crate::user::{AuthUser, Group, OlpUser};

/// Result of an object access check: `Ok(granted)` or an explicit refusal.
pub type AccessCheck = Result<bool, PermissionDenied>;

/// Identifies a model type (its app label and model name).
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct ModelKey {
    pub app_label: String,
    pub model: String,
}

impl ModelKey {
    pub fn new(app_label: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            app_label: app_label.into(),
            model: model.into(),
        }
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.app_label, self.model)
    }
}

/// A domain object that can restrict permissions per instance.
///
/// Both checks are keyed by the permission codename (the part of
/// `"<app_label>.<codename>"` after the dot). Return `None` for codenames the
/// object has no rule for: a permission with no rule in either scope follows
/// the model-level decision alone.
///
/// ```ignore
/// impl<U: AuthUser> ObjectPermissions<U> for Post {
///     fn model(&self) -> ModelKey { ModelKey::new("blog", "post") }
///     fn pk(&self) -> String { self.id.to_string() }
///
///     fn user_can(&self, codename: &str, user: &OlpUser<U>) -> Option<AccessCheck> {
///         match codename {
///             "delete_post" => Some(Ok(user.pk() == self.author_id)),
///             _ => None,
///         }
///     }
///
///     fn group_can(&self, codename: &str, groups: &[Group]) -> Option<AccessCheck> {
///         match codename {
///             "delete_post" => Some(Ok(groups.iter().any(|g| g.id == self.team_id))),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait ObjectPermissions<U: AuthUser> {
    /// The model this object is an instance of.
    fn model(&self) -> ModelKey;

    /// Identity of this instance, used in cache keys and logs.
    fn pk(&self) -> String;

    /// User-scope rule (`_user_can_<codename>`).
    fn user_can(&self, _codename: &str, _user: &OlpUser<U>) -> Option<AccessCheck> {
        None
    }

    /// Group-scope rule (`_group_can_<codename>`), given the user's groups.
    fn group_can(&self, _codename: &str, _groups: &[Group]) -> Option<AccessCheck> {
        None
    }
}

/// The codename part of a permission string.
///
/// `"blog.delete_post"` → `"delete_post"`. Strings without a dot are returned
/// unchanged.
pub fn codename(perm: &str) -> &str {
    perm.rsplit('.').next().unwrap_or(perm)
}

/// Conventional name of the access check for `perm` in `scope`.
///
/// `access_fn_name(Scope::User, "blog.delete_post")` → `"_user_can_delete_post"`.
pub fn access_fn_name(scope: Scope, perm: &str) -> String {
    format!("_{}_can_{}", scope, codename(perm))
}
