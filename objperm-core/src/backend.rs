//! Object-level permission backend.
//!
//! Resolution order for `has_perm(user, perm, Some(obj))`:
//! 1. Inactive users are denied outright.
//! 2. Active superusers are granted, unless `universal` mode is on.
//! 3. Model-level gate: the user must hold `perm` in the [`PermissionStore`]
//!    (superusers always pass this gate).
//! 4. User scope: the object's `user_can` rule for the codename.
//! 5. Group scope: the object's `group_can` rule, only when the user scope
//!    did not grant.
//!
//! The permission is granted when either scope grants it, or when the object
//! defines no rule in either scope. Every per-scope outcome is memoized on the
//! [`OlpUser`] for the rest of its lifetime.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::cache::{Access, CacheKey, Scope};
use crate::config::OlpConfig;
use crate::log::Loggable;
use crate::object::{access_fn_name, codename, ObjectPermissions};
use crate::store::PermissionStore;
use crate::user::{AuthUser, OlpUser};

/// Preamble line later replaced by the model-level result.
const MODEL_RESULT_PLACEHOLDER: &str = "Model-level Result: <pending>";

fn verdict(granted: bool) -> &'static str {
    if granted {
        "Granted"
    } else {
        "Denied"
    }
}

/// Authorization backend resolving per-object permissions on top of a
/// model-level [`PermissionStore`].
///
/// Cheap to clone: the store is shared.
///
/// # Example
///
/// ```ignore
/// use objperm_core::{MemoryPermissionStore, ObjectPermissionsBackend, OlpConfig, OlpUser};
///
/// let backend = ObjectPermissionsBackend::with_config(store, OlpConfig::new().with_log_verbosity(2));
/// let user = OlpUser::new(load_user(id)?);
///
/// if backend.has_perm(&user, "blog.delete_post", Some(&post)) {
///     // ...
/// }
/// println!("{}", user.get_last_log()?);
/// ```
#[derive(Clone)]
pub struct ObjectPermissionsBackend {
    store: Arc<dyn PermissionStore>,
    config: OlpConfig,
}

impl fmt::Debug for ObjectPermissionsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPermissionsBackend")
            .field("config", &self.config)
            .finish()
    }
}

impl ObjectPermissionsBackend {
    /// Create a backend with the default configuration.
    pub fn new(store: impl PermissionStore) -> Self {
        Self::with_config(store, OlpConfig::default())
    }

    pub fn with_config(store: impl PermissionStore, config: OlpConfig) -> Self {
        Self {
            store: Arc::new(store),
            config,
        }
    }

    /// Create a backend over an already shared store.
    pub fn from_shared(store: Arc<dyn PermissionStore>, config: OlpConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &OlpConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn PermissionStore {
        self.store.as_ref()
    }

    /// This backend only authorizes; it never authenticates anyone.
    pub fn authenticate<C: ?Sized, U>(&self, _credentials: &C) -> Option<U> {
        None
    }

    // ── Single permission ──────────────────────────────────────────────

    /// Whether `user` holds `perm` on `obj`.
    ///
    /// Without an object this is always `false`: model-level checks belong to
    /// [`check_model`](Self::check_model).
    pub fn has_perm<U, O>(&self, user: &OlpUser<U>, perm: &str, obj: Option<&O>) -> bool
    where
        U: AuthUser,
        O: ObjectPermissions<U> + ?Sized,
    {
        let Some(obj) = obj else {
            return false;
        };

        if !user.is_active() {
            tracing::trace!(user = user.pk(), perm, "inactive user denied");
            return false;
        }

        let pk = obj.pk();

        if let Some(granted) = self.cached_decision(user, perm, &pk) {
            tracing::trace!(user = user.pk(), perm, object = %pk, granted, "cache hit");
            return granted;
        }

        let granted = if self.logging() {
            let preamble = vec![
                format!("Permission: {perm}"),
                format!("User: {} ({})", user.username(), user.pk()),
                format!("Object: {} ({})", obj.model(), pk),
                MODEL_RESULT_PLACEHOLDER.to_string(),
                String::new(),
            ];
            self.logged(user, &format!("auto-{perm}-{pk}"), preamble, || {
                self.decide(user, perm, obj, &pk, None, true)
            })
        } else {
            self.decide(user, perm, obj, &pk, None, false)
        };

        tracing::trace!(user = user.pk(), perm, object = %pk, granted, "object permission resolved");
        granted
    }

    /// Model-level check with the same user rules as [`check`](Self::check).
    pub fn check_model<U: AuthUser>(&self, user: &OlpUser<U>, perm: &str) -> bool {
        if !user.is_active() {
            return false;
        }
        if self.logging() {
            self.model_level_traced(user, perm)
        } else {
            self.model_level(user, perm)
        }
    }

    /// Full permission dispatch for a user: the model-level check when no
    /// object is given, [`has_perm`](Self::has_perm) otherwise.
    ///
    /// Active superusers are granted everything unless `universal` mode is on.
    pub fn check<U, O>(&self, user: &OlpUser<U>, perm: &str, obj: Option<&O>) -> bool
    where
        U: AuthUser,
        O: ObjectPermissions<U> + ?Sized,
    {
        if !user.is_active() {
            return false;
        }
        if user.is_superuser() && !self.config.universal {
            return true;
        }
        match obj {
            None => self.check_model(user, perm),
            Some(obj) => self.has_perm(user, perm, Some(obj)),
        }
    }

    /// Whether [`check`](Self::check) passes for every permission in `perms`.
    pub fn check_all<U, O, I, P>(&self, user: &OlpUser<U>, perms: I, obj: Option<&O>) -> bool
    where
        U: AuthUser,
        O: ObjectPermissions<U> + ?Sized,
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        perms
            .into_iter()
            .all(|perm| self.check(user, perm.as_ref(), obj))
    }

    // ── Bulk ───────────────────────────────────────────────────────────

    /// Permissions granted on `obj` through user-scope rules.
    pub fn get_user_permissions<U, O>(&self, user: &OlpUser<U>, obj: Option<&O>) -> HashSet<String>
    where
        U: AuthUser,
        O: ObjectPermissions<U> + ?Sized,
    {
        self.object_permissions(user, obj, Some(Scope::User))
    }

    /// Permissions granted on `obj` through group-scope rules.
    pub fn get_group_permissions<U, O>(&self, user: &OlpUser<U>, obj: Option<&O>) -> HashSet<String>
    where
        U: AuthUser,
        O: ObjectPermissions<U> + ?Sized,
    {
        self.object_permissions(user, obj, Some(Scope::Group))
    }

    /// Permissions granted on `obj` by either scope, combined as in
    /// [`has_perm`](Self::has_perm).
    pub fn get_all_permissions<U, O>(&self, user: &OlpUser<U>, obj: Option<&O>) -> HashSet<String>
    where
        U: AuthUser,
        O: ObjectPermissions<U> + ?Sized,
    {
        self.object_permissions(user, obj, None)
    }

    fn object_permissions<U, O>(
        &self,
        user: &OlpUser<U>,
        obj: Option<&O>,
        only: Option<Scope>,
    ) -> HashSet<String>
    where
        U: AuthUser,
        O: ObjectPermissions<U> + ?Sized,
    {
        let Some(obj) = obj else {
            return HashSet::new();
        };
        if !user.is_active() || user.is_anonymous() {
            return HashSet::new();
        }

        let perms = self.store.perms_for_model(&obj.model());

        if user.is_superuser() && !self.config.universal {
            return perms.into_iter().collect();
        }

        let pk = obj.pk();
        perms
            .into_iter()
            .filter(|perm| self.decide(user, perm, obj, &pk, only, false))
            .collect()
    }

    // ── Resolution ─────────────────────────────────────────────────────

    fn logging(&self) -> bool {
        self.config.log_verbosity > 0
    }

    /// Decision for `(user, perm, pk)` if both scopes it needs are cached.
    fn cached_decision<U: AuthUser>(&self, user: &OlpUser<U>, perm: &str, pk: &str) -> Option<bool> {
        let user_access = user.cached(&CacheKey::new(Scope::User, perm, pk))?;
        if user_access.is_granted() {
            return Some(true);
        }
        let group_access = user.cached(&CacheKey::new(Scope::Group, perm, pk))?;
        Some(Access::combine(Some(user_access), Some(group_access)))
    }

    /// Resolve `perm` on `obj`, evaluating only the `only` scope when given.
    ///
    /// `traced` is set when a decision log is active for this resolution.
    fn decide<U, O>(
        &self,
        user: &OlpUser<U>,
        perm: &str,
        obj: &O,
        pk: &str,
        only: Option<Scope>,
        traced: bool,
    ) -> bool
    where
        U: AuthUser,
        O: ObjectPermissions<U> + ?Sized,
    {
        if user.is_superuser() && !self.config.universal {
            if traced {
                user.log_store().borrow_mut().replace_line(
                    MODEL_RESULT_PLACEHOLDER,
                    format!("Model-level Result: {}", verdict(true)),
                );
                self.note(user, "Active superuser: implicit permission".to_string());
            }
            return true;
        }

        let model_level = if traced {
            self.model_level_traced(user, perm)
        } else {
            self.model_level(user, perm)
        };

        if !model_level {
            // Object-level logic is never consulted without the model-level
            // permission; remember the denial for every scope in question.
            let scopes: &[Scope] = match only {
                Some(Scope::User) => &[Scope::User],
                Some(Scope::Group) => &[Scope::Group],
                None => &[Scope::User, Scope::Group],
            };
            for scope in scopes {
                let key = CacheKey::new(*scope, perm, pk);
                if user.cached(&key).is_none() {
                    user.cache_decision(key, Access::Denied);
                }
            }
            return false;
        }

        let user_access = if only != Some(Scope::Group) {
            Some(self.scope_access(Scope::User, user, perm, obj, pk, traced))
        } else {
            None
        };

        let user_granted = user_access.is_some_and(|a| a.is_granted());
        let group_access = if only != Some(Scope::User) && !user_granted {
            Some(self.scope_access(Scope::Group, user, perm, obj, pk, traced))
        } else {
            None
        };

        Access::combine(user_access, group_access)
    }

    fn scope_access<U, O>(
        &self,
        scope: Scope,
        user: &OlpUser<U>,
        perm: &str,
        obj: &O,
        pk: &str,
        traced: bool,
    ) -> Access
    where
        U: AuthUser,
        O: ObjectPermissions<U> + ?Sized,
    {
        let key = CacheKey::new(scope, perm, pk);
        if let Some(access) = user.cached(&key) {
            return access;
        }

        let codename = codename(perm);
        let outcome = match scope {
            Scope::User => obj.user_can(codename, user),
            Scope::Group => obj.group_can(codename, user.groups()),
        };
        let access = match outcome {
            None => Access::NoRule,
            Some(Ok(granted)) => Access::from_bool(granted),
            Some(Err(_)) => Access::Denied,
        };

        if traced {
            self.note(user, format!("{}: {}", access_fn_name(scope, perm), access));
        }
        tracing::trace!(scope = %scope, perm, object = pk, access = %access, "access check");

        user.cache_decision(key, access);
        access
    }

    fn model_level(&self, user: &dyn AuthUser, perm: &str) -> bool {
        if !user.is_active() {
            return false;
        }
        user.is_superuser() || self.store.has_model_perm(user, perm)
    }

    /// Model-level check recorded in its own `auto-<perm>` log.
    ///
    /// When an enclosing object-level log is current, its placeholder line is
    /// replaced with the model-level result so both read as one trace.
    fn model_level_traced<U: AuthUser>(&self, user: &OlpUser<U>, perm: &str) -> bool {
        let preamble = vec![
            format!("Permission: {perm}"),
            format!("User: {} ({})", user.username(), user.pk()),
        ];
        let granted = self.logged(user, &format!("auto-{perm}"), preamble, || {
            self.model_level(user, perm)
        });

        user.log_store().borrow_mut().replace_line(
            MODEL_RESULT_PLACEHOLDER,
            format!("Model-level Result: {}", verdict(granted)),
        );
        granted
    }

    /// Run `decide` inside a named log on `user`, finishing it on every path.
    fn logged<U, F>(&self, user: &OlpUser<U>, name: &str, preamble: Vec<String>, decide: F) -> bool
    where
        U: AuthUser,
        F: FnOnce() -> bool,
    {
        if let Err(e) = user.start_log(name) {
            tracing::warn!(error = %e, log = name, "decision log not recorded");
            return decide();
        }
        if self.config.log_verbosity >= 2 {
            let _ = user.log(preamble);
        }

        let granted = decide();

        if !user.log_store().borrow().is_active(name) {
            tracing::warn!(log = name, "decision log closed by an access check");
            return granted;
        }
        // Access checks may leave their own logs open; close them so the
        // result lands in ours.
        while user.active_log_name().is_some_and(|current| current != name) {
            tracing::warn!(log = name, "discarding unfinished nested log");
            let _ = user.discard_log();
        }

        let mut closing = Vec::with_capacity(2);
        if self.config.log_verbosity >= 2 {
            closing.push(String::new());
        }
        closing.push(format!("RESULT: Permission {}", verdict(granted)));
        let _ = user.log(closing);
        if let Err(e) = user.end_log() {
            tracing::warn!(error = %e, log = name, "decision log not finished");
        }
        granted
    }

    fn note<U: AuthUser>(&self, user: &OlpUser<U>, line: String) {
        if self.config.log_verbosity >= 2 {
            let _ = user.log([line]);
        }
    }
}
