//! Users, groups, and the per-instance permission state attached to them.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::ops::Deref;

use crate::cache::{Access, CacheKey, PermCache};
use crate::log::{LogStore, Loggable};

/// A group a user belongs to.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct Group {
    pub id: String,
    pub name: String,
}

impl Group {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// The user entity as seen by the permission backend.
///
/// Implement this on your user model. Model-level permissions are not part of
/// the trait: they are owned by a [`PermissionStore`](crate::store::PermissionStore).
///
/// Implementors own their data (`'static`) so objects checked against them can
/// be held as trait objects.
pub trait AuthUser: 'static {
    /// Opaque identity (primary key).
    fn pk(&self) -> &str;

    /// Human readable name used in decision logs.
    fn username(&self) -> &str {
        self.pk()
    }

    fn is_active(&self) -> bool;

    fn is_superuser(&self) -> bool;

    fn is_anonymous(&self) -> bool {
        false
    }

    /// Groups the user is a member of.
    fn groups(&self) -> &[Group];
}

/// A loaded user together with its object-level permission cache and log store.
///
/// Wrap a user when it is loaded for a request. The cache and logs start
/// empty and live exactly as long as the wrapper, so loading the user again
/// gives a clean slate. The state sits behind `RefCell`s: an `OlpUser` belongs
/// to one request and is not meant to be shared across threads.
///
/// ```ignore
/// let user = OlpUser::new(db_user);
/// backend.has_perm(&user, "blog.delete_post", Some(&post));
/// ```
pub struct OlpUser<U> {
    inner: U,
    perm_cache: RefCell<PermCache>,
    logs: RefCell<LogStore>,
}

impl<U: AuthUser> OlpUser<U> {
    pub fn new(inner: U) -> Self {
        Self {
            inner,
            perm_cache: RefCell::new(PermCache::new()),
            logs: RefCell::new(LogStore::new()),
        }
    }

    /// The wrapped user.
    pub fn inner(&self) -> &U {
        &self.inner
    }

    pub fn into_inner(self) -> U {
        self.inner
    }

    /// Read access to the permission cache.
    pub fn perm_cache(&self) -> Ref<'_, PermCache> {
        self.perm_cache.borrow()
    }

    /// Forget every cached object-level decision.
    ///
    /// Call after changing the user's permissions, group memberships, or the
    /// data access checks depend on.
    pub fn clear_perm_cache(&self) {
        self.perm_cache.borrow_mut().clear();
    }

    /// Drop every active and finished log.
    pub fn clear_logs(&self) {
        self.logs.borrow_mut().clear();
    }

    pub(crate) fn cached(&self, key: &CacheKey) -> Option<Access> {
        self.perm_cache.borrow().get(key)
    }

    pub(crate) fn cache_decision(&self, key: CacheKey, access: Access) {
        self.perm_cache.borrow_mut().set(key, access);
    }
}

impl<U> Deref for OlpUser<U> {
    type Target = U;

    fn deref(&self) -> &U {
        &self.inner
    }
}

impl<U: AuthUser> AuthUser for OlpUser<U> {
    fn pk(&self) -> &str {
        self.inner.pk()
    }
    fn username(&self) -> &str {
        self.inner.username()
    }
    fn is_active(&self) -> bool {
        self.inner.is_active()
    }
    fn is_superuser(&self) -> bool {
        self.inner.is_superuser()
    }
    fn is_anonymous(&self) -> bool {
        self.inner.is_anonymous()
    }
    fn groups(&self) -> &[Group] {
        self.inner.groups()
    }
}

impl<U> Loggable for OlpUser<U> {
    fn log_store(&self) -> &RefCell<LogStore> {
        &self.logs
    }
}

impl<U: AuthUser> From<U> for OlpUser<U> {
    fn from(inner: U) -> Self {
        Self::new(inner)
    }
}

impl<U: fmt::Debug> fmt::Debug for OlpUser<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OlpUser")
            .field("inner", &self.inner)
            .field("cached_decisions", &self.perm_cache.borrow().len())
            .finish()
    }
}
