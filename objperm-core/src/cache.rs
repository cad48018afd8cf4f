//! Per-user memo of object-level access decisions.

use std::collections::HashMap;
use std::fmt;

/// Which access check produced a decision.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Scope {
    /// Logic driven by the user itself (`_user_can_*`).
    User,
    /// Logic driven by the user's groups (`_group_can_*`).
    Group,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::User => "user",
            Scope::Group => "group",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single scope's object-level check.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Access {
    /// The access check explicitly granted the permission.
    Granted,
    /// The access check refused the permission (or the model-level gate did).
    Denied,
    /// The object defines no access check for this scope and permission.
    NoRule,
}

impl Access {
    pub fn from_bool(granted: bool) -> Self {
        if granted {
            Access::Granted
        } else {
            Access::Denied
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, Access::Granted)
    }

    /// Combine user- and group-scope outcomes.
    ///
    /// A scope that was not evaluated is passed as `None` and counts as
    /// having no rule. Granted if either scope granted, or if neither defines
    /// a rule at all.
    pub fn combine(user: Option<Access>, group: Option<Access>) -> bool {
        let user = user.unwrap_or(Access::NoRule);
        let group = group.unwrap_or(Access::NoRule);
        user.is_granted()
            || group.is_granted()
            || (user == Access::NoRule && group == Access::NoRule)
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Granted => f.write_str("Granted"),
            Access::Denied => f.write_str("Denied"),
            Access::NoRule => f.write_str("No rule"),
        }
    }
}

/// Cache key for a per-scope decision.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CacheKey {
    pub scope: Scope,
    pub perm: String,
    pub object: String,
}

impl CacheKey {
    pub fn new(scope: Scope, perm: &str, object: &str) -> Self {
        Self {
            scope,
            perm: perm.to_string(),
            object: object.to_string(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "_{}_perm_cache_{}_{}", self.scope, self.perm, self.object)
    }
}

/// Memo of object-level decisions owned by a single user instance.
///
/// Entries never expire and are never recomputed: the cache lives exactly as
/// long as its owner and is emptied only by [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct PermCache {
    entries: HashMap<CacheKey, Access>,
}

impl PermCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached decision. `None` is a cache miss.
    pub fn get(&self, key: &CacheKey) -> Option<Access> {
        self.entries.get(key).copied()
    }

    /// Store a decision.
    pub fn set(&mut self, key: CacheKey, access: Access) {
        self.entries.insert(key, access);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached decision.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over the cached keys.
    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.entries.keys()
    }
}
