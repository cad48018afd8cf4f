//! Model-level permission store trait and an in-memory implementation.
//!
//! [`PermissionStore`] is the seam to whatever owns model-level permissions
//! (a database table of grants, a policy service, ...). The object-level
//! backend only ever asks it three things: does this user hold this
//! permission, which permissions exist for this model, and which model does
//! this permission belong to.
//!
//! Provided implementation:
//! - [`MemoryPermissionStore`]: concurrent in-memory store, for tests and
//!   small deployments

use std::sync::Arc;

use dashmap::{DashMap, DashSet};

use crate::object::ModelKey;
use crate::user::AuthUser;

/// Source of model-level permissions.
///
/// Implementations may perform I/O. They must fail closed: a lookup that
/// cannot be answered is a denial.
pub trait PermissionStore: Send + Sync + 'static {
    /// Whether `user` holds `perm` directly or through one of its groups.
    fn has_model_perm(&self, user: &dyn AuthUser, perm: &str) -> bool;

    /// Every permission string (`"<app_label>.<codename>"`) defined for `model`.
    fn perms_for_model(&self, model: &ModelKey) -> Vec<String>;

    /// The model a permission belongs to, if the permission exists.
    fn model_for_perm(&self, perm: &str) -> Option<ModelKey>;
}

impl<S: PermissionStore + ?Sized> PermissionStore for Arc<S> {
    fn has_model_perm(&self, user: &dyn AuthUser, perm: &str) -> bool {
        (**self).has_model_perm(user, perm)
    }
    fn perms_for_model(&self, model: &ModelKey) -> Vec<String> {
        (**self).perms_for_model(model)
    }
    fn model_for_perm(&self, perm: &str) -> Option<ModelKey> {
        (**self).model_for_perm(perm)
    }
}

// ── MemoryPermissionStore ──────────────────────────────────────────────

/// In-memory model-level permission store.
///
/// Permissions must be registered against a model before they can be
/// enumerated or resolved to a model; grants of unregistered permissions still
/// answer `has_model_perm`.
///
/// # Example
///
/// ```ignore
/// let store = MemoryPermissionStore::new();
/// let post = ModelKey::new("blog", "post");
/// store.register(&post, "delete_post");
/// store.grant_user("1", "blog.delete_post");
/// store.grant_group("editors", "blog.delete_post");
/// ```
#[derive(Clone, Default)]
pub struct MemoryPermissionStore {
    permissions: Arc<DashMap<String, ModelKey>>,
    user_grants: Arc<DashSet<(String, String)>>,
    group_grants: Arc<DashSet<(String, String)>>,
}

impl MemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `<app_label>.<codename>` for `model`.
    pub fn register(&self, model: &ModelKey, codename: &str) {
        self.permissions
            .insert(format!("{}.{}", model.app_label, codename), model.clone());
    }

    /// Define the conventional add/change/delete/view permissions for `model`.
    pub fn register_defaults(&self, model: &ModelKey) {
        for action in ["add", "change", "delete", "view"] {
            self.register(model, &format!("{}_{}", action, model.model));
        }
    }

    pub fn grant_user(&self, user_pk: &str, perm: &str) {
        self.user_grants
            .insert((user_pk.to_string(), perm.to_string()));
    }

    pub fn revoke_user(&self, user_pk: &str, perm: &str) {
        self.user_grants
            .remove(&(user_pk.to_string(), perm.to_string()));
    }

    pub fn grant_group(&self, group_id: &str, perm: &str) {
        self.group_grants
            .insert((group_id.to_string(), perm.to_string()));
    }

    pub fn revoke_group(&self, group_id: &str, perm: &str) {
        self.group_grants
            .remove(&(group_id.to_string(), perm.to_string()));
    }

    /// Grant every registered permission of `model` to a user.
    pub fn grant_user_all(&self, user_pk: &str, model: &ModelKey) {
        for perm in self.perms_for_model(model) {
            self.grant_user(user_pk, &perm);
        }
    }

    /// Grant every registered permission of `model` to a group.
    pub fn grant_group_all(&self, group_id: &str, model: &ModelKey) {
        for perm in self.perms_for_model(model) {
            self.grant_group(group_id, &perm);
        }
    }
}

impl PermissionStore for MemoryPermissionStore {
    fn has_model_perm(&self, user: &dyn AuthUser, perm: &str) -> bool {
        if !user.is_active() {
            return false;
        }
        if self
            .user_grants
            .contains(&(user.pk().to_string(), perm.to_string()))
        {
            return true;
        }
        user.groups().iter().any(|g| {
            self.group_grants
                .contains(&(g.id.clone(), perm.to_string()))
        })
    }

    fn perms_for_model(&self, model: &ModelKey) -> Vec<String> {
        let mut perms: Vec<String> = self
            .permissions
            .iter()
            .filter(|entry| entry.value() == model)
            .map(|entry| entry.key().clone())
            .collect();
        perms.sort();
        perms
    }

    fn model_for_perm(&self, perm: &str) -> Option<ModelKey> {
        self.permissions.get(perm).map(|entry| entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::Group;

    struct TestUser {
        pk: String,
        active: bool,
        groups: Vec<Group>,
    }

    impl AuthUser for TestUser {
        fn pk(&self) -> &str {
            &self.pk
        }
        fn is_active(&self) -> bool {
            self.active
        }
        fn is_superuser(&self) -> bool {
            false
        }
        fn groups(&self) -> &[Group] {
            &self.groups
        }
    }

    #[test]
    fn test_group_grant() {
        let store = MemoryPermissionStore::new();
        store.grant_group("g1", "blog.view_post");

        let member = TestUser {
            pk: "1".into(),
            active: true,
            groups: vec![Group::new("g1", "Editors")],
        };
        let outsider = TestUser {
            pk: "2".into(),
            active: true,
            groups: vec![],
        };

        assert!(store.has_model_perm(&member, "blog.view_post"));
        assert!(!store.has_model_perm(&outsider, "blog.view_post"));
    }

    #[test]
    fn test_inactive_user_has_nothing() {
        let store = MemoryPermissionStore::new();
        store.grant_user("1", "blog.view_post");
        let user = TestUser {
            pk: "1".into(),
            active: false,
            groups: vec![],
        };
        assert!(!store.has_model_perm(&user, "blog.view_post"));
    }
}
