#![allow(dead_code)]

use std::cell::Cell;

use objperm_core::{
    AccessCheck, AuthUser, Group, Loggable, MemoryPermissionStore, ModelKey, ObjectPermissions,
    OlpUser, PermissionDenied,
};

pub const PERMS: [&str; 9] = [
    "tests.add_optest",
    "tests.change_optest",
    "tests.delete_optest",
    "tests.open_perm",
    "tests.closed_perm",
    "tests.user_only_perm",
    "tests.group_only_perm",
    "tests.combined_perm",
    "tests.deny_perm",
];

#[derive(Debug, Clone)]
pub struct TestUser {
    pub pk: String,
    pub username: String,
    pub active: bool,
    pub superuser: bool,
    pub anonymous: bool,
    pub groups: Vec<Group>,
}

impl TestUser {
    pub fn new(pk: &str, username: &str) -> Self {
        Self {
            pk: pk.to_string(),
            username: username.to_string(),
            active: true,
            superuser: false,
            anonymous: false,
            groups: Vec::new(),
        }
    }

    pub fn in_group(mut self, id: &str) -> Self {
        self.groups.push(Group::new(id, format!("Group {id}")));
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn superuser(mut self) -> Self {
        self.superuser = true;
        self
    }

    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }
}

impl AuthUser for TestUser {
    fn pk(&self) -> &str {
        &self.pk
    }
    fn username(&self) -> &str {
        &self.username
    }
    fn is_active(&self) -> bool {
        self.active
    }
    fn is_superuser(&self) -> bool {
        self.superuser
    }
    fn is_anonymous(&self) -> bool {
        self.anonymous
    }
    fn groups(&self) -> &[Group] {
        &self.groups
    }
}

/// Object with one access rule per custom permission, counting invocations.
#[derive(Debug, Default)]
pub struct OpTest {
    pub id: u32,
    pub owner: Option<String>,
    pub group: Option<String>,
    pub user_calls: Cell<u32>,
    pub group_calls: Cell<u32>,
}

impl OpTest {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn owned_by(mut self, user_pk: &str) -> Self {
        self.owner = Some(user_pk.to_string());
        self
    }

    pub fn for_group(mut self, group_id: &str) -> Self {
        self.group = Some(group_id.to_string());
        self
    }

    fn is_owner(&self, user: &OlpUser<TestUser>) -> bool {
        self.owner.as_deref() == Some(user.pk())
    }

    fn has_group(&self, groups: &[Group]) -> bool {
        groups.iter().any(|g| Some(g.id.as_str()) == self.group.as_deref())
    }
}

impl ObjectPermissions<TestUser> for OpTest {
    fn model(&self) -> ModelKey {
        ModelKey::new("tests", "optest")
    }

    fn pk(&self) -> String {
        self.id.to_string()
    }

    fn user_can(&self, codename: &str, user: &OlpUser<TestUser>) -> Option<AccessCheck> {
        let result = match codename {
            "open_perm" => {
                assert!(
                    user.is_active() && !user.is_superuser(),
                    "access rule reached for inactive or superuser"
                );
                let _ = user.log(["Open to everyone"]);
                Ok(true)
            }
            "user_only_perm" | "combined_perm" => Ok(self.is_owner(user)),
            "group_only_perm" => Ok(false),
            "deny_perm" => Err(PermissionDenied),
            _ => return None,
        };
        self.user_calls.set(self.user_calls.get() + 1);
        Some(result)
    }

    fn group_can(&self, codename: &str, groups: &[Group]) -> Option<AccessCheck> {
        let result = match codename {
            "open_perm" => true,
            "user_only_perm" => false,
            "group_only_perm" | "combined_perm" => self.has_group(groups),
            _ => return None,
        };
        self.group_calls.set(self.group_calls.get() + 1);
        Some(Ok(result))
    }
}

/// Store with every test permission registered; everything except
/// `closed_perm` is granted to users "1" and "2" and groups "g1" and "g2".
pub fn store() -> MemoryPermissionStore {
    let store = MemoryPermissionStore::new();
    let model = ModelKey::new("tests", "optest");
    for perm in PERMS {
        let codename = perm.trim_start_matches("tests.");
        store.register(&model, codename);
    }
    for perm in PERMS.iter().filter(|p| **p != "tests.closed_perm") {
        store.grant_user("1", perm);
        store.grant_user("2", perm);
        store.grant_group("g1", perm);
        store.grant_group("g2", perm);
    }
    store
}

pub fn user1() -> OlpUser<TestUser> {
    OlpUser::new(TestUser::new("1", "test1").in_group("g1"))
}

pub fn user2() -> OlpUser<TestUser> {
    OlpUser::new(TestUser::new("2", "test2").in_group("g2"))
}

pub fn set(perms: &[&str]) -> std::collections::HashSet<String> {
    perms.iter().map(|p| p.to_string()).collect()
}
