//! Lookup of model objects by primary key.

use std::collections::HashMap;
use std::sync::Arc;

use objperm_core::{AuthUser, ModelKey};

use crate::args::ModelObject;

/// Loads the object a guarded request refers to.
///
/// Object permission specs name a view argument holding a primary key; the
/// guard asks the registry for the instance of the permission's model with
/// that key. `None` becomes a 404.
///
/// Any `Fn(&ModelKey, &str) -> Option<Arc<dyn ModelObject<U>>>` is a registry:
///
/// ```ignore
/// let registry = |model: &ModelKey, pk: &str| -> Option<Arc<dyn ModelObject<User>>> {
///     match model.model.as_str() {
///         "post" => db.find_post(pk).map(|p| Arc::new(p) as _),
///         _ => None,
///     }
/// };
/// ```
pub trait ModelRegistry<U: AuthUser> {
    fn get(&self, model: &ModelKey, pk: &str) -> Option<Arc<dyn ModelObject<U>>>;
}

impl<U, F> ModelRegistry<U> for F
where
    U: AuthUser,
    F: Fn(&ModelKey, &str) -> Option<Arc<dyn ModelObject<U>>>,
{
    fn get(&self, model: &ModelKey, pk: &str) -> Option<Arc<dyn ModelObject<U>>> {
        self(model, pk)
    }
}

/// Registry over a fixed set of objects, keyed by model and primary key.
pub struct MemoryRegistry<U: AuthUser> {
    objects: HashMap<(ModelKey, String), Arc<dyn ModelObject<U>>>,
}

impl<U: AuthUser> Default for MemoryRegistry<U> {
    fn default() -> Self {
        Self {
            objects: HashMap::new(),
        }
    }
}

impl<U: AuthUser> MemoryRegistry<U> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object under its own model and primary key.
    pub fn insert<T: ModelObject<U>>(&mut self, obj: T) {
        let key = (obj.model(), obj.pk());
        self.objects.insert(key, Arc::new(obj));
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with<T: ModelObject<U>>(mut self, obj: T) -> Self {
        self.insert(obj);
        self
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl<U: AuthUser> ModelRegistry<U> for MemoryRegistry<U> {
    fn get(&self, model: &ModelKey, pk: &str) -> Option<Arc<dyn ModelObject<U>>> {
        self.objects
            .get(&(model.clone(), pk.to_string()))
            .cloned()
    }
}
