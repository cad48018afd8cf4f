//! Named handler arguments, before and after object resolution.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::extract::RawPathParams;
use objperm_core::{AuthUser, ObjectPermissions};

/// An object the guards can hand to a handler in place of its primary key.
///
/// Implemented for every `'static` type implementing [`ObjectPermissions`].
pub trait ModelObject<U: AuthUser>: ObjectPermissions<U> + Any {
    fn as_any(&self) -> &dyn Any;
}

impl<U, T> ModelObject<U> for T
where
    U: AuthUser,
    T: ObjectPermissions<U> + Any,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A single handler argument.
pub enum ViewArg<U: AuthUser> {
    /// Raw value, typically a path parameter.
    Value(String),
    /// An object resolved from a primary key by a guard.
    Object(Arc<dyn ModelObject<U>>),
}

impl<U: AuthUser> Clone for ViewArg<U> {
    fn clone(&self) -> Self {
        match self {
            ViewArg::Value(v) => ViewArg::Value(v.clone()),
            ViewArg::Object(obj) => ViewArg::Object(Arc::clone(obj)),
        }
    }
}

impl<U: AuthUser> fmt::Debug for ViewArg<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewArg::Value(v) => f.debug_tuple("Value").field(v).finish(),
            ViewArg::Object(obj) => write!(f, "Object({} ({}))", obj.model(), obj.pk()),
        }
    }
}

/// The named arguments a guarded handler receives.
///
/// Guards checking a permission against an object read the object's primary
/// key from here and replace it with the loaded object, so the handler does
/// not load it a second time.
///
/// ```ignore
/// async fn delete_post(RawPathParams(params): ..) -> Response {
///     let args = ViewArgs::from_raw(&params);
///     guard.call(&ctx, args, |args| {
///         let post: &Post = args.downcast("post_id").unwrap();
///         ...
///     })
/// }
/// ```
pub struct ViewArgs<U: AuthUser> {
    args: HashMap<String, ViewArg<U>>,
}

impl<U: AuthUser> Default for ViewArgs<U> {
    fn default() -> Self {
        Self {
            args: HashMap::new(),
        }
    }
}

impl<U: AuthUser> Clone for ViewArgs<U> {
    fn clone(&self) -> Self {
        Self {
            args: self.args.clone(),
        }
    }
}

impl<U: AuthUser> fmt::Debug for ViewArgs<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.args.iter()).finish()
    }
}

impl<U: AuthUser> ViewArgs<U> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, value)` pairs.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Build from axum's matched path parameters.
    pub fn from_raw(raw: &RawPathParams) -> Self {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    /// Add a raw value (builder style).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert_value(name, value);
        self
    }

    pub fn insert_value(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.args.insert(name.into(), ViewArg::Value(value.into()));
    }

    pub fn insert_object(&mut self, name: impl Into<String>, obj: Arc<dyn ModelObject<U>>) {
        self.args.insert(name.into(), ViewArg::Object(obj));
    }

    pub fn get(&self, name: &str) -> Option<&ViewArg<U>> {
        self.args.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.args.contains_key(name)
    }

    /// The raw value of `name`, if it has not been replaced by an object.
    pub fn value(&self, name: &str) -> Option<&str> {
        match self.args.get(name)? {
            ViewArg::Value(v) => Some(v.as_str()),
            ViewArg::Object(_) => None,
        }
    }

    /// The object `name` was resolved to.
    pub fn object(&self, name: &str) -> Option<&Arc<dyn ModelObject<U>>> {
        match self.args.get(name)? {
            ViewArg::Object(obj) => Some(obj),
            ViewArg::Value(_) => None,
        }
    }

    /// The object `name` was resolved to, as its concrete type.
    pub fn downcast<T: 'static>(&self, name: &str) -> Option<&T> {
        self.object(name)?.as_any().downcast_ref::<T>()
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl<U: AuthUser> FromIterator<(String, String)> for ViewArgs<U> {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            args: iter
                .into_iter()
                .map(|(k, v)| (k, ViewArg::Value(v)))
                .collect(),
        }
    }
}
