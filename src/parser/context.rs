use std::collections::HashMap;
use std::hash::BuildHasher;

use serde_json::Value;

/// Read-only variable lookup used while filling templates.
pub trait TemplateContext {
    fn lookup(&self, name: &str) -> Option<String>;
}

impl<T: TemplateContext + ?Sized> TemplateContext for &T {
    fn lookup(&self, name: &str) -> Option<String> {
        (**self).lookup(name)
    }
}

impl<S: BuildHasher> TemplateContext for HashMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// JSON values are coerced to strings; `null` reads as absent.
impl<S: BuildHasher> TemplateContext for HashMap<String, Value, S> {
    fn lookup(&self, name: &str) -> Option<String> {
        self.get(name).and_then(value_to_string)
    }
}

/// Adapts a closure into a [`TemplateContext`].
pub struct LookupFn<F>(pub F);

impl<F> TemplateContext for LookupFn<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn lookup(&self, name: &str) -> Option<String> {
        (self.0)(name)
    }
}

pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.to_owned()),
        other => Some(other.to_string()),
    }
}

/// Owned variable store (the flow variables of one log-shipping call).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    vars: HashMap<String, String>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn unset(&mut self, name: &str) -> &mut Self {
        self.vars.remove(name);
        self
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Copies every variable of `other` over this store, overwriting on conflict.
    pub fn merge(&mut self, other: &VariableStore) -> &mut Self {
        for (k, v) in &other.vars {
            self.vars.insert(k.to_owned(), v.to_owned());
        }
        self
    }
}

impl TemplateContext for VariableStore {
    fn lookup(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableStore {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
