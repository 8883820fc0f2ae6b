use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use serde_json::Value;

use crate::chunk::Chunk;
use crate::context::Context;
use crate::logging::Logger;
use crate::params::Params;
use crate::template::{Bodies, Template};

/// A helper invoked from `{@name ...}` markup.
pub trait Helper: Send + Sync {
    fn call(&self, chunk: Chunk, ctx: &Context, bodies: &Bodies<'_>, params: &Params)
        -> Result<Chunk>;
}

impl<F> Helper for F
where
    F: Fn(Chunk, &Context, &Bodies<'_>, &Params) -> Result<Chunk> + Send + Sync + 'static,
{
    fn call(
        &self,
        chunk: Chunk,
        ctx: &Context,
        bodies: &Bodies<'_>,
        params: &Params,
    ) -> Result<Chunk> {
        (self)(chunk, ctx, bodies, params)
    }
}

/// A named key comparator usable as `sort="name"` in `iterate`.
pub trait Comparator: Send + Sync {
    fn compare(&self, a: &str, b: &str) -> Ordering;
}

impl<F> Comparator for F
where
    F: Fn(&str, &str) -> Ordering + Send + Sync + 'static,
{
    fn compare(&self, a: &str, b: &str) -> Ordering {
        (self)(a, b)
    }
}

struct RegistryInner {
    helpers: HashMap<String, Arc<dyn Helper>>,
    comparators: HashMap<String, Arc<dyn Comparator>>,
    logger: Logger,
}

impl RegistryInner {
    fn new() -> Self {
        Self {
            helpers: HashMap::new(),
            comparators: HashMap::new(),
            logger: Logger::default(),
        }
    }
}

pub struct Registry {
    inner: Arc<Mutex<RegistryInner>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Registry {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner::new())),
        }
    }

    pub fn register<H>(&self, name: impl Into<String>, helper: H)
    where
        H: Helper + 'static,
    {
        let mut inner = self.inner.lock().expect("registry poisoned");
        inner.helpers.insert(name.into(), Arc::new(helper));
    }

    /// Binds a comparator by name; it takes precedence over the built-in
    /// `desc` order when both share a name.
    pub fn register_comparator<C>(&self, name: impl Into<String>, comparator: C)
    where
        C: Comparator + 'static,
    {
        let mut inner = self.inner.lock().expect("registry poisoned");
        inner.comparators.insert(name.into(), Arc::new(comparator));
    }

    pub fn set_logger(&self, logger: Logger) {
        let mut inner = self.inner.lock().expect("registry poisoned");
        inner.logger = logger;
    }

    pub fn logger(&self) -> Logger {
        self.inner.lock().expect("registry poisoned").logger.clone()
    }

    pub fn helper(&self, name: &str) -> Option<Arc<dyn Helper>> {
        let inner = self.inner.lock().expect("registry poisoned");
        inner.helpers.get(name).cloned()
    }

    pub fn comparator(&self, name: &str) -> Option<Arc<dyn Comparator>> {
        let inner = self.inner.lock().expect("registry poisoned");
        inner.comparators.get(name).cloned()
    }

    pub fn context(&self, data: Value) -> Context {
        Context::new(self.clone(), data)
    }

    pub fn render_source(&self, source: &str, data: Value) -> Result<String> {
        let template = Template::parse(source)?;
        template.render(&self.context(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn registered_helper_is_callable_from_markup() {
        let registry = Registry::new();
        let shout = |chunk: Chunk, _: &Context, _: &Bodies<'_>, _: &Params| -> Result<Chunk> {
            Ok(chunk.write("HEY"))
        };
        registry.register("shout", shout);
        let out = registry.render_source("a{@shout/}b", json!({})).unwrap();
        assert_eq!(out, "aHEYb");
    }

    #[test]
    fn comparators_are_shared_across_clones() {
        let registry = Registry::new();
        let clone = registry.clone();
        clone.register_comparator("len", |a: &str, b: &str| a.len().cmp(&b.len()));
        let cmp = registry.comparator("len").unwrap();
        assert_eq!(cmp.compare("aa", "b"), Ordering::Greater);
        assert!(registry.comparator("missing").is_none());
    }
}
