use std::{
    any::{Any, TypeId},
    collections::HashMap,
    hash::{BuildHasherDefault, Hasher},
};

use anyhow::{Context as AnyContext, Result};

// A hasher for `TypeId`s that takes advantage of its known characteristics.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHasher(u64);

impl Hasher for NoOpHasher {
    // TypeId only ever calls write_u64
    fn write(&mut self, _bytes: &[u8]) {}

    fn write_u64(&mut self, i: u64) {
        self.0 = i;
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

// Type-indexed storage shared by command handlers and RPC methods
pub struct Context {
    values: HashMap<TypeId, Box<dyn Any + Send + Sync>, BuildHasherDefault<NoOpHasher>>,
}

impl Context {
    pub fn new() -> Self {
        Self {
            values: HashMap::default(),
        }
    }

    pub fn store<T: Send + Sync + 'static>(&mut self, data: T) {
        self.values.insert(TypeId::of::<T>(), Box::new(data));
    }

    pub fn remove<T: 'static>(&mut self) -> Option<T> {
        self.values
            .remove(&TypeId::of::<T>())
            .and_then(|b| b.downcast().ok())
            .map(|b| *b)
    }

    pub fn has<T: 'static>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<T>())
    }

    pub fn get_optional<T: 'static>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|b| b.downcast_ref())
    }

    pub fn get<T: 'static>(&self) -> Result<&T> {
        self.get_optional()
            .with_context(|| format!("{} not found in context", std::any::type_name::<T>()))
    }

    pub fn get_copy<T: 'static + Copy>(&self) -> Result<T> {
        self.get().copied()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_store_and_get() {
        let mut context = Context::new();
        context.store(42u64);
        context.store(Arc::new(String::from("lottery")));

        assert_eq!(context.get_copy::<u64>().unwrap(), 42);
        assert_eq!(context.get::<Arc<String>>().unwrap().as_str(), "lottery");
        assert!(context.get::<u32>().is_err());
    }

    #[test]
    fn test_remove_returns_value() {
        let mut context = Context::new();
        context.store(7u8);
        assert!(context.has::<u8>());
        assert_eq!(context.remove::<u8>(), Some(7));
        assert!(!context.has::<u8>());
        assert_eq!(context.remove::<u8>(), None);
    }
}
