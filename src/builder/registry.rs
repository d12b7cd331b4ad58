//! Factories registered for foreign types.
//!
//! Types that do not implement a constructor themselves (often types from
//! other crates) can still be made by the builder once a factory is
//! registered for their exact type.

use crate::builder::component::Instance;
use crate::config::ConfigFiles;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// A registered factory.
pub type Factory = Arc<dyn Fn(&ConfigFiles) -> anyhow::Result<Instance> + Send + Sync>;

/// Factories keyed by the exact type they make.
#[derive(Default)]
pub struct FactoryRegistry {
    factories: Mutex<HashMap<TypeId, (&'static str, Factory)>>,
}

impl FactoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for slots of type `T`, replacing any previous one.
    pub fn register<T, F>(&self, factory: F)
    where
        T: Any,
        F: Fn(&ConfigFiles) -> anyhow::Result<Instance> + Send + Sync + 'static,
    {
        self.lock()
            .insert(TypeId::of::<T>(), (type_name::<T>(), Arc::new(factory)));
    }

    /// Register a factory returning `T` directly.
    pub fn register_typed<T, F>(&self, factory: F)
    where
        T: Any + Send,
        F: Fn(&ConfigFiles) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        self.register::<T, _>(move |files| factory(files).map(Instance::new));
    }

    pub fn get(&self, id: TypeId) -> Option<Factory> {
        self.lock().get(&id).map(|(_, factory)| factory.clone())
    }

    pub fn contains<T: Any>(&self) -> bool {
        self.lock().contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TypeId, (&'static str, Factory)>> {
        self.factories
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.lock().values().map(|(name, _)| *name).collect();
        names.sort_unstable();
        f.debug_struct("FactoryRegistry")
            .field("types", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Loader;
    use crate::environment::Environment;

    struct Client {
        url: String,
    }

    fn files() -> ConfigFiles {
        ConfigFiles::new(Vec::new(), Arc::new(Loader::local()), Environment::local())
    }

    #[test]
    fn registered_factory_is_found_by_type() {
        let registry = FactoryRegistry::new();
        registry.register_typed::<Client, _>(|_| {
            Ok(Client {
                url: "http://localhost".into(),
            })
        });

        assert!(registry.contains::<Client>());
        assert!(!registry.contains::<String>());

        let factory = registry.get(TypeId::of::<Client>()).unwrap();
        let client = factory(&files()).unwrap().downcast::<Client>().ok().unwrap();
        assert_eq!(client.url, "http://localhost");
    }

    #[test]
    fn registering_again_replaces() {
        let registry = FactoryRegistry::new();
        registry.register::<Client, _>(|_| Ok(Instance::new(1u8)));
        registry.register::<Client, _>(|_| Ok(Instance::new(2u8)));

        assert_eq!(registry.len(), 1);
        let factory = registry.get(TypeId::of::<Client>()).unwrap();
        assert_eq!(factory(&files()).unwrap().downcast::<u8>().ok(), Some(2));
    }

    #[test]
    fn concurrent_registration() {
        let registry = Arc::new(FactoryRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let registry = registry.clone();
                std::thread::spawn(move || match i % 2 {
                    0 => registry.register_typed::<Client, _>(|_| {
                        Ok(Client { url: String::new() })
                    }),
                    _ => registry.register_typed::<String, _>(|_| Ok(String::new())),
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(registry.len(), 2);
        assert!(format!("{:?}", registry).contains("Client"));
    }
}
