//! Definition registry: stores and retrieves saga definitions
//!
//! Definitions are immutable once registered and are shared by every
//! instance started from them. Re-registering a name is an explicit
//! error rather than a silent overwrite. The map is read-mostly after
//! setup and safe for lookups concurrent with running sagas.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use saga_types::{SagaDefinition, SagaError, SagaResult};
use std::sync::Arc;

/// Registry of saga definitions, keyed by name
#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    definitions: DashMap<String, Arc<SagaDefinition>>,
}

impl DefinitionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            definitions: DashMap::new(),
        }
    }

    /// Register a saga definition under its name.
    ///
    /// Validates the definition before storing. Rejects a name that is
    /// already registered.
    pub fn register(&self, definition: SagaDefinition) -> SagaResult<()> {
        definition.validate()?;

        let name = definition.name.clone();
        match self.definitions.entry(name.clone()) {
            Entry::Occupied(_) => Err(SagaError::DuplicateDefinition(name)),
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(definition));
                tracing::info!(definition = %name, "Saga definition registered");
                Ok(())
            }
        }
    }

    /// Get a definition by name
    pub fn get(&self, name: &str) -> SagaResult<Arc<SagaDefinition>> {
        self.definitions
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SagaError::DefinitionNotFound(name.to_string()))
    }

    /// Check if a definition exists
    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Names of all registered definitions
    pub fn names(&self) -> Vec<String> {
        self.definitions
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Total number of registered definitions
    pub fn count(&self) -> usize {
        self.definitions.len()
    }

    /// Remove a definition
    pub fn remove(&self, name: &str) -> SagaResult<Arc<SagaDefinition>> {
        let (_, definition) = self
            .definitions
            .remove(name)
            .ok_or_else(|| SagaError::DefinitionNotFound(name.to_string()))?;

        tracing::info!(definition = %name, "Saga definition removed");
        Ok(definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use saga_types::FnStep;
    use serde_json::Value;

    fn make_valid_definition(name: &str) -> SagaDefinition {
        let mut def = SagaDefinition::new(name);
        def.add_step(Arc::new(FnStep::new("step-1", |_ctx| {
            async move { Ok(Value::Null) }.boxed()
        })))
        .unwrap();
        def
    }

    #[test]
    fn test_register_and_get() {
        let registry = DefinitionRegistry::new();
        registry
            .register(make_valid_definition("order-fulfillment"))
            .unwrap();

        let retrieved = registry.get("order-fulfillment").unwrap();
        assert_eq!(retrieved.name, "order-fulfillment");
        assert_eq!(registry.count(), 1);
        assert!(registry.contains("order-fulfillment"));
    }

    #[test]
    fn test_register_invalid() {
        let registry = DefinitionRegistry::new();
        let result = registry.register(SagaDefinition::new("empty"));
        assert!(matches!(result, Err(SagaError::EmptyDefinition(_))));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let registry = DefinitionRegistry::new();
        registry.register(make_valid_definition("review")).unwrap();

        let result = registry.register(make_valid_definition("review"));
        assert!(matches!(result, Err(SagaError::DuplicateDefinition(_))));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_get_returns_shared_definition() {
        let registry = DefinitionRegistry::new();
        registry.register(make_valid_definition("shared")).unwrap();

        let a = registry.get("shared").unwrap();
        let b = registry.get("shared").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_get_nonexistent() {
        let registry = DefinitionRegistry::new();
        let result = registry.get("nonexistent");
        assert!(matches!(result, Err(SagaError::DefinitionNotFound(_))));
    }

    #[test]
    fn test_names() {
        let registry = DefinitionRegistry::new();
        registry.register(make_valid_definition("a")).unwrap();
        registry.register(make_valid_definition("b")).unwrap();

        let mut names = registry.names();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_remove() {
        let registry = DefinitionRegistry::new();
        registry
            .register(make_valid_definition("remove-me"))
            .unwrap();

        let removed = registry.remove("remove-me").unwrap();
        assert_eq!(removed.name, "remove-me");
        assert!(!registry.contains("remove-me"));
        assert_eq!(registry.count(), 0);

        let result = registry.remove("remove-me");
        assert!(matches!(result, Err(SagaError::DefinitionNotFound(_))));
    }
}
