//! Name-keyed store of workflow factories

use crate::error::EngineError;
use crate::workflow::definition::Workflow;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Builds a fresh, validated workflow
pub type WorkflowFactory = Arc<dyn Fn() -> Result<Workflow, EngineError> + Send + Sync>;

/// Registry of named workflow factories, safe to share between tasks
#[derive(Default)]
pub struct WorkflowRegistry {
    factories: DashMap<String, WorkflowFactory>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a workflow factory under a name that is not taken yet
    pub fn register<F>(&self, name: impl Into<String>, factory: F) -> Result<(), EngineError>
    where
        F: Fn() -> Result<Workflow, EngineError> + Send + Sync + 'static,
    {
        match self.factories.entry(name.into()) {
            Entry::Occupied(entry) => Err(EngineError::WorkflowAlreadyRegistered(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(Arc::new(factory));
                Ok(())
            }
        }
    }

    /// Register a workflow factory, replacing any previous one with the same name.
    ///
    /// Returns whether a factory was replaced.
    pub fn replace<F>(&self, name: impl Into<String>, factory: F) -> bool
    where
        F: Fn() -> Result<Workflow, EngineError> + Send + Sync + 'static,
    {
        let name = name.into();
        let replaced = self.factories.insert(name.clone(), Arc::new(factory)).is_some();
        if replaced {
            tracing::debug!(workflow = %name, "Replaced registered workflow");
        }
        replaced
    }

    /// Remove a workflow; returns whether it was registered
    pub fn unregister(&self, name: &str) -> bool {
        self.factories.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<WorkflowFactory> {
        self.factories.get(name).map(|entry| entry.value().clone())
    }

    /// Build a new instance of the named workflow
    pub fn create(&self, name: &str) -> Result<Workflow, EngineError> {
        let factory = self
            .get(name)
            .ok_or_else(|| EngineError::UnknownWorkflow(name.to_string()))?;
        factory()
    }

    /// Registered names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn exists(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn clear(&self) {
        self.factories.clear();
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
