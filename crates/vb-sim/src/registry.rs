//! Static registry of simulator backends and variable extractors.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::backend::{SimulatorBackend, VariableExtractor};
use crate::error::{SimError, SimResult};
use crate::task::ModelLanguage;

/// Backends by name, extractors by model language.
///
/// Populated once at startup; lookups hand out shared handles.
#[derive(Default, Clone)]
pub struct BackendRegistry {
    backends: BTreeMap<String, Arc<dyn SimulatorBackend>>,
    extractors: BTreeMap<ModelLanguage, Arc<dyn VariableExtractor>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `backend` under its own name, replacing any previous entry.
    pub fn register<B>(&mut self, backend: B) -> &mut Self
    where
        B: SimulatorBackend + 'static,
    {
        let name = backend.name().to_string();
        debug!(backend = %name, "registering simulator backend");
        self.backends.insert(name, Arc::new(backend));
        self
    }

    pub fn register_extractor<E>(&mut self, language: ModelLanguage, extractor: E) -> &mut Self
    where
        E: VariableExtractor + 'static,
    {
        debug!(%language, "registering variable extractor");
        self.extractors.insert(language, Arc::new(extractor));
        self
    }

    pub fn get(&self, name: &str) -> SimResult<Arc<dyn SimulatorBackend>> {
        self.backends
            .get(name)
            .cloned()
            .ok_or_else(|| SimError::UnknownSimulator {
                name: name.to_string(),
                available: self.names(),
            })
    }

    pub fn extractor(&self, language: ModelLanguage) -> SimResult<Arc<dyn VariableExtractor>> {
        self.extractors
            .get(&language)
            .cloned()
            .ok_or(SimError::NoExtractor { language })
    }

    /// Registered backend names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.backends.keys().cloned().collect()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry")
            .field("backends", &self.names())
            .field("extractors", &self.extractors.keys().collect::<Vec<_>>())
            .finish()
    }
}
