use std::collections::BTreeMap;
use std::sync::Arc;
use crate::config::FixedSourceConfig;
use crate::error::{Error, Result};
use crate::price_infra::connectors::{FixedQuoteSource, SourceHandle};

pub type SourceConstructor = Arc<dyn Fn() -> Result<SourceHandle> + Send + Sync>;

/// Constructor map from source identifier to a factory for that source.
///
/// Assembled once at process start and handed to the filter; the filter only
/// instantiates sources that survive the blacklist.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    constructors: BTreeMap<String, SourceConstructor>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        SourceRegistry {
            constructors: BTreeMap::new(),
        }
    }

    /// Registry holding one `FixedQuoteSource` per configured table.
    pub fn with_fixed_sources(configs: &[FixedSourceConfig]) -> Result<Self> {
        let mut registry = SourceRegistry::new();
        for config in configs {
            registry.register_handle(Arc::new(FixedQuoteSource::new(&config.id, config.quote_table())))?;
        }
        Ok(registry)
    }

    pub fn register<F>(&mut self, source_id: impl Into<String>, constructor: F) -> Result<&mut Self>
    where
        F: Fn() -> Result<SourceHandle> + Send + Sync + 'static,
    {
        let source_id = source_id.into();
        if self.constructors.contains_key(&source_id) {
            return Err(Error::DuplicateSource(source_id));
        }

        tracing::debug!("Registered source: {}", source_id);
        self.constructors.insert(source_id, Arc::new(constructor));
        Ok(self)
    }

    /// Registers an already built handle; every instantiation shares it.
    pub fn register_handle(&mut self, handle: SourceHandle) -> Result<&mut Self> {
        let source_id = handle.source_id().to_string();
        self.register(source_id, move || Ok(handle.clone()))
    }

    pub fn instantiate(&self, source_id: &str) -> Result<SourceHandle> {
        let constructor = self.constructors
            .get(source_id)
            .ok_or_else(|| Error::UnknownSource(source_id.to_string()))?;
        constructor()
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.constructors.contains_key(source_id)
    }

    /// Registered identifiers in lexical order.
    pub fn source_ids(&self) -> Vec<String> {
        self.constructors.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}
