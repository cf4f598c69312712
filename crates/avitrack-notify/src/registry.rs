//! Adapter registry: maps adapter names to constructed adapter instances.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapters::{EmailAdapter, EmailSettings, LocalLogAdapter, PushAdapter, PushSettings};
use crate::error::{NotifyError, Result};
use crate::NotificationAdapter;

/// Holds the adapters configured for this deployment.
///
/// The local-log adapter is always registered, so [`default_adapter`]
/// can never come back empty.
///
/// [`default_adapter`]: AdapterRegistry::default_adapter
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn NotificationAdapter>>,
}

impl AdapterRegistry {
    /// Builds a registry from the optional per-channel settings.
    ///
    /// A channel with no settings is simply not registered; invalid
    /// settings for a configured channel are a hard error.
    pub fn from_settings(
        push: Option<&PushSettings>,
        email: Option<&EmailSettings>,
    ) -> Result<Self> {
        let mut registry = Self::new();
        if let Some(settings) = push {
            registry.register(Arc::new(PushAdapter::new(settings)?));
        }
        if let Some(settings) = email {
            registry.register(Arc::new(EmailAdapter::new(settings)?));
        }
        Ok(registry)
    }

    /// Empty registry with only the local-log fallback.
    pub fn new() -> Self {
        let mut adapters: HashMap<String, Arc<dyn NotificationAdapter>> = HashMap::new();
        let local = Arc::new(LocalLogAdapter);
        adapters.insert(local.adapter_name().to_string(), local);
        Self { adapters }
    }

    pub fn register(&mut self, adapter: Arc<dyn NotificationAdapter>) {
        self.adapters
            .insert(adapter.adapter_name().to_string(), adapter);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn NotificationAdapter>> {
        self.adapters
            .get(name)
            .cloned()
            .ok_or_else(|| NotifyError::UnknownAdapter(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.adapters.contains_key(name)
    }

    pub fn adapter_names(&self) -> Vec<&str> {
        self.adapters.keys().map(String::as_str).collect()
    }

    /// Preferred delivery channel: push when configured, otherwise the
    /// local-log fallback. Never fails.
    pub fn default_adapter(&self) -> Arc<dyn NotificationAdapter> {
        if let Some(push) = self.adapters.get("push") {
            return push.clone();
        }
        // "local" is registered unconditionally in new().
        self.adapters["local"].clone()
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
