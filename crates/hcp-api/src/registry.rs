//! Version registry.
//!
//! Versions are registered into a [`RegistryBuilder`] during start-up and
//! frozen into an immutable [`VersionRegistry`]. The frozen registry can be
//! shared by value or published once as the process-wide snapshot.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::error::{ApiError, Result};
use crate::version::Version;

/// Collects versions before the registry is frozen.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    versions: HashMap<&'static str, Arc<dyn Version>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a version under its name. A later registration with the same
    /// name replaces the earlier one.
    pub fn register<V: Version + 'static>(&mut self, version: V) -> &mut Self {
        let name = version.name();
        if self.versions.insert(name, Arc::new(version)).is_some() {
            tracing::debug!(api_version = name, "replacing registered API version");
        }
        self
    }

    pub fn build(self) -> VersionRegistry {
        VersionRegistry {
            versions: Arc::new(self.versions),
        }
    }
}

/// Immutable set of supported versions keyed by name.
#[derive(Debug, Clone)]
pub struct VersionRegistry {
    versions: Arc<HashMap<&'static str, Arc<dyn Version>>>,
}

impl VersionRegistry {
    /// Resolves a version by its exact name. `None` means the version is
    /// not supported; no default is substituted.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Version>> {
        self.versions.get(name).cloned()
    }

    /// Registered version names in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.versions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Narrows the registry to the named versions.
    ///
    /// Fails when a name is not registered.
    pub fn restrict_to<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let mut versions = HashMap::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let (key, version) = self
                .versions
                .get_key_value(name)
                .ok_or_else(|| ApiError::unknown_version(name))?;
            versions.insert(*key, Arc::clone(version));
        }
        Ok(Self {
            versions: Arc::new(versions),
        })
    }
}

static REGISTRY: OnceLock<VersionRegistry> = OnceLock::new();

/// Publishes the process-wide registry. Only the first call succeeds.
pub fn publish(registry: VersionRegistry) -> Result<&'static VersionRegistry> {
    let names = registry.names();
    REGISTRY
        .set(registry)
        .map_err(|_| ApiError::AlreadyPublished)?;
    tracing::info!(versions = ?names, "published API version registry");
    REGISTRY.get().ok_or(ApiError::NotPublished)
}

/// The process-wide registry, if published.
pub fn global() -> Option<&'static VersionRegistry> {
    REGISTRY.get()
}

/// Resolves a version in the process-wide registry.
pub fn lookup(name: &str) -> Option<Arc<dyn Version>> {
    global().and_then(|registry| registry.lookup(name))
}
