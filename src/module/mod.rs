//! Module registry
//!
//! A module is a named unit that owns a set of transformers. Whether a module
//! is installed and whether it is enabled is decided here; the bridge only
//! asks.

use std::fmt;

use dashmap::DashMap;

/// A registered module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Module name as registered
    pub name: String,
    /// Whether the module currently serves requests
    pub enabled: bool,
}

impl Module {
    /// Create a module
    #[must_use]
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self {
            name: name.into(),
            enabled,
        }
    }

    /// Whether the module is enabled
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Lookup of installed modules
pub trait ModuleRegistry: Send + Sync {
    /// Find a module by name
    fn find(&self, name: &str) -> Option<Module>;

    /// All registered modules
    fn all(&self) -> Vec<Module>;
}

/// In-memory module registry.
///
/// Names are matched case-insensitively.
#[derive(Debug, Default)]
pub struct InMemoryModuleRegistry {
    modules: DashMap<String, Module>,
}

impl InMemoryModuleRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module, replacing any module with the same name
    pub fn register(&self, module: Module) {
        self.modules.insert(module.name.to_lowercase(), module);
    }

    /// Number of registered modules
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether no module is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleRegistry for InMemoryModuleRegistry {
    fn find(&self, name: &str) -> Option<Module> {
        self.modules
            .get(&name.to_lowercase())
            .map(|m| m.value().clone())
    }

    fn all(&self) -> Vec<Module> {
        let mut modules: Vec<Module> = self.modules.iter().map(|m| m.value().clone()).collect();
        modules.sort_by(|a, b| a.name.cmp(&b.name));
        modules
    }
}
