//! Transformer name resolution
//!
//! Maps a `(module, transformer)` pair of route parameters onto the
//! fully-qualified name a transformer is registered under:
//!
//! ```text
//! <namespace>.<Studly(module)>.<segment>.<Studly(transformer)><suffix>
//! ```
//!
//! With the default configuration `("my_blog", "post_list")` resolves to
//! `Modules.MyBlog.Transformers.PostListTransformer`. No validation happens
//! here; a malformed name simply fails the registry lookups later on.

use serde::{Deserialize, Serialize};

/// Naming convention used to build transformer type names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Root namespace every module lives under
    pub namespace: String,
    /// Namespace segment holding a module's transformers
    pub segment: String,
    /// Suffix appended to the transformer name
    pub suffix: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            namespace: "Modules".to_string(),
            segment: "Transformers".to_string(),
            suffix: "Transformer".to_string(),
        }
    }
}

/// Result of resolving the route parameters, fixed for the rest of the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Module name as given in the route
    pub module: String,
    /// Fully-qualified transformer type name
    pub type_name: String,
}

/// Builds fully-qualified transformer type names
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    config: ResolverConfig,
}

impl NameResolver {
    /// Create a resolver with the given naming convention
    #[must_use]
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    /// Resolve route parameters into a target
    #[must_use]
    pub fn resolve(&self, module: &str, transformer: &str) -> ResolvedTarget {
        ResolvedTarget {
            module: module.to_string(),
            type_name: self.type_name(module, transformer),
        }
    }

    /// Fully-qualified type name for a module/transformer pair
    #[must_use]
    pub fn type_name(&self, module: &str, transformer: &str) -> String {
        format!(
            "{}.{}.{}.{}",
            self.config.namespace,
            studly(module),
            self.config.segment,
            self.class_name(transformer)
        )
    }

    /// Short class name for a transformer (`post_list` -> `PostListTransformer`)
    #[must_use]
    pub fn class_name(&self, transformer: &str) -> String {
        format!("{}{}", studly(transformer), self.config.suffix)
    }

    /// Fully-qualified name for a class declared inside a module's transformer namespace
    #[must_use]
    pub fn qualify(&self, module: &str, class: &str) -> String {
        format!(
            "{}.{}.{}.{}",
            self.config.namespace,
            studly(module),
            self.config.segment,
            class
        )
    }
}

/// Convert a name to `StudlyCase`.
///
/// `-` and `_` act as word breaks, the first character of every word is
/// upper-cased and the rest is kept untouched, so `postList` stays `PostList`.
#[must_use]
pub fn studly(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut word_start = true;

    for c in value.chars() {
        if c == '-' || c == '_' || c.is_whitespace() {
            word_start = true;
            continue;
        }
        if word_start {
            out.extend(c.to_uppercase());
            word_start = false;
        } else {
            out.push(c);
        }
    }

    out
}
