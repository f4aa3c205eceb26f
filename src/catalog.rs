//! Startup wiring of modules, transformer types and datasets from configuration

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{Config, ModuleConfig};
use crate::module::{InMemoryModuleRegistry, Module};
use crate::render::DatasetStore;
use crate::resolver::{NameResolver, studly};
use crate::transformer::{MappedTransformerFactory, TypeRegistry};
use crate::{Error, Result};

/// Registries populated from configuration
pub struct Catalog {
    /// Installed modules
    pub modules: Arc<InMemoryModuleRegistry>,
    /// Registered types
    pub types: Arc<TypeRegistry>,
    /// Row collections served by the collection renderer
    pub datasets: Arc<DatasetStore>,
    /// Naming convention the types were registered with
    pub resolver: NameResolver,
}

impl Catalog {
    /// Build every registry from configuration.
    ///
    /// Types of disabled modules are registered too, so the bridge can tell
    /// a disabled module apart from an unknown one.
    ///
    /// # Errors
    ///
    /// Returns an error if two modules share a name (ignoring case) or a
    /// namespace, if two entries resolve to the same type name, or if a
    /// configured dataset cannot be loaded.
    pub fn from_config(config: &Config) -> Result<Self> {
        let resolver = NameResolver::new(config.resolver.clone());
        let modules = InMemoryModuleRegistry::new();
        let types = TypeRegistry::new();
        let datasets = DatasetStore::new();

        let mut module_configs: Vec<(&String, &ModuleConfig)> = config.modules.iter().collect();
        module_configs.sort_by(|a, b| a.0.cmp(b.0));
        check_module_names(module_configs.iter().map(|(name, _)| name.as_str()))?;

        for (module_name, module_config) in module_configs {
            modules.register(Module::new(module_name.clone(), module_config.enabled));

            let mut transformers: Vec<_> = module_config.transformers.iter().collect();
            transformers.sort_by(|a, b| a.0.cmp(b.0));

            for (transformer_name, transformer_config) in transformers {
                let type_name = resolver.type_name(module_name, transformer_name);
                ensure_unregistered(&types, &type_name)?;
                types.register_transformer(
                    type_name.clone(),
                    Arc::new(MappedTransformerFactory::from_config(transformer_config)),
                );

                if let Some(ref dataset) = transformer_config.dataset {
                    datasets.load_file(&type_name, Path::new(dataset))?;
                }

                debug!(module = %module_name, type_name = %type_name, "Registered transformer");
            }

            for class in &module_config.types {
                let type_name = resolver.qualify(module_name, class);
                ensure_unregistered(&types, &type_name)?;
                types.register_type(type_name);
            }
        }

        info!(
            modules = modules.len(),
            types = types.len(),
            datasets = datasets.len(),
            "Catalog loaded"
        );

        Ok(Self {
            modules: Arc::new(modules),
            types: Arc::new(types),
            datasets: Arc::new(datasets),
            resolver,
        })
    }
}

/// Module names must stay distinct both case-insensitively and once studly-cased
fn check_module_names<'a>(names: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut by_key: HashMap<String, &str> = HashMap::new();
    let mut by_namespace: HashMap<String, &str> = HashMap::new();

    for name in names {
        if let Some(other) = by_key.insert(name.to_lowercase(), name) {
            return Err(Error::Config(format!(
                "Modules `{other}` and `{name}` differ only by case"
            )));
        }
        if let Some(other) = by_namespace.insert(studly(name), name) {
            return Err(Error::Config(format!(
                "Modules `{other}` and `{name}` resolve to the same namespace"
            )));
        }
    }

    Ok(())
}

fn ensure_unregistered(types: &TypeRegistry, type_name: &str) -> Result<()> {
    if types.contains(type_name) {
        return Err(Error::Config(format!("Type {type_name} is declared more than once")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::module::ModuleRegistry;

    #[test]
    fn test_from_config_registers_everything() {
        let mut dataset = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(dataset, r#"[{{"id": 1}}, {{"id": 2}}]"#).unwrap();

        let yaml = format!(
            "
modules:
  my_blog:
    transformers:
      post_list:
        dataset: {}
    types: [PostPresenter]
  shop:
    enabled: false
    transformers:
      order: {{}}
",
            dataset.path().display()
        );
        let catalog = Catalog::from_config(&Config::from_yaml(&yaml).unwrap()).unwrap();

        assert!(catalog.modules.find("my_blog").unwrap().is_enabled());
        assert!(!catalog.modules.find("shop").unwrap().is_enabled());
        assert_eq!(
            catalog.types.transformer_names(),
            vec![
                "Modules.MyBlog.Transformers.PostListTransformer",
                "Modules.Shop.Transformers.OrderTransformer",
            ]
        );
        assert!(catalog.types.contains("Modules.MyBlog.Transformers.PostPresenter"));
        assert_eq!(
            catalog
                .datasets
                .get("Modules.MyBlog.Transformers.PostListTransformer")
                .len(),
            2
        );
    }

    #[test]
    fn test_missing_dataset_fails() {
        let config = Config::from_yaml(
            "
modules:
  blog:
    transformers:
      post:
        dataset: /nonexistent/posts.json
",
        )
        .unwrap();

        assert!(matches!(Catalog::from_config(&config), Err(Error::Config(_))));
    }

    fn config_error(yaml: &str) -> String {
        match Catalog::from_config(&Config::from_yaml(yaml).unwrap()) {
            Err(Error::Config(message)) => message,
            Err(e) => panic!("unexpected error: {e}"),
            Ok(_) => panic!("expected a configuration error"),
        }
    }

    #[test]
    fn test_type_declared_as_transformer_and_plain_type_rejected() {
        let message = config_error(
            "
modules:
  blog:
    transformers:
      post: {}
    types: [PostTransformer]
",
        );
        assert_eq!(
            message,
            "Type Modules.Blog.Transformers.PostTransformer is declared more than once"
        );
    }

    #[test]
    fn test_transformers_with_same_studly_name_rejected() {
        let message = config_error(
            "
modules:
  blog:
    transformers:
      post_list: {}
      post-list: {}
",
        );
        assert!(message.contains("PostListTransformer"));
    }

    #[test]
    fn test_modules_differing_by_case_rejected() {
        let message = config_error(
            "
modules:
  Blog: {}
  blog: {}
",
        );
        assert_eq!(message, "Modules `Blog` and `blog` differ only by case");
    }

    #[test]
    fn test_modules_sharing_namespace_rejected() {
        let message = config_error(
            "
modules:
  my-blog: {}
  my_blog: {}
",
        );
        assert_eq!(
            message,
            "Modules `my-blog` and `my_blog` resolve to the same namespace"
        );
    }
}
