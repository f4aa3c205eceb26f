//! Configuration management

use std::{collections::HashMap, env, path::Path, time::Duration};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::resolver::ResolverConfig;
use crate::{Error, Result};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "DATATABLES_BRIDGE_";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Environment files to load before processing config.
    /// Paths support ~ expansion. Loaded in order, later files override earlier.
    pub env_files: Vec<String>,
    /// Server configuration
    pub server: ServerConfig,
    /// Transformer naming convention
    pub resolver: ResolverConfig,
    /// Installed modules by name
    pub modules: HashMap<String, ModuleConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Graceful shutdown timeout
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 39500,
            request_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

/// A module and the transformers it ships
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    /// Whether the module serves requests
    pub enabled: bool,
    /// Transformers by short name (`post` for `PostTransformer`)
    pub transformers: HashMap<String, TransformerConfig>,
    /// Class names in the module's transformer namespace that are not transformers
    pub types: Vec<String>,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            transformers: HashMap::new(),
            types: Vec::new(),
        }
    }
}

/// Declarative transformer definition
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Fields to keep, in output order (empty = keep all)
    pub fields: Vec<String>,
    /// Output field renames (`source: target`)
    pub rename: HashMap<String, String>,
    /// Optional authorization rule
    pub authorize: Option<AuthorizeConfig>,
    /// JSON or YAML file holding the rows served for this transformer
    pub dataset: Option<String>,
}

/// Header-based authorization rule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizeConfig {
    /// Request header to inspect
    pub header: String,
    /// Accepted values (empty = header presence is enough)
    #[serde(default)]
    pub allow: Vec<String>,
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.load_env_files();
        config.expand_env_vars()?;

        Ok(config)
    }

    /// Parse configuration from a YAML string, without consulting the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be parsed.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut config: Self = Figment::new()
            .merge(Yaml::string(yaml))
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        config.expand_env_vars()?;
        Ok(config)
    }

    /// Load environment files into the process environment.
    /// Supports ~ expansion. Files that don't exist are silently skipped.
    fn load_env_files(&self) {
        for path_str in &self.env_files {
            let expanded = expand_home(path_str);
            let path = Path::new(&expanded);
            if path.exists() {
                match dotenvy::from_path(path) {
                    Ok(()) => tracing::info!("Loaded env file: {expanded}"),
                    Err(e) => tracing::warn!("Failed to load env file {expanded}: {e}"),
                }
            } else {
                tracing::debug!("Env file not found (skipped): {expanded}");
            }
        }
    }

    /// Expand ${VAR} and ${VAR:-default} patterns in dataset paths
    fn expand_env_vars(&mut self) -> Result<()> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
            .map_err(|e| Error::Internal(e.to_string()))?;

        for module in self.modules.values_mut() {
            for transformer in module.transformers.values_mut() {
                if let Some(dataset) = transformer.dataset.as_mut() {
                    *dataset = expand_home(&expand_string(&re, dataset));
                }
            }
        }

        Ok(())
    }
}

/// Expand environment variables in a string
fn expand_string(re: &Regex, value: &str) -> String {
    re.replace_all(value, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map_or("", |m| m.as_str());
        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .into_owned()
}

/// Expand a leading `~` to the home directory
fn expand_home(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.display().to_string(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 39500);
        assert_eq!(config.server.request_timeout, Duration::from_secs(30));
        assert_eq!(config.resolver.namespace, "Modules");
        assert!(config.modules.is_empty());
    }

    #[test]
    fn test_from_yaml_modules() {
        let config = Config::from_yaml(
            r"
server:
  port: 8080
  request_timeout: 5s
modules:
  blog:
    transformers:
      post:
        fields: [id, title]
        rename:
          title: headline
        authorize:
          header: x-role
          allow: [admin]
    types: [PostPresenter]
  shop:
    enabled: false
",
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout, Duration::from_secs(5));

        let blog = &config.modules["blog"];
        assert!(blog.enabled);
        assert_eq!(blog.types, vec!["PostPresenter"]);
        let post = &blog.transformers["post"];
        assert_eq!(post.fields, vec!["id", "title"]);
        assert_eq!(post.rename["title"], "headline");
        let auth = post.authorize.as_ref().unwrap();
        assert_eq!(auth.header, "x-role");
        assert_eq!(auth.allow, vec!["admin"]);

        assert!(!config.modules["shop"].enabled);
    }

    #[test]
    fn test_expand_string_default() {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}").unwrap();
        assert_eq!(
            expand_string(&re, "${DATATABLES_BRIDGE_TEST_UNSET_DIR:-/srv/data}/posts.json"),
            "/srv/data/posts.json"
        );
        assert_eq!(expand_string(&re, "plain.json"), "plain.json");
    }

    #[test]
    fn test_dataset_path_expanded() {
        let config = Config::from_yaml(
            r"
modules:
  blog:
    transformers:
      post:
        dataset: ${DATATABLES_BRIDGE_TEST_UNSET_ROOT:-data}/posts.json
",
        )
        .unwrap();

        assert_eq!(
            config.modules["blog"].transformers["post"].dataset.as_deref(),
            Some("data/posts.json")
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/bridge.yaml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
