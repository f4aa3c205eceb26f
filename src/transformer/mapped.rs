//! Declarative transformers defined in configuration
//!
//! A mapped transformer keeps a subset of a row's fields (in the configured
//! order) and renames some of them. Rows that are not JSON objects pass
//! through untouched.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::{Authorizer, Transformer, TransformerFactory};
use crate::config::{AuthorizeConfig, TransformerConfig};
use crate::request::RequestContext;

/// Field-selecting, field-renaming transformer
#[derive(Debug, Clone, Default)]
pub struct MappedTransformer {
    fields: Vec<String>,
    rename: HashMap<String, String>,
}

impl MappedTransformer {
    /// Create a transformer from a field list and rename map
    #[must_use]
    pub fn new(fields: Vec<String>, rename: HashMap<String, String>) -> Self {
        Self { fields, rename }
    }

    fn output_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.rename.get(key).map_or(key, String::as_str)
    }
}

impl Transformer for MappedTransformer {
    fn transform(&self, row: &Value) -> Value {
        let Value::Object(source) = row else {
            return row.clone();
        };

        let mut out = Map::new();
        if self.fields.is_empty() {
            for (key, value) in source {
                out.insert(self.output_key(key).to_string(), value.clone());
            }
        } else {
            for field in &self.fields {
                let value = source.get(field).cloned().unwrap_or(Value::Null);
                out.insert(self.output_key(field).to_string(), value);
            }
        }

        Value::Object(out)
    }
}

/// Grants access when a request header carries an allowed value
#[derive(Debug, Clone)]
pub struct HeaderAuthorizer {
    value: Option<String>,
    allow: Vec<String>,
}

impl HeaderAuthorizer {
    /// Capture the configured header from the request
    #[must_use]
    pub fn from_request(rule: &AuthorizeConfig, request: &RequestContext) -> Self {
        Self {
            value: request.header(&rule.header).map(str::to_string),
            allow: rule.allow.clone(),
        }
    }
}

impl Authorizer for HeaderAuthorizer {
    fn authorize(&self) -> bool {
        match &self.value {
            Some(value) => self.allow.is_empty() || self.allow.iter().any(|a| a == value),
            None => false,
        }
    }
}

/// Factory for transformers declared in a module's configuration
#[derive(Debug, Clone)]
pub struct MappedTransformerFactory {
    transformer: MappedTransformer,
    authorize: Option<AuthorizeConfig>,
}

impl MappedTransformerFactory {
    /// Create a factory from a transformer definition
    #[must_use]
    pub fn from_config(config: &TransformerConfig) -> Self {
        Self {
            transformer: MappedTransformer::new(config.fields.clone(), config.rename.clone()),
            authorize: config.authorize.clone(),
        }
    }
}

impl TransformerFactory for MappedTransformerFactory {
    fn build(&self, _request: &RequestContext) -> Box<dyn Transformer> {
        Box::new(self.transformer.clone())
    }

    fn authorizer(&self, request: &RequestContext) -> Option<Box<dyn Authorizer>> {
        self.authorize.as_ref().map(|rule| {
            Box::new(HeaderAuthorizer::from_request(rule, request)) as Box<dyn Authorizer>
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue};
    use serde_json::json;

    fn rule(allow: &[&str]) -> AuthorizeConfig {
        AuthorizeConfig {
            header: "x-role".to_string(),
            allow: allow.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn request_with_role(role: Option<&'static str>) -> RequestContext {
        let mut headers = HeaderMap::new();
        if let Some(role) = role {
            headers.insert("x-role", HeaderValue::from_static(role));
        }
        RequestContext::new("blog", "post").with_headers(headers)
    }

    #[test]
    fn test_keeps_all_fields_when_unconfigured() {
        let t = MappedTransformer::default();
        let row = json!({"id": 1, "title": "Hello"});
        assert_eq!(t.transform(&row), row);
    }

    #[test]
    fn test_selects_and_renames() {
        let mut rename = HashMap::new();
        rename.insert("title".to_string(), "headline".to_string());
        let t = MappedTransformer::new(
            vec!["id".to_string(), "title".to_string(), "missing".to_string()],
            rename,
        );

        let out = t.transform(&json!({"id": 1, "title": "Hello", "body": "secret"}));
        assert_eq!(out, json!({"id": 1, "headline": "Hello", "missing": null}));
    }

    #[test]
    fn test_non_object_rows_pass_through() {
        let t = MappedTransformer::new(vec!["id".to_string()], HashMap::new());
        assert_eq!(t.transform(&json!([1, 2])), json!([1, 2]));
        assert_eq!(t.transform(&json!("x")), json!("x"));
    }

    #[test]
    fn test_header_authorizer() {
        let check = |rule: &AuthorizeConfig, role| {
            HeaderAuthorizer::from_request(rule, &request_with_role(role)).authorize()
        };

        let admin_only = rule(&["admin"]);
        assert!(check(&admin_only, Some("admin")));
        assert!(!check(&admin_only, Some("guest")));
        assert!(!check(&admin_only, None));

        let any_role = rule(&[]);
        assert!(check(&any_role, Some("guest")));
        assert!(!check(&any_role, None));
    }

    #[test]
    fn test_factory_authorizer_is_optional() {
        let request = request_with_role(None);

        let open = MappedTransformerFactory::from_config(&TransformerConfig::default());
        assert!(open.authorizer(&request).is_none());

        let guarded = MappedTransformerFactory::from_config(&TransformerConfig {
            authorize: Some(rule(&["admin"])),
            ..TransformerConfig::default()
        });
        assert!(!guarded.authorizer(&request).unwrap().authorize());
    }
}
