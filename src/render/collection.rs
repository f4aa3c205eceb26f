//! In-memory collection renderer
//!
//! Serves rows loaded at startup in the DataTables server-side format:
//!
//! ```json
//! { "draw": 1, "recordsTotal": 57, "recordsFiltered": 57, "data": [ ... ] }
//! ```
//!
//! Paging follows the `start`/`length` request parameters (`length = -1`
//! or no `length` returns every row) and `draw` is echoed back. Searching
//! and ordering are left to a richer renderer.

use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{Value, json};
use tracing::debug;

use super::{RendererFactory, TableRenderer};
use crate::request::RequestContext;
use crate::resolver::ResolvedTarget;
use crate::transformer::Transformer;
use crate::{Error, Result};

/// Row collections keyed by fully-qualified transformer type name
#[derive(Debug, Default)]
pub struct DatasetStore {
    datasets: DashMap<String, Arc<Vec<Value>>>,
}

impl DatasetStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store rows for a type
    pub fn insert(&self, type_name: impl Into<String>, rows: Vec<Value>) {
        self.datasets.insert(type_name.into(), Arc::new(rows));
    }

    /// Load rows for a type from a JSON or YAML file holding an array
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not an array of rows.
    pub fn load_file(&self, type_name: &str, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read dataset {}: {e}", path.display()))
        })?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        let rows: Vec<Value> = if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse dataset {}: {e}", path.display()))
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse dataset {}: {e}", path.display()))
            })?
        };

        let count = rows.len();
        debug!(type_name = %type_name, path = %path.display(), rows = count, "Loaded dataset");
        self.insert(type_name, rows);
        Ok(count)
    }

    /// Rows for a type (empty when none were loaded)
    #[must_use]
    pub fn get(&self, type_name: &str) -> Arc<Vec<Value>> {
        self.datasets
            .get(type_name)
            .map_or_else(|| Arc::new(Vec::new()), |rows| Arc::clone(rows.value()))
    }

    /// Number of types with a dataset
    #[must_use]
    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    /// Whether no dataset was loaded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

/// DataTables server-side request parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataTablesParams {
    /// Draw counter echoed back to the client
    pub draw: u64,
    /// Index of the first row
    pub start: usize,
    /// Page size (`None` = all rows)
    pub length: Option<usize>,
}

impl DataTablesParams {
    /// Read paging parameters from the request, ignoring malformed values
    #[must_use]
    pub fn from_request(request: &RequestContext) -> Self {
        let draw = request
            .param("draw")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        let start = request
            .param("start")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        let length = request
            .param("length")
            .and_then(|v| v.trim().parse::<i64>().ok())
            .and_then(|l| usize::try_from(l).ok());

        Self { draw, start, length }
    }
}

/// Renders a page of an in-memory row collection
pub struct CollectionRenderer {
    rows: Arc<Vec<Value>>,
    params: DataTablesParams,
    transformer: Option<Box<dyn Transformer>>,
}

impl CollectionRenderer {
    /// Create a renderer over a collection
    #[must_use]
    pub fn new(rows: Arc<Vec<Value>>, params: DataTablesParams) -> Self {
        Self {
            rows,
            params,
            transformer: None,
        }
    }
}

impl TableRenderer for CollectionRenderer {
    fn set_transformer(
        mut self: Box<Self>,
        transformer: Box<dyn Transformer>,
    ) -> Box<dyn TableRenderer> {
        self.transformer = Some(transformer);
        self
    }

    fn to_json(&self) -> Result<Value> {
        let total = self.rows.len();
        let page = self
            .rows
            .iter()
            .skip(self.params.start)
            .take(self.params.length.unwrap_or(usize::MAX));

        let data: Vec<Value> = match &self.transformer {
            Some(transformer) => page.map(|row| transformer.transform(row)).collect(),
            None => page.cloned().collect(),
        };

        Ok(json!({
            "draw": self.params.draw,
            "recordsTotal": total,
            "recordsFiltered": total,
            "data": data
        }))
    }
}

/// Hands out [`CollectionRenderer`]s backed by a [`DatasetStore`]
pub struct CollectionRendererFactory {
    datasets: Arc<DatasetStore>,
}

impl CollectionRendererFactory {
    /// Create a factory over a dataset store
    #[must_use]
    pub fn new(datasets: Arc<DatasetStore>) -> Self {
        Self { datasets }
    }
}

impl RendererFactory for CollectionRendererFactory {
    fn renderer(
        &self,
        target: &ResolvedTarget,
        request: &RequestContext,
    ) -> Box<dyn TableRenderer> {
        Box::new(CollectionRenderer::new(
            self.datasets.get(&target.type_name),
            DataTablesParams::from_request(request),
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    struct IdOnly;

    impl Transformer for IdOnly {
        fn transform(&self, row: &Value) -> Value {
            json!({ "id": row["id"] })
        }
    }

    fn rows(n: usize) -> Arc<Vec<Value>> {
        Arc::new(
            (1..=n)
                .map(|i| json!({"id": i, "title": format!("Post {i}")}))
                .collect(),
        )
    }

    fn request(params: &[(&str, &str)]) -> RequestContext {
        let params: HashMap<String, String> = params
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RequestContext::new("blog", "post").with_params(params)
    }

    #[test]
    fn test_params_parsing() {
        let p = DataTablesParams::from_request(&request(&[
            ("draw", "4"),
            ("start", "20"),
            ("length", "10"),
        ]));
        assert_eq!(
            p,
            DataTablesParams {
                draw: 4,
                start: 20,
                length: Some(10)
            }
        );

        let p = DataTablesParams::from_request(&request(&[("length", "-1")]));
        assert_eq!(p.length, None);

        let p = DataTablesParams::from_request(&request(&[("draw", "abc"), ("start", "-3")]));
        assert_eq!(p, DataTablesParams::default());
    }

    #[test]
    fn test_renders_page_with_transformer() {
        let renderer: Box<dyn TableRenderer> = Box::new(CollectionRenderer::new(
            rows(5),
            DataTablesParams {
                draw: 2,
                start: 1,
                length: Some(2),
            },
        ));

        let body = renderer.set_transformer(Box::new(IdOnly)).to_json().unwrap();
        assert_eq!(
            body,
            json!({
                "draw": 2,
                "recordsTotal": 5,
                "recordsFiltered": 5,
                "data": [{"id": 2}, {"id": 3}]
            })
        );
    }

    #[test]
    fn test_renders_raw_rows_without_transformer() {
        let renderer = CollectionRenderer::new(rows(2), DataTablesParams::default());
        let body = renderer.to_json().unwrap();
        assert_eq!(body["data"][1]["title"], "Post 2");
    }

    #[test]
    fn test_start_past_end_is_empty() {
        let renderer = CollectionRenderer::new(
            rows(3),
            DataTablesParams {
                draw: 1,
                start: 10,
                length: Some(5),
            },
        );
        let body = renderer.to_json().unwrap();
        assert_eq!(body["data"], json!([]));
        assert_eq!(body["recordsTotal"], 3);
    }

    #[test]
    fn test_store_load_json_and_yaml() {
        let store = DatasetStore::new();

        let mut json_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(json_file, r#"[{{"id": 1}}, {{"id": 2}}]"#).unwrap();
        assert_eq!(store.load_file("A", json_file.path()).unwrap(), 2);

        let mut yaml_file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml_file, "- id: 7\n  title: Seven").unwrap();
        assert_eq!(store.load_file("B", yaml_file.path()).unwrap(), 1);

        assert_eq!(store.get("B")[0]["title"], "Seven");
        assert!(store.get("C").is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_store_rejects_non_array() {
        let store = DatasetStore::new();
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"id": 1}}"#).unwrap();

        let err = store.load_file("A", file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
