//! OpenAPI document loading: operations, response schemas, self-validation
//!
//! The document is parsed once, every response schema is compiled up front,
//! and the result is shared read-only for the rest of the process.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use ridecheck_core::Endpoint;

/// Bundled carpooling API document.
const BUNDLED_SPEC: &str = include_str!("../openapi/carpool.yaml");

/// Depth limit for `$ref` resolution (guards circular references).
const MAX_REF_DEPTH: u32 = 32;

#[derive(Debug, thiserror::Error)]
pub enum SpecError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid OpenAPI document: {0}")]
    Invalid(String),
    #[error("Invalid schema for {operation} {status}: {message}")]
    Schema {
        operation: String,
        status: String,
        message: String,
    },
}

/// A response declaration of one operation for one status key.
pub(crate) struct ResponseSpec {
    /// Declared media types, e.g. `application/json`
    pub(crate) content_types: Vec<String>,
    /// Compiled body schema (JSON media type only)
    pub(crate) body: Option<jsonschema::Validator>,
    pub(crate) headers: Vec<HeaderSpec>,
}

pub(crate) struct HeaderSpec {
    pub(crate) name: String,
    pub(crate) required: bool,
    /// JSON type of the header value (`integer`, `number`, `boolean`, `string`)
    pub(crate) value_type: Option<String>,
    pub(crate) schema: Option<jsonschema::Validator>,
}

/// One method + path template of the document.
pub struct Operation {
    method: String,
    path: String,
    segments: Vec<Segment>,
    responses: HashMap<u16, ResponseSpec>,
    /// `2XX`-style keys, indexed by the leading digit
    ranges: HashMap<u16, ResponseSpec>,
    default_response: Option<ResponseSpec>,
}

#[derive(Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

impl Operation {
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Operation label: "GET /bookings/{bookingId}"
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }

    /// Whether a concrete request path matches this operation's template.
    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        let parts: Vec<&str> = split_path(path);
        parts.len() == self.segments.len()
            && parts.iter().zip(&self.segments).all(|(part, seg)| match seg {
                Segment::Literal(lit) => part == lit,
                Segment::Param => !part.is_empty(),
            })
    }

    /// Response declaration for a status: exact code, then `NXX` range, then `default`.
    pub(crate) fn response_for(&self, status: u16) -> Option<&ResponseSpec> {
        self.responses
            .get(&status)
            .or_else(|| self.ranges.get(&(status / 100)))
            .or(self.default_response.as_ref())
    }

    /// Status keys declared for this operation, sorted.
    #[must_use]
    pub fn declared_statuses(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .responses
            .keys()
            .map(u16::to_string)
            .chain(self.ranges.keys().map(|d| format!("{d}XX")))
            .collect();
        keys.sort();
        if self.default_response.is_some() {
            keys.push("default".into());
        }
        keys
    }
}

/// A loaded, self-validated OpenAPI 3.x document.
pub struct SpecDocument {
    version: String,
    servers: Vec<String>,
    operations: Vec<Operation>,
}

impl std::fmt::Debug for SpecDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpecDocument")
            .field("version", &self.version)
            .field("servers", &self.servers)
            .field("operations", &self.operations.len())
            .finish()
    }
}

impl SpecDocument {
    /// The bundled carpooling document, loaded on first use.
    ///
    /// # Panics
    ///
    /// Panics if the bundled document does not load: that is a packaging
    /// defect, never a test failure.
    #[must_use]
    pub fn bundled() -> Arc<Self> {
        static BUNDLED: OnceLock<Arc<SpecDocument>> = OnceLock::new();
        Arc::clone(BUNDLED.get_or_init(|| {
            match Self::parse(Some(Path::new("carpool.yaml")), BUNDLED_SPEC) {
                Ok(doc) => Arc::new(doc),
                Err(e) => panic!("bundled OpenAPI document is broken: {e}"),
            }
        }))
    }

    /// Load a document from disk and check it covers every [`Endpoint`].
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, SpecError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| SpecError::Io(format!("{}: {e}", path.display())))?;
        Self::parse(Some(path), &content)
    }

    /// Parse JSON or YAML content and check it covers every [`Endpoint`].
    ///
    /// # Errors
    ///
    /// Returns error if the content cannot be parsed or validated.
    pub fn parse(path: Option<&Path>, content: &str) -> Result<Self, SpecError> {
        let value = parse_document(path, content)?;
        let doc = Self::from_value(&value)?;
        doc.check_coverage(&Endpoint::ALL)?;
        tracing::info!(
            version = %doc.version,
            operations = doc.operations.len(),
            "loaded OpenAPI document"
        );
        Ok(doc)
    }

    /// Build from an already-parsed document. Checks structure and compiles
    /// every response schema, but does not require any particular endpoint.
    ///
    /// # Errors
    ///
    /// Returns error if the document is not OpenAPI 3.x or a schema does not compile.
    pub fn from_value(doc: &serde_json::Value) -> Result<Self, SpecError> {
        let version = doc
            .get("openapi")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SpecError::Invalid("missing \"openapi\" version field".into()))?;
        if !version.starts_with("3.") {
            return Err(SpecError::Invalid(format!(
                "unsupported OpenAPI version {version}, expected 3.x"
            )));
        }

        let servers = doc
            .get("servers")
            .and_then(|s| s.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|s| s.get("url").and_then(|u| u.as_str()))
                    .map(|u| u.trim_end_matches('/').to_string())
                    .collect()
            })
            .unwrap_or_default();

        let paths = doc
            .get("paths")
            .and_then(|p| p.as_object())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| SpecError::Invalid("\"paths\" is missing or empty".into()))?;

        let mut operations = Vec::new();
        for (path, path_item) in paths {
            let path_item = resolve(path_item, doc, 0);
            for method in [
                "get", "put", "post", "delete", "options", "head", "patch", "trace",
            ] {
                if let Some(operation) = path_item.get(method) {
                    operations.push(extract_operation(doc, method, path, operation)?);
                }
            }
        }

        Ok(Self {
            version: version.to_string(),
            servers,
            operations,
        })
    }

    /// Every endpoint must map to exactly one operation of the document.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::Invalid`] naming the first uncovered endpoint.
    pub fn check_coverage(&self, endpoints: &[Endpoint]) -> Result<(), SpecError> {
        for endpoint in endpoints {
            let sample = if endpoint.has_path_param {
                format!("{}/sample-id", endpoint.path)
            } else {
                endpoint.path.to_string()
            };
            if self.find_operation(endpoint.method, &sample).is_none() {
                return Err(SpecError::Invalid(format!(
                    "no operation for endpoint {endpoint}"
                )));
            }
        }
        Ok(())
    }

    /// Operation whose template matches `method` + concrete `path`.
    #[must_use]
    pub fn find_operation(&self, method: &str, path: &str) -> Option<&Operation> {
        self.operations
            .iter()
            .find(|op| op.method.eq_ignore_ascii_case(method) && op.matches_path(path))
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Server URLs declared by the document, without trailing slash.
    #[must_use]
    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    #[must_use]
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }
}

/// Parse an OpenAPI document from JSON or YAML.
///
/// Detection strategy: try extension first (`.yaml`/`.yml`), then fall back to
/// content sniffing (leading `{` → JSON, otherwise YAML).
fn parse_document(path: Option<&Path>, content: &str) -> Result<serde_json::Value, SpecError> {
    let ext = path
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "yaml" | "yml" => serde_yml::from_str(content)
            .map_err(|e| SpecError::Parse(format!("Invalid YAML: {e}"))),
        "json" => serde_json::from_str(content)
            .map_err(|e| SpecError::Parse(format!("Invalid JSON: {e}"))),
        _ => {
            if content.trim_start().starts_with('{') {
                serde_json::from_str(content)
                    .map_err(|e| SpecError::Parse(format!("Invalid JSON: {e}")))
            } else {
                serde_yml::from_str(content)
                    .map_err(|e| SpecError::Parse(format!("Invalid YAML: {e}")))
            }
        }
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.trim_matches('/').split('/').collect()
}

fn extract_operation(
    doc: &serde_json::Value,
    method: &str,
    path: &str,
    operation: &serde_json::Value,
) -> Result<Operation, SpecError> {
    let label = format!("{} {path}", method.to_uppercase());
    let segments = split_path(path)
        .into_iter()
        .map(|s| {
            if s.starts_with('{') && s.ends_with('}') {
                Segment::Param
            } else {
                Segment::Literal(s.to_string())
            }
        })
        .collect();

    let mut responses = HashMap::new();
    let mut ranges = HashMap::new();
    let mut default_response = None;

    if let Some(declared) = operation.get("responses").and_then(|r| r.as_object()) {
        for (key, response) in declared {
            let response = resolve(response, doc, 0);
            let spec = extract_response(doc, &label, key, &response)?;
            if key == "default" {
                default_response = Some(spec);
            } else if let Ok(code) = key.parse::<u16>() {
                responses.insert(code, spec);
            } else if let Some(class) = parse_range(key) {
                ranges.insert(class, spec);
            } else {
                return Err(SpecError::Invalid(format!(
                    "{label}: unknown response key \"{key}\""
                )));
            }
        }
    }

    if responses.is_empty() && ranges.is_empty() && default_response.is_none() {
        return Err(SpecError::Invalid(format!("{label}: no responses declared")));
    }

    Ok(Operation {
        method: method.to_uppercase(),
        path: path.to_string(),
        segments,
        responses,
        ranges,
        default_response,
    })
}

/// `"2XX"` → 2
fn parse_range(key: &str) -> Option<u16> {
    let bytes = key.as_bytes();
    if bytes.len() == 3 && bytes[1..].eq_ignore_ascii_case(b"XX") && (b'1'..=b'5').contains(&bytes[0])
    {
        Some(u16::from(bytes[0] - b'0'))
    } else {
        None
    }
}

fn extract_response(
    doc: &serde_json::Value,
    label: &str,
    key: &str,
    response: &serde_json::Value,
) -> Result<ResponseSpec, SpecError> {
    let compile = |schema: &serde_json::Value| {
        let schema = to_json_schema(schema, doc, 0);
        jsonschema::draft4::new(&schema).map_err(|e| SpecError::Schema {
            operation: label.to_string(),
            status: key.to_string(),
            message: e.to_string(),
        })
    };

    let mut content_types = Vec::new();
    let mut body = None;
    if let Some(content) = response.get("content").and_then(|c| c.as_object()) {
        content_types = content.keys().cloned().collect();
        let json_media = content
            .iter()
            .find(|(media, _)| is_json_media(media))
            .and_then(|(_, media)| media.get("schema"));
        if let Some(schema) = json_media {
            body = Some(compile(schema)?);
        }
    }

    let mut headers = Vec::new();
    if let Some(declared) = response.get("headers").and_then(|h| h.as_object()) {
        for (name, header) in declared {
            let header = resolve(header, doc, 0);
            let raw_schema = header.get("schema").map(|s| to_json_schema(s, doc, 0));
            let value_type = raw_schema
                .as_ref()
                .and_then(|s| s.get("type"))
                .and_then(|t| t.as_str())
                .map(str::to_string);
            let schema = match header.get("schema") {
                Some(s) => Some(compile(s)?),
                None => None,
            };
            headers.push(HeaderSpec {
                name: name.clone(),
                required: header
                    .get("required")
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false),
                value_type,
                schema,
            });
        }
    }

    Ok(ResponseSpec {
        content_types,
        body,
        headers,
    })
}

pub(crate) fn is_json_media(media: &str) -> bool {
    let media = media.split(';').next().unwrap_or("").trim();
    media.eq_ignore_ascii_case("application/json") || media.ends_with("+json")
}

/// Follow a top-level `$ref` (e.g. `#/components/responses/NotFound`).
fn resolve(value: &serde_json::Value, doc: &serde_json::Value, depth: u32) -> serde_json::Value {
    if depth > MAX_REF_DEPTH {
        return value.clone();
    }
    match value.get("$ref").and_then(|r| r.as_str()) {
        Some(reference) => match lookup_ref(reference, doc) {
            Some(target) => resolve(target, doc, depth + 1),
            None => value.clone(),
        },
        None => value.clone(),
    }
}

fn lookup_ref<'a>(reference: &str, doc: &'a serde_json::Value) -> Option<&'a serde_json::Value> {
    reference.strip_prefix('#').and_then(|pointer| doc.pointer(pointer))
}

/// Convert an OpenAPI 3.0 schema into a self-contained JSON Schema.
///
/// Resolves `$ref` recursively and rewrites `nullable: true` into a `null`
/// type union (and a `null` enum member where an enum is present).
fn to_json_schema(
    schema: &serde_json::Value,
    doc: &serde_json::Value,
    depth: u32,
) -> serde_json::Value {
    if depth > MAX_REF_DEPTH {
        // Circular reference: accept anything below this point
        return serde_json::json!({});
    }
    match schema {
        serde_json::Value::Object(obj) => {
            if let Some(reference) = obj.get("$ref").and_then(|v| v.as_str()) {
                return match lookup_ref(reference, doc) {
                    Some(target) => to_json_schema(target, doc, depth + 1),
                    None => serde_json::json!({}),
                };
            }
            let mut out: serde_json::Map<String, serde_json::Value> = obj
                .iter()
                .filter(|(k, _)| k.as_str() != "nullable")
                .map(|(k, v)| (k.clone(), to_json_schema(v, doc, depth + 1)))
                .collect();
            if obj.get("nullable").and_then(|v| v.as_bool()) == Some(true) {
                if let Some(serde_json::Value::String(t)) = out.get("type").cloned() {
                    out.insert("type".into(), serde_json::json!([t, "null"]));
                }
                if let Some(serde_json::Value::Array(variants)) = out.get_mut("enum") {
                    if !variants.contains(&serde_json::Value::Null) {
                        variants.push(serde_json::Value::Null);
                    }
                }
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(arr) => serde_json::Value::Array(
            arr.iter()
                .map(|v| to_json_schema(v, doc, depth + 1))
                .collect(),
        ),
        _ => schema.clone(),
    }
}
