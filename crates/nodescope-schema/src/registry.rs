use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use jsonschema::Validator;
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::SchemaConfig;
use crate::error::{Result, SchemaError};
use crate::facet::Facet;

/// Facet-keyed set of compiled JSON Schema validators.
pub struct FacetRegistry {
    validators: BTreeMap<Facet, Validator>,
    config: SchemaConfig,
}

impl FacetRegistry {
    pub fn new() -> Self {
        Self::with_config(SchemaConfig::default())
    }

    pub fn with_config(config: SchemaConfig) -> Self {
        Self {
            validators: BTreeMap::new(),
            config,
        }
    }

    /// Register a facet schema from a JSON string.
    pub fn register(&mut self, facet: Facet, schema_json: &str) -> Result<()> {
        let schema: Value = serde_json::from_str(schema_json)?;
        self.register_value(facet, &schema)
    }

    /// Register a facet schema from a JSON value.
    pub fn register_value(&mut self, facet: Facet, schema: &Value) -> Result<()> {
        let mut schema_to_compile = schema.clone();
        if self.config.strict_mode {
            apply_strict_mode(&mut schema_to_compile);
        }

        let compiled = jsonschema::validator_for(&schema_to_compile)
            .map_err(|err| SchemaError::CompileFailed(err.to_string()))?;

        self.validators.insert(facet, compiled);
        Ok(())
    }

    /// Load `runtime.schema.json` and/or `state.schema.json` from a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, SchemaConfig::default())
    }

    /// Load facet schemas from a directory with explicit config.
    ///
    /// Symlinked schema files, oversized files, and `*.schema.json` files that name
    /// no facet are rejected. Other files are ignored.
    pub fn from_directory_with_config(path: &Path, config: SchemaConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);

        let entries = std::fs::read_dir(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;

        for entry in entries {
            let entry = entry.map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let is_schema_file = file_name.ends_with(".schema.json");
            let entry_path = entry.path();
            let file_type = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?
                .file_type();

            if file_type.is_symlink() {
                if is_schema_file {
                    return Err(SchemaError::LoadFailed(format!(
                        "refusing to load schema symlink: {file_name}"
                    )));
                }
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            let facet = match Facet::from_schema_file_name(&file_name) {
                Some(facet) => facet,
                None if is_schema_file => {
                    return Err(SchemaError::LoadFailed(format!(
                        "unrecognized schema filename: {file_name}"
                    )));
                }
                None => continue,
            };

            let content = read_limited(&entry_path, registry.config.max_schema_file_size)?;
            registry.register(facet, &content)?;
            debug!(%facet, path = %entry_path.display(), "loaded facet schema");
        }

        Ok(registry)
    }

    /// Validate one facet value against its schema.
    pub fn validate(&self, facet: Facet, value: &Value) -> Result<()> {
        let Some(validator) = self.validators.get(&facet) else {
            return if self.config.fail_on_missing_schema {
                Err(SchemaError::NoSchema(facet))
            } else {
                Ok(())
            };
        };

        let mut errors = validator.iter_errors(value);
        if let Some(first) = errors.next() {
            let mut message = first.to_string();
            for err in errors.take(3) {
                message.push_str("; ");
                message.push_str(&err.to_string());
            }
            return Err(SchemaError::ValidationFailed { facet, message });
        }

        Ok(())
    }

    pub fn has_schema(&self, facet: Facet) -> bool {
        self.validators.contains_key(&facet)
    }

    /// Facets that have registered schemas, in declaration order.
    pub fn facets(&self) -> Vec<Facet> {
        self.validators.keys().copied().collect()
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }
}

impl Default for FacetRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FacetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacetRegistry")
            .field("facets", &self.facets())
            .field("config", &self.config)
            .finish()
    }
}

fn read_limited(path: &Path, max_bytes: usize) -> Result<String> {
    let file = std::fs::File::open(path).map_err(|err| {
        SchemaError::LoadFailed(format!("failed opening schema {}: {err}", path.display()))
    })?;
    let len = file
        .metadata()
        .map_err(|err| SchemaError::LoadFailed(err.to_string()))?
        .len();
    if len > max_bytes as u64 {
        return Err(SchemaError::LoadFailed(format!(
            "schema file too large ({len} bytes): {}",
            path.display()
        )));
    }

    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| {
            SchemaError::LoadFailed(format!("failed reading schema {}: {err}", path.display()))
        })?;
    if content.len() > max_bytes {
        return Err(SchemaError::LoadFailed(format!(
            "schema file too large while reading: {}",
            path.display()
        )));
    }
    Ok(content)
}

fn apply_strict_mode(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if is_object_schema(map) && !map.contains_key("additionalProperties") {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
            }
            for key in ["properties", "patternProperties", "$defs", "definitions"] {
                if let Some(Value::Object(children)) = map.get_mut(key) {
                    children.values_mut().for_each(apply_strict_mode);
                }
            }
            for key in ["items", "additionalProperties", "not", "if", "then", "else"] {
                if let Some(child) = map.get_mut(key) {
                    apply_strict_mode(child);
                }
            }
            for key in ["prefixItems", "allOf", "anyOf", "oneOf"] {
                if let Some(Value::Array(children)) = map.get_mut(key) {
                    children.iter_mut().for_each(apply_strict_mode);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(apply_strict_mode),
        _ => {}
    }
}

fn is_object_schema(map: &Map<String, Value>) -> bool {
    match map.get("type") {
        Some(Value::String(kind)) => kind == "object",
        Some(Value::Array(items)) => items
            .iter()
            .any(|item| matches!(item, Value::String(kind) if kind == "object")),
        _ => ["properties", "required", "additionalProperties"]
            .iter()
            .any(|keyword| map.contains_key(*keyword)),
    }
}
