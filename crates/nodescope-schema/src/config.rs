/// Controls facet validation behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaConfig {
    /// When true, object schemas reject properties they do not declare.
    pub strict_mode: bool,
    /// When true, a present facet without a schema returns `SchemaError::NoSchema`.
    pub fail_on_missing_schema: bool,
    /// Maximum bytes allowed per schema file loaded from a directory.
    pub max_schema_file_size: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            fail_on_missing_schema: false,
            max_schema_file_size: 256 * 1024,
        }
    }
}
