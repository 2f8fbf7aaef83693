//! JSON Schema validation for sparsedep manifests

use crate::error::FetchError;
use anyhow::{Result, anyhow};
use jsonschema::Validator;
use serde_json::Value;

/// Compile the embedded JSON schema for manifests
///
/// # Errors
///
/// Returns an error if the embedded schema is not valid JSON Schema
#[inline]
pub fn get_schema() -> Result<Validator> {
    let schema_str = include_str!("../../docs/schema.json");
    let schema: Value = serde_json::from_str(schema_str)
        .map_err(|e| anyhow!("Failed to parse embedded JSON schema: {e}"))?;

    jsonschema::draft7::new(&schema).map_err(|e| anyhow!("Failed to compile JSON schema: {e}"))
}

/// Validate a manifest value against the schema
///
/// # Errors
///
/// Returns a configuration error listing every schema violation
#[inline]
pub fn validate_against_schema(manifest: &Value) -> Result<()> {
    let schema = get_schema()?;

    let error_messages: Vec<String> = schema
        .iter_errors(manifest)
        .map(|e| format!("  - Path '{}': {e}", e.instance_path))
        .collect();

    if !error_messages.is_empty() {
        return Err(FetchError::configuration(format!(
            "Manifest does not match the schema:\n{}",
            error_messages.join("\n")
        ))
        .into());
    }

    Ok(())
}
