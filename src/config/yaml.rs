//! YAML manifest loading and parsing

use crate::config::Manifest;
use crate::error::FetchError;
use crate::system::System;
use anyhow::{Context as _, Result};
use std::path::Path;

/// Load, parse and validate a YAML manifest from file
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist or cannot be read
/// - The YAML cannot be parsed
/// - The manifest does not match the schema or fails validation
#[inline]
pub fn load_manifest(system: &dyn System, path: &str) -> Result<Manifest> {
    let path_obj = Path::new(path);

    if !system.exists(path_obj) {
        return Err(FetchError::configuration(format!(
            "Manifest file not found: {path}\n\
            Create a sparsedep.yaml file or specify a different path with --config"
        ))
        .into());
    }

    let content = system
        .read_to_string(path_obj)
        .with_context(|| format!("Failed to read manifest file: {path}"))?;

    parse_manifest(&content).with_context(|| format!("Invalid manifest: {path}"))
}

/// Parse and validate a manifest from YAML text
///
/// # Errors
///
/// Returns an error if the YAML cannot be parsed or the manifest is invalid
#[inline]
pub fn parse_manifest(content: &str) -> Result<Manifest> {
    let manifest: Manifest = serde_yaml::from_str(content).map_err(|e| {
        let message = match e.location() {
            Some(location) => format!(
                "Failed to parse YAML at line {}, column {}: {e}",
                location.line(),
                location.column()
            ),
            None => format!("Failed to parse YAML: {e}"),
        };
        FetchError::configuration(message)
    })?;

    let manifest_value = serde_json::to_value(&manifest)
        .context("Failed to convert manifest to JSON for validation")?;
    crate::config::schema::validate_against_schema(&manifest_value)?;

    manifest.validate()?;

    Ok(manifest)
}
