//! Manifest validation logic

use crate::config::{CheckoutConfig, CommandConfig, Manifest};
use crate::error::FetchError;
use anyhow::Result;
use std::collections::HashSet;

/// Validate a complete manifest
///
/// Cycles between commands are not detected here; the build graph reports
/// them before anything runs.
///
/// # Errors
///
/// Returns an error if:
/// - The manifest has no checkout
/// - A step name is empty or used twice
/// - A checkout or command is invalid
/// - A command depends on an unknown step
#[inline]
pub fn validate_manifest(manifest: &Manifest) -> Result<()> {
    if manifest.checkouts.is_empty() {
        return Err(FetchError::configuration(
            "Manifest must contain at least one checkout",
        )
        .into());
    }

    let mut names = HashSet::new();
    let step_names = manifest
        .checkouts
        .iter()
        .map(|checkout| checkout.name.as_str())
        .chain(manifest.commands.iter().map(|command| command.name.as_str()));
    for name in step_names {
        if name.trim().is_empty() {
            return Err(FetchError::configuration("Step name cannot be empty").into());
        }
        if !names.insert(name) {
            return Err(
                FetchError::configuration(format!("Step name '{name}' is used twice")).into(),
            );
        }
    }

    for checkout in &manifest.checkouts {
        validate_checkout(checkout)?;
    }

    let checkout_names: HashSet<&str> = manifest
        .checkouts
        .iter()
        .map(|checkout| checkout.name.as_str())
        .collect();
    for command in &manifest.commands {
        validate_command(command, &names, &checkout_names)?;
    }

    Ok(())
}

/// Validate a single checkout configuration
fn validate_checkout(checkout: &CheckoutConfig) -> Result<()> {
    let context = format!("Checkout '{}'", checkout.name);

    if checkout.url.trim().is_empty() {
        return Err(FetchError::configuration(format!("{context}: URL cannot be empty")).into());
    }

    if checkout.directories.is_empty() {
        return Err(FetchError::configuration(format!(
            "{context}: at least one directory is required"
        ))
        .into());
    }

    for (index, directory) in checkout.directories.iter().enumerate() {
        if directory.trim().is_empty() {
            return Err(FetchError::configuration(format!(
                "{context}: directory #{} cannot be empty",
                index + 1
            ))
            .into());
        }
    }

    if checkout.branch.as_deref().is_some_and(|b| b.trim().is_empty()) {
        return Err(FetchError::configuration(format!("{context}: branch cannot be empty")).into());
    }

    Ok(())
}

/// Validate a single command configuration
fn validate_command(
    command: &CommandConfig,
    step_names: &HashSet<&str>,
    checkout_names: &HashSet<&str>,
) -> Result<()> {
    let context = format!("Command '{}'", command.name);

    if command.program.trim().is_empty() {
        return Err(
            FetchError::configuration(format!("{context}: program cannot be empty")).into(),
        );
    }

    for dependency in &command.depends_on {
        if !step_names.contains(dependency.as_str()) {
            return Err(FetchError::configuration(format!(
                "{context}: depends on unknown step '{dependency}'"
            ))
            .into());
        }
    }

    if let Some(cwd) = command.cwd.as_deref() {
        if !checkout_names.contains(cwd) {
            return Err(FetchError::configuration(format!(
                "{context}: cwd '{cwd}' is not a checkout"
            ))
            .into());
        }
        if !command.depends_on.iter().any(|dependency| dependency == cwd) {
            return Err(FetchError::configuration(format!(
                "{context}: cwd '{cwd}' must also be listed in dependsOn"
            ))
            .into());
        }
    }

    Ok(())
}
