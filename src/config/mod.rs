//! Configuration management module
//!
//! Handles YAML build manifest parsing, JSON schema validation and semantic
//! validation of the declared graph

pub mod schema;
pub mod validation;
pub mod yaml;

use crate::git::SparseCheckoutOptions;
use crate::system::System;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Build root used when neither the CLI nor the manifest names one
pub const DEFAULT_BUILD_ROOT: &str = "./build";

/// Main manifest structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Manifest {
    /// Directory that holds build outputs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_root: Option<String>,

    /// Sparse checkout steps
    pub checkouts: Vec<CheckoutConfig>,

    /// Command steps consuming the checkouts
    #[serde(default)]
    pub commands: Vec<CommandConfig>,
}

/// Individual sparse checkout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckoutConfig {
    pub name: String,
    pub url: String,
    pub directories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executable: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
}

impl CheckoutConfig {
    /// Convert into the options of a sparse checkout step
    #[must_use]
    #[inline]
    pub fn to_options(&self) -> SparseCheckoutOptions {
        SparseCheckoutOptions {
            url: self.url.clone(),
            directories: self.directories.clone(),
            branch: self.branch.clone(),
            executable: self.executable.as_ref().map(PathBuf::from),
            destination: self.destination.as_ref().map(PathBuf::from),
        }
    }
}

/// Individual command configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommandConfig {
    pub name: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Checkout whose output path is the working directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Manifest {
    /// Load manifest from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unparsable or invalid
    #[inline]
    pub fn load_from_file(system: &dyn System, path: &str) -> anyhow::Result<Self> {
        yaml::load_manifest(system, path)
    }

    /// Validate the declared steps and edges
    ///
    /// # Errors
    ///
    /// Returns an error describing the first problem found
    #[inline]
    pub fn validate(&self) -> anyhow::Result<()> {
        validation::validate_manifest(self)
    }
}
