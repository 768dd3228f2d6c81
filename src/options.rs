// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Knobs controlling a [`Transpiler`](crate::Transpiler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranspilerOptions {
    /// Reject `name(...)` calls that no converter recognizes instead of
    /// passing them through to the generated SQL.
    pub strict_functions: bool,
    /// Maximum nesting of builtin calls inside one another.
    pub max_depth: usize,
}

impl Default for TranspilerOptions {
    fn default() -> Self {
        Self {
            strict_functions: false,
            max_depth: 64,
        }
    }
}

impl TranspilerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_strict_functions(mut self, strict: bool) -> Self {
        self.strict_functions = strict;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}
