//! Configuration loading and management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// List behaviour for a resource: pagination, ordering and filtering.
///
/// Passed to the controller at construction instead of living in
/// process-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ListConfig {
    /// Page size used when the request does not ask for one
    pub page_size: usize,

    /// Upper bound for a client-supplied `page_size`
    pub max_page_size: usize,

    /// Fields accepted by the `ordering` query parameter
    pub ordering_fields: Vec<String>,

    /// Ordering applied when the request gives none (e.g. "-id")
    pub default_ordering: String,

    /// Fields accepted as filter query parameters
    pub filter_fields: Vec<String>,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: 30,
            max_page_size: 1000,
            ordering_fields: ["id", "create_time", "update_time"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_ordering: "-id".to_string(),
            filter_fields: [
                "id",
                "bin_name",
                "bin_size",
                "bin_property",
                "create_time",
                "update_time",
                "is_delete",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl ListConfig {
    /// Check whether `field` may be used in `ordering`
    pub fn is_orderable(&self, field: &str) -> bool {
        self.ordering_fields.iter().any(|f| f == field)
    }

    /// Check whether `field` may be used as a filter parameter
    pub fn is_filterable(&self, field: &str) -> bool {
        self.filter_fields.iter().any(|f| f == field)
    }

    /// Reject settings that cannot paginate
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.max_page_size == 0 {
            anyhow::bail!("list.page_size and list.max_page_size must be positive");
        }
        Ok(())
    }
}

/// Complete service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind: String,

    /// List settings for the binset resource
    pub list: ListConfig,

    /// Static token -> openid table for `StaticTokenAuthProvider`
    pub tokens: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8008".to_string(),
            list: ListConfig::default(),
            tokens: HashMap::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path))?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.list.validate()?;
        Ok(config)
    }
}
