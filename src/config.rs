// Static dashboard configuration: theme list, palette, axis labels, load filters

use crate::data::LoadFilter;
use crate::error::{DashboardError, Result};
use crate::field::{default_field_labels, FieldLabel, FieldLabels};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Canonical theme order, used for the selector and for legend order
    pub themes: Vec<String>,
    /// Palette paired index-by-index with `themes`
    pub colors: Vec<String>,
    /// Axis fields offered by the selectors, in display order
    pub fields: Vec<FieldLabel>,
    pub excluded_themes: Vec<String>,
    /// Rows need strictly more parts than this to be kept
    pub min_parts: u32,
    pub set_type: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            themes: to_strings(&[
                "Star Wars",
                "City",
                "System",
                "Creator",
                "Harry Potter",
                "Technic",
                "Friends",
                "Basic",
                "Castle",
                "Ninjago",
                "Legends of Chima",
                "Marvel Super Heroes",
                "Pirates",
            ]),
            colors: to_strings(&[
                "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2",
                "#7f7f7f", "#bcbd22", "#17becf", "#aec7e8", "#ffbb78", "#98df8a",
            ]),
            fields: default_field_labels(),
            excluded_themes: to_strings(&[
                "Duplo",
                "Action Wheelers",
                "Education",
                "Dacta",
                "Explore",
                "Mindstorms",
                "Quatro",
            ]),
            min_parts: 10,
            set_type: "Normal".to_string(),
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl DashboardConfig {
    /// Load overrides from a JSON file. Keys left out keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            DashboardError::ConfigurationError(format!(
                "Failed to read config {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| DashboardError::ConfigurationError(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.themes.len() != self.colors.len() {
            return Err(DashboardError::ConfigurationError(format!(
                "{} themes but {} colors",
                self.themes.len(),
                self.colors.len()
            )));
        }
        self.field_labels()?;
        Ok(())
    }

    pub fn field_labels(&self) -> Result<FieldLabels> {
        FieldLabels::new(self.fields.clone())
    }

    pub fn load_filter(&self) -> LoadFilter {
        LoadFilter {
            min_parts: self.min_parts,
            set_type: self.set_type.clone(),
            excluded_themes: self.excluded_themes.clone(),
        }
    }
}
