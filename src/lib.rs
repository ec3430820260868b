// Library exports for brickdash

pub mod config;
pub mod context;
pub mod data;
pub mod error;
pub mod field;
pub mod graph;
pub mod palette;
pub mod parser;
pub mod query;
pub mod server;
pub mod shell;
pub mod summary;

pub use context::DashboardContext;
pub use error::{DashboardError, Result};
pub use query::{query, ChartPoint, ChartSpec, Selection};

use serde::Deserialize;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Largest accepted chart width or height, in pixels
pub const MAX_DIMENSION: u32 = 4096;

#[derive(Debug, Clone, Deserialize, Default, PartialEq, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
    #[serde(default)]
    pub title: Option<String>,
}

fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }

impl RenderOptions {
    /// Reject empty or oversized canvases before any buffer is allocated
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            if value == 0 || value > MAX_DIMENSION {
                return Err(DashboardError::InvalidRequest(format!(
                    "Chart {} must be between 1 and {}, got {}",
                    name, MAX_DIMENSION, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
            title: None,
        }
    }
}
