//! Render options.
//!
//! Options are plain serde data so hosts can keep them in a JSON file next
//! to their own settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::util::{Color, Error, Result};

/// Settings of a scene builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    // Tessellation
    pub quality: f64,
    pub angular_tolerance: f64,
    pub edge_accuracy: f64,

    // Content
    pub render_shapes: bool,
    pub render_edges: bool,

    // Colors
    pub default_mesh_color: Color,
    pub default_edge_color: Color,
    pub transparent: bool,
    pub opacity: f32,

    // Primitive sizes
    pub edge_width: f32,
    pub derived_edge_width: f32,
    pub vertex_size: f32,

    // Parallel pre-pass
    pub parallel: bool,
    pub workers: Option<usize>, // None = one per CPU
    pub transfer_dir: Option<PathBuf>,

    // Log per-phase timings at info level
    pub timeit: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            quality: 0.1,
            angular_tolerance: 0.1,
            edge_accuracy: 0.01,
            render_shapes: true,
            render_edges: true,
            default_mesh_color: Color::rgb(166, 166, 166),
            default_edge_color: Color::rgb(128, 128, 128),
            transparent: false,
            opacity: 1.0,
            edge_width: 3.0,
            derived_edge_width: 1.0,
            vertex_size: 6.0,
            parallel: false,
            workers: None,
            transfer_dir: None,
            timeit: false,
        }
    }
}

impl RenderOptions {
    /// Parse from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Save as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject tolerances and sizes outside their valid ranges.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("quality", self.quality),
            ("angular_tolerance", self.angular_tolerance),
            ("edge_accuracy", self.edge_accuracy),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::invalid_option(name, format!("must be > 0, got {value}")));
            }
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(Error::invalid_option("opacity", format!("must be in 0..=1, got {}", self.opacity)));
        }
        if self.workers == Some(0) {
            return Err(Error::invalid_option("workers", "must be at least 1"));
        }
        Ok(())
    }
}
