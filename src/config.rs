//! Body configuration.
//!
//! The configuration surface is split into three tagged variants (tree,
//! selection, virtualization) composed into [`BodyConfig`]. Configs are plain
//! serde types, stored and loaded as JSON.

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::state::SelectionMode;
use crate::traits::KeyAccessor;

/// Default number of rows rendered above/below the viewport.
pub const DEFAULT_BUFFER_SIZE: usize = 10;

/// Default row height estimate in pixels.
pub const DEFAULT_ESTIMATE_ROW_HEIGHT: f64 = 22.0;

/// Tree behavior (`enableTree`, `enableCollapse`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TreeConfig {
    /// Rows are a flat list; `children` is ignored.
    Flat,
    /// Rows with `children` form a forest.
    Tree {
        /// When false, every row is shown expanded and cannot be collapsed.
        #[serde(default = "default_true")]
        collapsible: bool,
    },
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig::Tree { collapsible: true }
    }
}

impl TreeConfig {
    pub fn is_tree(&self) -> bool {
        matches!(self, TreeConfig::Tree { .. })
    }

    pub fn is_collapsible(&self) -> bool {
        matches!(self, TreeConfig::Tree { collapsible: true })
    }
}

/// Which selection source a toggle came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    /// Click on the row body (`rowSelectionMode`).
    Row,
    /// Click on the row checkbox (`checkboxSelectionMode`).
    Checkbox,
}

/// Selection behavior (`rowSelectionMode`, `checkboxSelectionMode`,
/// `selectingChildrenSelectsParents`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub row_mode: SelectionMode,
    pub checkbox_mode: SelectionMode,
    pub children_select_parents: bool,
}

impl SelectionConfig {
    pub fn mode_for(&self, source: SelectionSource) -> SelectionMode {
        match source {
            SelectionSource::Row => self.row_mode,
            SelectionSource::Checkbox => self.checkbox_mode,
        }
    }

    /// The more permissive of the two modes. Governs host-controlled
    /// selection and the shape of pruning notifications.
    pub fn widest_mode(&self) -> SelectionMode {
        fn rank(mode: SelectionMode) -> u8 {
            match mode {
                SelectionMode::None => 0,
                SelectionMode::Single => 1,
                SelectionMode::Multiple => 2,
            }
        }
        if rank(self.checkbox_mode) > rank(self.row_mode) {
            self.checkbox_mode
        } else {
            self.row_mode
        }
    }
}

/// Virtualization behavior (`renderAll`, `bufferSize`, `estimateRowHeight`,
/// `staticHeight`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum VirtualizationConfig {
    /// Materialize every row.
    RenderAll,
    /// Materialize the rows in view plus a buffer on each side.
    Windowed {
        #[serde(default = "default_buffer_size")]
        buffer_size: usize,
        #[serde(default = "default_estimate_row_height")]
        estimate_row_height: f64,
        /// All rows are exactly `estimate_row_height` tall.
        #[serde(default)]
        static_height: bool,
    },
}

impl Default for VirtualizationConfig {
    fn default() -> Self {
        VirtualizationConfig::Windowed {
            buffer_size: DEFAULT_BUFFER_SIZE,
            estimate_row_height: DEFAULT_ESTIMATE_ROW_HEIGHT,
            static_height: false,
        }
    }
}

impl VirtualizationConfig {
    /// Row height used before a row is measured.
    pub fn estimate_row_height(&self) -> f64 {
        match self {
            VirtualizationConfig::RenderAll => DEFAULT_ESTIMATE_ROW_HEIGHT,
            VirtualizationConfig::Windowed { estimate_row_height, .. } => *estimate_row_height,
        }
    }

    pub fn buffer_size(&self) -> usize {
        match self {
            VirtualizationConfig::RenderAll => 0,
            VirtualizationConfig::Windowed { buffer_size, .. } => *buffer_size,
        }
    }

    /// Whether measured heights are ignored.
    pub fn uses_static_height(&self) -> bool {
        matches!(self, VirtualizationConfig::Windowed { static_height: true, .. })
    }
}

/// Complete configuration of a table body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub tree: TreeConfig,
    pub selection: SelectionConfig,
    pub virtualization: VirtualizationConfig,
    /// Row attribute used as identity and as the append/prepend/replace
    /// discriminator.
    pub key: Option<String>,
    /// Key of the row to place at the top on initialization.
    pub id_for_first_item: Option<String>,
    /// Host selector of the scroll container; `None` for fixed-height tables.
    pub container_selector: Option<String>,
    /// Opaque table meta handed to every rendered row.
    pub table_meta: Option<serde_json::Value>,
}

impl BodyConfig {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: BodyConfig =
            serde_json::from_str(json).context("Failed to parse body configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read body configuration {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("Invalid body configuration in {}", path.display()))
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize body configuration")
    }

    /// Rejects configurations that would corrupt window computation.
    pub fn validate(&self) -> Result<()> {
        if let VirtualizationConfig::Windowed { estimate_row_height, .. } = self.virtualization {
            ensure!(
                estimate_row_height.is_finite() && estimate_row_height > 0.0,
                "estimate_row_height must be a positive finite number, got {}",
                estimate_row_height
            );
        }
        if let Some(key) = &self.key {
            ensure!(!key.is_empty(), "key attribute name must not be empty");
        }
        Ok(())
    }

    pub fn key_accessor(&self) -> KeyAccessor {
        KeyAccessor::new(self.key.clone())
    }
}

fn default_true() -> bool {
    true
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_estimate_row_height() -> f64 {
    DEFAULT_ESTIMATE_ROW_HEIGHT
}
