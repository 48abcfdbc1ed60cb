//! Settings handed to the vault controller at start-up.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::field_schema::{FieldSchema, FieldSchemaRegistry};
use crate::lines::DEFAULT_TRIM_LINES;
use crate::pane::PaneBounds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultSettings {
    /// Lines kept by each trim action.
    #[serde(default = "default_trim_lines")]
    pub trim_lines: usize,

    /// How long a notification stays visible.
    #[serde(default = "default_toast_millis")]
    pub toast_millis: u64,

    #[serde(default)]
    pub pane: PaneBounds,

    /// Extra schemas layered over the built-in ones. Same key replaces.
    #[serde(default)]
    pub field_schemas: Vec<FieldSchema>,
}

fn default_trim_lines() -> usize {
    DEFAULT_TRIM_LINES
}

fn default_toast_millis() -> u64 {
    2500
}

impl Default for VaultSettings {
    fn default() -> Self {
        Self {
            trim_lines: default_trim_lines(),
            toast_millis: default_toast_millis(),
            pane: PaneBounds::default(),
            field_schemas: Vec::new(),
        }
    }
}

impl VaultSettings {
    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_millis)
    }

    pub fn field_schema_registry(&self) -> FieldSchemaRegistry {
        FieldSchemaRegistry::builtin().with_schemas(self.field_schemas.iter().cloned())
    }
}
