//! # Placeholder Field Schemas
//!
//! Optional metadata attached to placeholder keys, and the classification that
//! decides how a placeholder's input is presented.
//!
//! Classification is a total function of the key:
//!
//! 1. an exact [`FieldSchema`] match wins;
//! 2. otherwise a key with an underscore-separated segment in [`LONG_TEXT_SEGMENTS`]
//!    is long text (`error_logs`, `body_text`, `release_notes_draft`);
//! 3. otherwise the key is a single-line input.
//!
//! Keys whose last segment is `log` or `logs` form the logs family and get
//! trimming tools when they are long text.

use serde::{Deserialize, Serialize};

/// Segments that mark a key as long text. Matched case-insensitively.
pub const LONG_TEXT_SEGMENTS: [&str; 7] =
    ["logs", "log", "text", "details", "content", "body", "notes"];

const LOG_SEGMENTS: [&str; 2] = ["logs", "log"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    SingleLine,
    LongText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub key: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
}

impl FieldSchema {
    /// The example value, when one is set and not blank.
    pub fn example(&self) -> Option<&str> {
        self.example.as_deref().filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass<'a> {
    Schema(&'a FieldSchema),
    /// No schema, but the key carries a long-text segment.
    Suffix(&'static str),
    Default,
}

impl FieldClass<'_> {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldClass::Schema(schema) => schema.kind,
            FieldClass::Suffix(_) => FieldKind::LongText,
            FieldClass::Default => FieldKind::SingleLine,
        }
    }

    pub fn is_multiline(&self) -> bool {
        self.kind() == FieldKind::LongText
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchemaRegistry {
    schemas: Vec<FieldSchema>,
}

impl Default for FieldSchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FieldSchemaRegistry {
    pub fn empty() -> Self {
        Self { schemas: Vec::new() }
    }

    pub fn builtin() -> Self {
        Self {
            schemas: vec![
                FieldSchema {
                    key: "error_logs".to_string(),
                    kind: FieldKind::LongText,
                    label: Some("Error logs".to_string()),
                    placeholder: Some("Paste error logs here...".to_string()),
                    example: Some(
                        "thread 'main' panicked at src/main.rs:12:5:\n\
                         called `Option::unwrap()` on a `None` value\n\
                         note: run with `RUST_BACKTRACE=1` environment variable \
                         to display a backtrace"
                            .to_string(),
                    ),
                },
                FieldSchema {
                    key: "error_log".to_string(),
                    kind: FieldKind::LongText,
                    label: Some("Error log".to_string()),
                    placeholder: Some("Paste error log here...".to_string()),
                    example: Some("error[E0382]: borrow of moved value: `config`".to_string()),
                },
            ],
        }
    }

    /// Adds a schema, replacing any existing one with the same key.
    pub fn insert(&mut self, schema: FieldSchema) {
        match self.schemas.iter_mut().find(|s| s.key == schema.key) {
            Some(existing) => *existing = schema,
            None => self.schemas.push(schema),
        }
    }

    pub fn with_schemas(mut self, schemas: impl IntoIterator<Item = FieldSchema>) -> Self {
        for schema in schemas {
            self.insert(schema);
        }
        self
    }

    /// Exact key lookup. No inheritance, no wildcards.
    pub fn get(&self, key: &str) -> Option<&FieldSchema> {
        self.schemas.iter().find(|s| s.key == key)
    }

    pub fn classify(&self, key: &str) -> FieldClass<'_> {
        if let Some(schema) = self.get(key) {
            return FieldClass::Schema(schema);
        }
        match long_text_segment(key) {
            Some(segment) => FieldClass::Suffix(segment),
            None => FieldClass::Default,
        }
    }
}

fn long_text_segment(key: &str) -> Option<&'static str> {
    key.split('_').find_map(|segment| {
        LONG_TEXT_SEGMENTS
            .iter()
            .copied()
            .find(|candidate| segment.eq_ignore_ascii_case(candidate))
    })
}

pub fn is_logs_key(key: &str) -> bool {
    key.rsplit('_')
        .next()
        .is_some_and(|last| LOG_SEGMENTS.iter().any(|s| last.eq_ignore_ascii_case(s)))
}
