//! # pvault Core
//!
//! This crate provides the core functionality for the pvault prompt vault.
//!
//! pvault keeps reusable prompt templates with `{{placeholder}}` tokens, lets a user fill
//! the placeholders, trim pasted logs and copy the rendered result.
//!
//! # Modules
//!
//! - [`parser`] - Template parsing functionality
//! - [`template`] - Placeholder extraction, rendering and highlighted preview
//! - [`lines`] - Head/tail line windowing for long pasted text
//! - [`field_schema`] - Per-placeholder input metadata
//! - [`prompt`] - Core prompt data structures, ordering and form validation
//! - [`file_storage`] - File-based storage implementation for prompts
//! - [`registry`] - Collaborator contracts used by the controller
//! - [`local_store`] - Client-local persistence of placeholder values and pane width
//! - [`controller`] - The vault interaction controller
//!
//! # Examples
//!
//! ```rust
//! use pvault_core::prompt::PromptInput;
//! use pvault_core::file_storage::FileStorage;
//! use pvault_core::template::{PlaceholderValues, render_template};
//! use chrono::Utc;
//! use tempfile::TempDir;
//!
//! let temp_dir = TempDir::new().unwrap();
//! let storage = FileStorage::new(temp_dir.path().to_path_buf());
//!
//! let input = PromptInput::validate(PromptInput {
//!     title: "Greeting".to_string(),
//!     body: "Hello, {{name}}!".to_string(),
//!     tags: vec!["example".to_string()],
//! })
//! .expect("valid input");
//! let prompt = storage.create(input, Utc::now()).expect("Failed to save prompt");
//!
//! let mut values = PlaceholderValues::new();
//! values.insert("name".to_string(), "world".to_string());
//! assert_eq!(render_template(&prompt.body, &values), "Hello, world!");
//! ```

pub mod access;
pub mod action;
pub mod config;
pub mod controller;
pub mod demo;
pub mod field_schema;
pub mod file_storage;
pub mod lines;
pub mod local_store;
pub mod pane;
pub mod parser;
pub mod prompt;
pub mod registry;
pub mod selectors;
pub mod shortcuts;
pub mod template;
