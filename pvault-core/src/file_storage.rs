//! # File Storage
//!
//! This module stores prompts on the local filesystem, one markdown file per prompt with
//! YAML frontmatter holding the metadata (`<id>.md`).
//!
//! [`FileStorage`] implements [`PromptStore`], so it can back the vault controller
//! directly. It re-validates every payload and enforces the pin limit: pinning a prompt
//! while [`MAX_PINNED_PROMPTS`] others are pinned unpins the least recently pinned one.
//!
//! # Examples
//!
//! ```rust
//! use pvault_core::file_storage::FileStorage;
//! use pvault_core::prompt::PromptInput;
//! use tempfile::TempDir;
//!
//! let temp_dir = TempDir::new().unwrap();
//! let storage = FileStorage {
//!     base_path: temp_dir.path().to_path_buf(),
//! };
//!
//! let input = PromptInput {
//!     title: "Greeting".to_string(),
//!     body: "Hello, {{name}}!".to_string(),
//!     tags: vec!["example".to_string()],
//! };
//! let prompt = storage.create(input, chrono::Utc::now()).expect("Failed to save prompt");
//! assert_eq!(storage.get_prompt(prompt.id()).unwrap().body, "Hello, {{name}}!");
//! ```

use crate::action::{ActionError, ActionResult, ErrorCode};
use crate::prompt::{MAX_PINNED_PROMPTS, Prompt, PromptInput, PromptMetadata, sort_for_listing};
use crate::registry::PromptStore;
use chrono::{DateTime, TimeDelta, Utc};
use std::fs::create_dir_all;
use std::path::PathBuf;
use std::{fs, io};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum FileStorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0:?}")]
    SerializationError(serde_frontmatter::SerdeFMError),
    #[error("Invalid base path: {0}")]
    InvalidBasePath(String),
    #[error("Prompt not found: {0}")]
    PromptNotFound(String),
}

impl From<serde_frontmatter::SerdeFMError> for FileStorageError {
    fn from(err: serde_frontmatter::SerdeFMError) -> Self {
        FileStorageError::SerializationError(err)
    }
}

/// A local file storage for Prompts.
///
/// Saves prompts as markdown files with YAML frontmatter in the specified directory.
pub struct FileStorage {
    /// The base directory where prompt files are stored.
    pub base_path: PathBuf,
}

impl FileStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Writes a prompt to `<base_path>/<id>.md`, overwriting any previous version.
    ///
    /// If `base_path` doesn't exist, it is created first.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - If the prompt is saved correctly.
    /// * `FileStorageError::InvalidBasePath` - If `base_path` exists but is not a directory.
    pub fn save_prompt(&self, prompt: &Prompt) -> Result<(), FileStorageError> {
        self.ensure_base_directory_exists()?;

        let file_path = self.prompt_path(prompt.id())?;
        let serialized = serde_frontmatter::serialize(&prompt.metadata, prompt.body.as_str())?;
        fs::write(file_path, serialized)?;
        Ok(())
    }

    /// Gets a prompt given its id.
    ///
    /// # Returns
    ///
    /// * `Ok(Prompt)` - If the prompt is found.
    /// * `FileStorageError::PromptNotFound` - If no file exists for that id.
    pub fn get_prompt(&self, id: &str) -> Result<Prompt, FileStorageError> {
        let file_path = self.prompt_path(id)?;
        if !file_path.exists() {
            return Err(FileStorageError::PromptNotFound(id.to_string()));
        }
        read_prompt_file(&file_path)
    }

    /// Gets every stored prompt in listing order.
    pub fn get_prompts(&self) -> Result<Vec<Prompt>, FileStorageError> {
        let mut prompts = Vec::new();
        for entry in self.get_md_files()? {
            prompts.push(read_prompt_file(entry.path())?);
        }
        sort_for_listing(&mut prompts);
        Ok(prompts)
    }

    /// Gets all prompts that have any of the specified tags, in listing order.
    pub fn get_prompts_by_tag(&self, tags: &[String]) -> Result<Vec<Prompt>, FileStorageError> {
        Ok(self
            .get_prompts()?
            .into_iter()
            .filter(|prompt| prompt.tags().iter().any(|tag| tags.contains(tag)))
            .collect())
    }

    pub fn delete_prompt(&self, id: &str) -> Result<(), FileStorageError> {
        let file_path = self.prompt_path(id)?;
        if !file_path.exists() {
            return Err(FileStorageError::PromptNotFound(id.to_string()));
        }
        fs::remove_file(file_path)?;
        Ok(())
    }

    pub fn create(
        &self,
        input: PromptInput,
        now: DateTime<Utc>,
    ) -> Result<Prompt, FileStorageError> {
        let metadata = PromptMetadata::new(
            Uuid::now_v7().to_string(),
            input.title,
            input.tags,
            now,
        );
        let prompt = Prompt::new(metadata, input.body);
        self.save_prompt(&prompt)?;
        Ok(prompt)
    }

    /// Replaces title, body and tags. Pin state and creation time are kept.
    pub fn update(
        &self,
        id: &str,
        input: PromptInput,
        now: DateTime<Utc>,
    ) -> Result<Prompt, FileStorageError> {
        let mut prompt = self.get_prompt(id)?;
        prompt.metadata.title = input.title;
        prompt.metadata.tags = input.tags;
        prompt.metadata.updated_at = now;
        prompt.body = input.body;
        self.save_prompt(&prompt)?;
        Ok(prompt)
    }

    /// Pins or unpins a prompt and returns the whole collection in listing order.
    ///
    /// When pinning would exceed [`MAX_PINNED_PROMPTS`], the prompt with the oldest pin
    /// among the others is unpinned first.
    pub fn set_pin_state(
        &self,
        id: &str,
        should_pin: bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<Prompt>, FileStorageError> {
        let mut target = self.get_prompt(id)?;

        if !should_pin {
            target.metadata.pinned_at = None;
            self.save_prompt(&target)?;
            return self.get_prompts();
        }

        let mut pinned: Vec<Prompt> = self
            .get_prompts()?
            .into_iter()
            .filter(|p| p.is_pinned() && p.id() != id)
            .collect();
        pinned.sort_by_key(|p| p.metadata.pinned_at);

        let latest = pinned.last().and_then(|p| p.metadata.pinned_at);

        if pinned.len() >= MAX_PINNED_PROMPTS {
            let mut oldest = pinned.remove(0);
            debug!(evicted = oldest.id(), "set_pin_state: pin limit reached");
            oldest.metadata.pinned_at = None;
            self.save_prompt(&oldest)?;
        }

        // Strictly later than every other pin, so eviction order never ties.
        let pinned_at = match latest {
            Some(latest) if latest >= now => latest + TimeDelta::nanoseconds(1),
            _ => now,
        };
        target.metadata.pinned_at = Some(pinned_at);
        self.save_prompt(&target)?;

        self.get_prompts()
    }

    pub fn ensure_base_directory_exists(&self) -> Result<(), FileStorageError> {
        if !self.base_path.exists() {
            create_dir_all(&self.base_path)?;
        } else if !self.base_path.is_dir() {
            return Err(FileStorageError::InvalidBasePath(
                self.base_path.display().to_string(),
            ));
        }
        Ok(())
    }

    fn prompt_path(&self, id: &str) -> Result<PathBuf, FileStorageError> {
        let valid = !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
        if !valid {
            return Err(FileStorageError::PromptNotFound(id.to_string()));
        }
        Ok(self.base_path.join(format!("{}.md", id)))
    }

    fn get_md_files(&self) -> Result<Vec<walkdir::DirEntry>, FileStorageError> {
        if !self.base_path.exists() {
            return Ok(Vec::new());
        }
        let entries = WalkDir::new(&self.base_path)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.file_type().is_file() && e.path().extension().is_some_and(|ext| ext == "md")
            })
            .collect();
        Ok(entries)
    }
}

fn read_prompt_file(path: &std::path::Path) -> Result<Prompt, FileStorageError> {
    let content = fs::read_to_string(path)?;
    let (metadata, raw_body): (PromptMetadata, String) =
        serde_frontmatter::deserialize(content.as_str())?;
    Ok(Prompt::new(metadata, raw_body.trim_start().to_string()))
}

fn storage_failure(action: &str, message: &str, err: FileStorageError) -> ActionError {
    match err {
        FileStorageError::PromptNotFound(id) => {
            debug!(%id, action, "prompt not found");
            ActionError::not_found()
        }
        other => {
            warn!(error = %other, action, "prompt storage failed");
            ActionError::new(ErrorCode::DbError, message)
        }
    }
}

fn validated(input: PromptInput) -> ActionResult<PromptInput> {
    input.validate().map_err(|errors| {
        let message = errors.first_message().unwrap_or("Invalid input").to_string();
        ActionError::new(ErrorCode::ValidationError, message)
    })
}

impl PromptStore for FileStorage {
    async fn create_prompt(&mut self, input: PromptInput) -> ActionResult<Prompt> {
        let input = validated(input)?;
        let prompt = self
            .create(input, Utc::now())
            .map_err(|e| storage_failure("create", "Failed to save the prompt", e))?;
        info!(id = prompt.id(), "prompt created");
        Ok(prompt)
    }

    async fn update_prompt(&mut self, id: &str, input: PromptInput) -> ActionResult<Prompt> {
        let input = validated(input)?;
        let prompt = self
            .update(id, input, Utc::now())
            .map_err(|e| storage_failure("update", "Failed to update the prompt", e))?;
        info!(id, "prompt updated");
        Ok(prompt)
    }

    async fn delete_prompt(&mut self, id: &str) -> ActionResult<String> {
        FileStorage::delete_prompt(self, id)
            .map_err(|e| storage_failure("delete", "Failed to delete the prompt", e))?;
        info!(id, "prompt deleted");
        Ok(id.to_string())
    }

    async fn toggle_pin(&mut self, id: &str) -> ActionResult<Vec<Prompt>> {
        let pin_failure = |e| storage_failure("toggle_pin", "Failed to update the pin", e);
        let existing = self.get_prompt(id).map_err(pin_failure)?;
        let prompts = self
            .set_pin_state(id, !existing.is_pinned(), Utc::now())
            .map_err(pin_failure)?;
        info!(id, pinned = !existing.is_pinned(), "prompt pin toggled");
        Ok(prompts)
    }
}
