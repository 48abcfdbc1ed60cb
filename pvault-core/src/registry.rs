//! # Collaborators
//!
//! The narrow contracts the vault controller talks to:
//! - [`PromptStore`] - persistence actions (create, update, delete, toggle pin)
//! - [`Session`] - signing the current user out
//! - [`Clipboard`] - writing text to the system clipboard
//!
//! Every persistence action resolves to either its data or an [`ActionError`]
//! whose message is shown to the user as is.

use crate::action::{ActionError, ActionResult};
use crate::prompt::{Prompt, PromptInput};

#[allow(async_fn_in_trait)]
pub trait PromptStore {
    async fn create_prompt(&mut self, input: PromptInput) -> ActionResult<Prompt>;
    async fn update_prompt(&mut self, id: &str, input: PromptInput) -> ActionResult<Prompt>;
    async fn delete_prompt(&mut self, id: &str) -> ActionResult<String>;
    /// Flips the pin state and returns the owner's whole collection in listing order.
    async fn toggle_pin(&mut self, id: &str) -> ActionResult<Vec<Prompt>>;
}

#[allow(async_fn_in_trait)]
pub trait Session {
    async fn sign_out(&mut self);
}

pub trait Clipboard {
    type Error: std::error::Error;

    fn write_text(&mut self, text: &str) -> Result<(), Self::Error>;
}

/// A store for read-only contexts. Every mutation is refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReadOnlyStore;

impl PromptStore for ReadOnlyStore {
    async fn create_prompt(&mut self, _input: PromptInput) -> ActionResult<Prompt> {
        Err(ActionError::forbidden())
    }

    async fn update_prompt(&mut self, _id: &str, _input: PromptInput) -> ActionResult<Prompt> {
        Err(ActionError::forbidden())
    }

    async fn delete_prompt(&mut self, _id: &str) -> ActionResult<String> {
        Err(ActionError::forbidden())
    }

    async fn toggle_pin(&mut self, _id: &str) -> ActionResult<Vec<Prompt>> {
        Err(ActionError::forbidden())
    }
}

impl Session for ReadOnlyStore {
    async fn sign_out(&mut self) {}
}
