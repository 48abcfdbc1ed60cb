//! Allowlist gate.
//!
//! Only addresses on the configured list may use the vault. The list is built once at
//! start-up and handed to whoever needs it.

use std::collections::HashSet;
use tracing::{info, warn};

use crate::action::{ActionError, ActionResult, ErrorCode};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allowlist {
    emails: HashSet<String>,
}

impl Allowlist {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails: HashSet<String> = emails
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        if emails.is_empty() {
            warn!("allowlist is empty, access will be denied for every user");
        }
        Self { emails }
    }

    /// Parses a comma-separated list such as `ALLOW_EMAILS`.
    pub fn from_csv(raw: &str) -> Self {
        Self::new(raw.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn is_allowed(&self, email: Option<&str>) -> bool {
        email.is_some_and(|e| self.emails.contains(&e.trim().to_lowercase()))
    }

    /// `UNAUTHORIZED` without an identity, `FORBIDDEN` for one that is not listed.
    pub fn authorize(&self, email: Option<&str>) -> ActionResult<()> {
        let Some(email) = email.filter(|e| !e.trim().is_empty()) else {
            return Err(ActionError::new(ErrorCode::Unauthorized, "Sign-in is required"));
        };
        let masked = mask_email(Some(email));
        if !self.is_allowed(Some(email)) {
            warn!(email = masked.as_deref(), "access denied");
            return Err(ActionError::forbidden());
        }
        info!(email = masked.as_deref(), "access granted");
        Ok(())
    }
}

/// Keeps the first two characters of the local part, e.g. `ad***@example.com`.
pub fn mask_email(email: Option<&str>) -> Option<String> {
    let email = email.filter(|e| !e.is_empty())?;
    let Some((local, domain)) = email.split_once('@') else {
        return Some("invalid-email".to_string());
    };
    if local.is_empty() || domain.is_empty() {
        return Some("invalid-email".to_string());
    }
    if local.chars().count() <= 2 {
        return Some(format!("**@{domain}"));
    }
    let prefix: String = local.chars().take(2).collect();
    Some(format!("{prefix}***@{domain}"))
}
