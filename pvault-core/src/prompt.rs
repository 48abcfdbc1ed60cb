use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::template::Template;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_BODY_CHARS: usize = 10_000;
pub const MAX_TAG_CHARS: usize = 30;
pub const MAX_TAGS: usize = 10;
/// At most this many prompts are pinned at once.
pub const MAX_PINNED_PROMPTS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub pinned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    pub body: String,
}

impl PromptMetadata {
    pub fn new(id: String, title: String, tags: Vec<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            tags,
            pinned_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Prompt {
    pub fn new(metadata: PromptMetadata, body: String) -> Prompt {
        Prompt { metadata, body }
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    pub fn tags(&self) -> &[String] {
        &self.metadata.tags
    }

    pub fn is_pinned(&self) -> bool {
        self.metadata.pinned_at.is_some()
    }

    pub fn template(&self) -> Template {
        Template::parse(&self.body)
    }

    /// Case-insensitive substring match on the title or any tag. A blank query matches.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.metadata.title.to_lowercase().contains(&query)
            || self.metadata.tags.iter().any(|tag| tag.to_lowercase().contains(&query))
    }
}

/// Pinned prompts first, most recently pinned on top, then most recently updated.
pub fn listing_order(a: &Prompt, b: &Prompt) -> Ordering {
    match (a.metadata.pinned_at, b.metadata.pinned_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| b.metadata.updated_at.cmp(&a.metadata.updated_at))
}

pub fn sort_for_listing(prompts: &mut [Prompt]) {
    prompts.sort_by(listing_order);
}

/// The raw, unvalidated contents of the create/edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptForm {
    pub title: String,
    pub body: String,
    pub tags_csv: String,
}

impl PromptForm {
    pub fn from_prompt(prompt: &Prompt) -> Self {
        Self {
            title: prompt.metadata.title.clone(),
            body: prompt.body.clone(),
            tags_csv: prompt.metadata.tags.join(", "),
        }
    }

    pub fn validate(&self) -> Result<PromptInput, FieldErrors> {
        PromptInput {
            title: self.title.clone(),
            body: self.body.clone(),
            tags: parse_tag_csv(&self.tags_csv),
        }
        .validate()
    }
}

/// Validated payload sent to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptInput {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub title: Option<String>,
    pub body: Option<String>,
    pub tags: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none() && self.tags.is_none()
    }

    /// The first message in field order, used when only one line can be shown.
    pub fn first_message(&self) -> Option<&str> {
        self.title
            .as_deref()
            .or(self.body.as_deref())
            .or(self.tags.as_deref())
    }
}

impl PromptInput {
    /// Trims every field and checks the limits. Lengths are counted in characters.
    pub fn validate(self) -> Result<PromptInput, FieldErrors> {
        let title = self.title.trim().to_string();
        let body = self.body.trim().to_string();
        let tags: Vec<String> = self.tags.iter().map(|t| t.trim().to_string()).collect();

        let mut errors = FieldErrors::default();

        if title.is_empty() {
            errors.title = Some("Title is required".to_string());
        } else if title.chars().count() > MAX_TITLE_CHARS {
            errors.title = Some(format!("Title must be at most {MAX_TITLE_CHARS} characters"));
        }

        if body.is_empty() {
            errors.body = Some("Body is required".to_string());
        } else if body.chars().count() > MAX_BODY_CHARS {
            errors.body = Some(format!("Body must be at most {MAX_BODY_CHARS} characters"));
        }

        if tags.iter().any(|t| t.is_empty()) {
            errors.tags = Some("Tags cannot be empty".to_string());
        } else if tags.iter().any(|t| t.chars().count() > MAX_TAG_CHARS) {
            errors.tags = Some(format!("Each tag must be at most {MAX_TAG_CHARS} characters"));
        } else if tags.len() > MAX_TAGS {
            errors.tags = Some(format!("At most {MAX_TAGS} tags are allowed"));
        }

        if errors.is_empty() {
            Ok(PromptInput { title, body, tags })
        } else {
            Err(errors)
        }
    }
}

/// Splits comma-separated tags, trimming each and dropping empty entries.
pub fn parse_tag_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
