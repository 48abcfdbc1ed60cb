//! Prompts shown in the public, read-only demo.

use chrono::{DateTime, TimeZone, Utc};

use crate::prompt::{Prompt, PromptMetadata, sort_for_listing};

fn timestamp(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

fn demo_prompt(
    id: &str,
    title: &str,
    tags: &[&str],
    body: &str,
    updated: i64,
    pinned: Option<i64>,
) -> Prompt {
    let mut metadata = PromptMetadata::new(
        id.to_string(),
        title.to_string(),
        tags.iter().map(|t| t.to_string()).collect(),
        timestamp(updated),
    );
    metadata.pinned_at = pinned.map(timestamp);
    Prompt::new(metadata, body.to_string())
}

/// The demo collection, in listing order.
pub fn demo_prompts() -> Vec<Prompt> {
    let mut prompts = vec![
        demo_prompt(
            "demo-debug-error",
            "Debug a failing build",
            &["debug", "rust"],
            "I am working on {{project_name}}. The build fails with the output below.\n\n\
             ```\n{{error_logs}}\n```\n\n\
             Explain the root cause and suggest the smallest fix.",
            1_735_689_600,
            Some(1_735_776_000),
        ),
        demo_prompt(
            "demo-code-review",
            "Code review",
            &["review"],
            "Review the following {{language}} change for correctness and readability.\n\n\
             {{diff_text}}\n\nFocus on: {{focus}}",
            1_735_862_400,
            None,
        ),
        demo_prompt(
            "demo-release-notes",
            "Release notes",
            &["writing", "release"],
            "Write release notes for version {{version}} of {{project_name}}.\n\n\
             Changes:\n{{release_notes}}",
            1_735_603_200,
            None,
        ),
    ];
    sort_for_listing(&mut prompts);
    prompts
}
