//! Stable automation identifiers for interactive elements.
//!
//! These never depend on visible, localized text. Per-placeholder identifiers are
//! derived from the key through [`slugify`].

use crate::lines::LineTransform;

pub const CREATE_BUTTON: &str = "pv-create-button";
pub const SEARCH_INPUT: &str = "pv-search-input";
pub const SEARCH_RESULT_ITEM: &str = "pv-search-result-item";
pub const SEARCH_RESULT_PIN_BUTTON: &str = "pv-search-result-pin-button";
pub const SPLITTER_HANDLE: &str = "pv-splitter-handle";
pub const TITLE_INPUT: &str = "pv-title-input";
pub const BODY_INPUT: &str = "pv-body-input";
pub const TAGS_INPUT: &str = "pv-tags-input";
pub const SAVE_BUTTON: &str = "pv-save-button";
pub const CANCEL_BUTTON: &str = "pv-cancel-button";
pub const EDIT_BUTTON: &str = "pv-edit-button";
pub const DELETE_BUTTON: &str = "pv-delete-button";
pub const LOGOUT_BUTTON: &str = "pv-logout-button";
pub const PREVIEW_TAB_RENDERED: &str = "pv-preview-tab-rendered";
pub const PREVIEW_TAB_ORIGINAL: &str = "pv-preview-tab-original";
pub const COPY_BODY_BUTTON: &str = "pv-copy-body";
pub const COPY_MARKDOWN_BUTTON: &str = "pv-copy-markdown";
pub const CLEAR_PLACEHOLDERS_BUTTON: &str = "pv-clear-placeholders";
pub const FILL_PLACEHOLDER_EXAMPLES_BUTTON: &str = "pv-fill-placeholder-examples";

/// Lowercases and collapses every run of non-alphanumeric characters into one `-`,
/// trimming separators at both ends.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;

    for c in value.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        } else {
            pending_separator = true;
        }
    }

    slug
}

pub fn placeholder_input(key: &str) -> String {
    format!("pv-placeholder-input-{}", slugify(key))
}

pub fn placeholder_log_line_count(key: &str) -> String {
    format!("pv-placeholder-log-line-count-{}", slugify(key))
}

pub fn placeholder_log_action(key: &str, transform: LineTransform) -> String {
    format!("pv-placeholder-log-{}-{}", transform.selector_name(), slugify(key))
}

pub fn placeholder_log_undo(key: &str) -> String {
    format!("pv-placeholder-log-undo-{}", slugify(key))
}

pub fn toast(success: bool) -> &'static str {
    if success { "pv-toast-success" } else { "pv-toast-error" }
}
