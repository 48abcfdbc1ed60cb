//! # Vault Interaction Controller
//!
//! Owns every piece of transient state behind the prompt list, editor and previewer:
//! selection, search, the create/edit form, placeholder values and their undo
//! snapshots, the preview tab, notifications and the pane width.
//!
//! Handlers run to completion one at a time. Persistence calls borrow the controller
//! mutably for their whole duration, so two mutations can never overlap; the pending
//! action is exposed so a UI can disable the triggering control meanwhile.
//!
//! In a read-only (demo) context the mutating handlers return immediately without
//! touching the store, and their controls are left out of [`VaultController::controls`].

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::action::ActionError;
use crate::config::VaultSettings;
use crate::field_schema::{FieldSchemaRegistry, is_logs_key};
use crate::lines::{LineTransform, line_count};
use crate::local_store::{
    LocalStorage, RenderContext, clear_placeholder_values, load_pane_width, load_placeholder_values,
    save_pane_width, save_placeholder_values,
};
use crate::pane::{PaneResize, PointerId, ResizeOutcome};
use crate::prompt::{FieldErrors, Prompt, PromptForm};
use crate::registry::{Clipboard, PromptStore, Session};
use crate::selectors;
use crate::shortcuts::{KeyPress, Shortcut, shortcut_for};
use crate::template::{PlaceholderValues, PreviewSegment, Template};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    Creating,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewTab {
    #[default]
    Rendered,
    Original,
}

impl PreviewTab {
    pub fn selector(self) -> &'static str {
        match self {
            PreviewTab::Rendered => selectors::PREVIEW_TAB_RENDERED,
            PreviewTab::Original => selectors::PREVIEW_TAB_ORIGINAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub variant: ToastVariant,
    pub expires_at: Instant,
}

impl Toast {
    pub fn selector(&self) -> &'static str {
        selectors::toast(self.variant == ToastVariant::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingAction {
    Save,
    Delete,
    TogglePin,
    Logout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Create,
    Search,
    SelectPrompt,
    Splitter,
    Edit,
    Delete,
    Pin,
    Logout,
    TitleInput,
    BodyInput,
    TagsInput,
    Save,
    Cancel,
    RenderedTab,
    OriginalTab,
    CopyBody,
    CopyMarkdown,
    ClearPlaceholders,
    FillExamples,
}

impl Control {
    pub fn selector(self) -> &'static str {
        match self {
            Control::Create => selectors::CREATE_BUTTON,
            Control::Search => selectors::SEARCH_INPUT,
            Control::SelectPrompt => selectors::SEARCH_RESULT_ITEM,
            Control::Splitter => selectors::SPLITTER_HANDLE,
            Control::Edit => selectors::EDIT_BUTTON,
            Control::Delete => selectors::DELETE_BUTTON,
            Control::Pin => selectors::SEARCH_RESULT_PIN_BUTTON,
            Control::Logout => selectors::LOGOUT_BUTTON,
            Control::TitleInput => selectors::TITLE_INPUT,
            Control::BodyInput => selectors::BODY_INPUT,
            Control::TagsInput => selectors::TAGS_INPUT,
            Control::Save => selectors::SAVE_BUTTON,
            Control::Cancel => selectors::CANCEL_BUTTON,
            Control::RenderedTab => PreviewTab::Rendered.selector(),
            Control::OriginalTab => PreviewTab::Original.selector(),
            Control::CopyBody => selectors::COPY_BODY_BUTTON,
            Control::CopyMarkdown => selectors::COPY_MARKDOWN_BUTTON,
            Control::ClearPlaceholders => selectors::CLEAR_PLACEHOLDERS_BUTTON,
            Control::FillExamples => selectors::FILL_PLACEHOLDER_EXAMPLES_BUTTON,
        }
    }

    fn mutates(self) -> bool {
        matches!(
            self,
            Control::Create
                | Control::Edit
                | Control::Delete
                | Control::Pin
                | Control::Logout
                | Control::TitleInput
                | Control::BodyInput
                | Control::TagsInput
                | Control::Save
                | Control::Cancel
        )
    }

    fn form_only(self) -> bool {
        matches!(
            self,
            Control::TitleInput
                | Control::BodyInput
                | Control::TagsInput
                | Control::Save
                | Control::Cancel
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlState {
    pub control: Control,
    pub enabled: bool,
}

/// Trimming tools shown under a long-text field of the logs family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTools {
    pub line_count: usize,
    pub can_undo: bool,
    pub line_count_selector: String,
    pub head_selector: String,
    pub tail_selector: String,
    pub head_tail_selector: String,
    pub undo_selector: String,
}

/// Everything needed to draw one placeholder input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderField {
    pub key: String,
    pub label: String,
    pub hint: String,
    pub multiline: bool,
    pub value: String,
    pub input_selector: String,
    pub log_tools: Option<LogTools>,
}

pub struct VaultController<S, L> {
    context: RenderContext,
    settings: VaultSettings,
    schemas: FieldSchemaRegistry,
    store: S,
    local: L,

    prompts: Vec<Prompt>,
    selected_id: Option<String>,
    previous_selection: Option<String>,
    search: String,
    mode: Mode,
    form: PromptForm,
    field_errors: FieldErrors,
    form_error: Option<String>,

    values: PlaceholderValues,
    undo: BTreeMap<String, String>,
    active_key: Option<String>,
    preview_tab: PreviewTab,
    toast: Option<Toast>,

    pane_width: f64,
    resize: PaneResize,
    pending: Option<PendingAction>,
}

impl<S: PromptStore, L: LocalStorage> VaultController<S, L> {
    /// Builds the controller over the initial collection (already in listing order) and
    /// restores the persisted placeholder values and pane width for `context`.
    pub fn new(
        context: RenderContext,
        prompts: Vec<Prompt>,
        store: S,
        mut local: L,
        settings: VaultSettings,
    ) -> Self {
        let first = prompts.first();
        let selected_id = first.map(|p| p.id().to_string());
        let form = first.map(PromptForm::from_prompt).unwrap_or_default();
        let mode = if !context.is_read_only() && prompts.is_empty() {
            Mode::Creating
        } else {
            Mode::Browsing
        };

        let values = load_placeholder_values(&mut local, context);
        let pane_width = load_pane_width(&local)
            .map(|w| settings.pane.clamp(w))
            .unwrap_or(settings.pane.default);

        debug!(
            scope = context.scope(),
            prompts = prompts.len(),
            restored_values = values.len(),
            "vault controller mounted"
        );

        Self {
            context,
            schemas: settings.field_schema_registry(),
            settings,
            store,
            local,
            prompts,
            selected_id,
            previous_selection: None,
            search: String::new(),
            mode,
            form,
            field_errors: FieldErrors::default(),
            form_error: None,
            values,
            undo: BTreeMap::new(),
            active_key: None,
            preview_tab: PreviewTab::Rendered,
            toast: None,
            pane_width,
            resize: PaneResize::Idle,
            pending: None,
        }
    }

    pub fn context(&self) -> RenderContext {
        self.context
    }

    pub fn is_read_only(&self) -> bool {
        self.context.is_read_only()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_form_mode(&self) -> bool {
        matches!(self.mode, Mode::Creating | Mode::Editing)
    }

    pub fn prompts(&self) -> &[Prompt] {
        &self.prompts
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn selected_prompt(&self) -> Option<&Prompt> {
        let id = self.selected_id.as_deref()?;
        self.prompts.iter().find(|p| p.id() == id)
    }

    pub fn form(&self) -> &PromptForm {
        &self.form
    }

    pub fn field_errors(&self) -> &FieldErrors {
        &self.field_errors
    }

    pub fn form_error(&self) -> Option<&str> {
        self.form_error.as_deref()
    }

    pub fn values(&self) -> &PlaceholderValues {
        &self.values
    }

    pub fn value(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn active_key(&self) -> Option<&str> {
        self.active_key.as_deref()
    }

    pub fn preview_tab(&self) -> PreviewTab {
        self.preview_tab
    }

    pub fn pane_width(&self) -> f64 {
        self.pane_width
    }

    pub fn pending(&self) -> Option<PendingAction> {
        self.pending
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn local_storage(&self) -> &L {
        &self.local
    }

    // Search

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: &str) {
        self.search = query.to_string();
    }

    pub fn filtered_prompts(&self) -> Vec<&Prompt> {
        self.prompts
            .iter()
            .filter(|p| p.matches_query(&self.search))
            .collect()
    }

    // Mode transitions

    /// Selects a prompt from the list. Returns `false` for an unknown id.
    pub fn select(&mut self, id: &str) -> bool {
        if !self.prompts.iter().any(|p| p.id() == id) {
            return false;
        }
        self.select_prompt(id);
        true
    }

    fn select_prompt(&mut self, id: &str) {
        self.selected_id = Some(id.to_string());
        self.previous_selection = None;
        self.mode = Mode::Browsing;
        self.active_key = None;
        self.form = self
            .prompts
            .iter()
            .find(|p| p.id() == id)
            .map(PromptForm::from_prompt)
            .unwrap_or_default();
        self.preview_tab = PreviewTab::Rendered;
        self.values.clear();
        self.undo.clear();
        self.persist_values();
        self.toast = None;
        self.reset_form_errors();
    }

    pub fn start_create(&mut self) -> bool {
        if self.is_read_only() {
            return false;
        }
        self.previous_selection = self.selected_id.take().or(self.previous_selection.take());
        self.mode = Mode::Creating;
        self.active_key = None;
        self.form = PromptForm::default();
        self.values.clear();
        self.undo.clear();
        self.persist_values();
        self.toast = None;
        self.reset_form_errors();
        true
    }

    pub fn start_edit(&mut self) -> bool {
        if self.is_read_only() {
            return false;
        }
        let Some(form) = self.selected_prompt().map(PromptForm::from_prompt) else {
            return false;
        };
        self.mode = Mode::Editing;
        self.form = form;
        self.reset_form_errors();
        true
    }

    pub fn cancel(&mut self) -> bool {
        match self.mode {
            Mode::Browsing => false,
            Mode::Editing => {
                if let Some(id) = self.selected_id.clone() {
                    self.select_prompt(&id);
                } else {
                    self.mode = Mode::Browsing;
                }
                true
            }
            Mode::Creating => {
                let previous = self
                    .previous_selection
                    .take()
                    .filter(|id| self.prompts.iter().any(|p| p.id() == id.as_str()));
                match previous {
                    Some(id) => self.select_prompt(&id),
                    None => {
                        self.mode = Mode::Browsing;
                        self.selected_id = None;
                        self.form = PromptForm::default();
                        self.reset_form_errors();
                    }
                }
                true
            }
        }
    }

    // Form

    pub fn set_title(&mut self, title: &str) {
        self.form.title = title.to_string();
    }

    pub fn set_body(&mut self, body: &str) {
        self.form.body = body.to_string();
    }

    pub fn set_tags_csv(&mut self, tags_csv: &str) {
        self.form.tags_csv = tags_csv.to_string();
    }

    fn reset_form_errors(&mut self) {
        self.form_error = None;
        self.field_errors = FieldErrors::default();
    }

    fn fail(&mut self, action: &str, err: ActionError) {
        warn!(action, code = %err.code, "collaborator call failed");
        self.form_error = Some(err.message);
    }

    /// Validates the form and creates or updates the prompt.
    ///
    /// Invalid input records per-field errors and never reaches the store.
    pub async fn save(&mut self) -> bool {
        if self.is_read_only() || !self.is_form_mode() || self.pending.is_some() {
            return false;
        }
        self.reset_form_errors();

        let input = match self.form.validate() {
            Ok(input) => input,
            Err(errors) => {
                debug!(?errors, "form validation failed");
                self.field_errors = errors;
                return false;
            }
        };

        if self.mode == Mode::Creating {
            self.pending = Some(PendingAction::Save);
            let result = self.store.create_prompt(input).await;
            self.pending = None;

            return match result {
                Ok(prompt) => {
                    info!(id = prompt.id(), "prompt created");
                    let id = prompt.id().to_string();
                    self.prompts.insert(0, prompt);
                    self.select_prompt(&id);
                    true
                }
                Err(err) => {
                    self.fail("create", err);
                    false
                }
            };
        }

        let Some(id) = self.selected_id.clone() else {
            self.form_error = Some("No prompt is selected for update".to_string());
            return false;
        };

        self.pending = Some(PendingAction::Save);
        let result = self.store.update_prompt(&id, input).await;
        self.pending = None;

        match result {
            Ok(prompt) => {
                info!(id = prompt.id(), "prompt updated");
                let new_id = prompt.id().to_string();
                if let Some(slot) = self.prompts.iter_mut().find(|p| p.id() == id) {
                    *slot = prompt;
                }
                self.select_prompt(&new_id);
                true
            }
            Err(err) => {
                self.fail("update", err);
                false
            }
        }
    }

    pub async fn delete(&mut self, id: &str) -> bool {
        if self.is_read_only() || self.pending.is_some() {
            return false;
        }
        self.form_error = None;

        self.pending = Some(PendingAction::Delete);
        let result = self.store.delete_prompt(id).await;
        self.pending = None;

        if let Err(err) = result {
            self.fail("delete", err);
            return false;
        }

        info!(id, "prompt deleted");
        self.prompts.retain(|p| p.id() != id);
        match self.prompts.first().map(|p| p.id().to_string()) {
            Some(next) => self.select_prompt(&next),
            None => {
                self.selected_id = None;
                self.previous_selection = None;
                self.mode = Mode::Browsing;
                self.form = PromptForm::default();
            }
        }
        true
    }

    pub async fn toggle_pin(&mut self, id: &str) -> bool {
        if self.is_read_only() || self.pending.is_some() {
            return false;
        }
        self.form_error = None;

        self.pending = Some(PendingAction::TogglePin);
        let result = self.store.toggle_pin(id).await;
        self.pending = None;

        match result {
            Ok(prompts) => {
                self.prompts = prompts;
                true
            }
            Err(err) => {
                self.fail("toggle_pin", err);
                false
            }
        }
    }

    /// Signs out. Returns `true` when the caller should navigate away.
    pub async fn logout<A: Session>(&mut self, session: &mut A) -> bool {
        if self.is_read_only() || self.pending.is_some() {
            return false;
        }
        self.pending = Some(PendingAction::Logout);
        session.sign_out().await;
        self.pending = None;
        info!("signed out");
        true
    }

    // Preview

    /// The body the placeholders come from: the selected prompt, or the form while
    /// nothing is selected.
    pub fn preview_body(&self) -> &str {
        match self.selected_prompt() {
            Some(prompt) => &prompt.body,
            None => &self.form.body,
        }
    }

    pub fn placeholders(&self) -> Vec<String> {
        Template::parse(self.preview_body())
            .placeholders()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn rendered(&self) -> String {
        Template::parse(self.preview_body()).render(&self.values)
    }

    pub fn preview_segments(&self) -> Vec<PreviewSegment> {
        Template::parse(self.preview_body()).preview(&self.values, self.active_key.as_deref())
    }

    pub fn set_preview_tab(&mut self, tab: PreviewTab) {
        self.preview_tab = tab;
    }

    // Placeholder values

    pub fn placeholder_fields(&self) -> Vec<PlaceholderField> {
        self.placeholders()
            .into_iter()
            .map(|key| self.placeholder_field(key))
            .collect()
    }

    fn placeholder_field(&self, key: String) -> PlaceholderField {
        let class = self.schemas.classify(&key);
        let schema = self.schemas.get(&key);
        let multiline = class.is_multiline();
        let value = self.value(&key).to_string();

        let log_tools = (multiline && is_logs_key(&key)).then(|| LogTools {
            line_count: line_count(&value),
            can_undo: self.can_undo(&key),
            line_count_selector: selectors::placeholder_log_line_count(&key),
            head_selector: selectors::placeholder_log_action(&key, LineTransform::Head),
            tail_selector: selectors::placeholder_log_action(&key, LineTransform::Tail),
            head_tail_selector: selectors::placeholder_log_action(&key, LineTransform::HeadAndTail),
            undo_selector: selectors::placeholder_log_undo(&key),
        });

        let label = schema
            .and_then(|s| s.label.clone())
            .unwrap_or_else(|| format!("{{{{{key}}}}}"));
        let hint = schema.and_then(|s| s.placeholder.clone()).unwrap_or_else(|| {
            if multiline {
                "Supports multiple lines".to_string()
            } else {
                "Enter a value".to_string()
            }
        });

        PlaceholderField {
            input_selector: selectors::placeholder_input(&key),
            label,
            hint,
            multiline,
            value,
            log_tools,
            key,
        }
    }

    /// A manual edit. Leaves any undo snapshot for the key in place.
    pub fn set_value(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.persist_values();
    }

    pub fn focus_placeholder(&mut self, key: &str) {
        self.active_key = Some(key.to_string());
    }

    pub fn blur_placeholder(&mut self) {
        self.active_key = None;
    }

    /// Trims a value. A transform that changes nothing records nothing.
    ///
    /// The first trim since the last undo keeps the original text, so a chain of
    /// trims is reverted in a single undo step.
    pub fn apply_transform(&mut self, key: &str, transform: LineTransform) -> bool {
        let current = self.value(key).to_string();
        let next = transform.apply(&current, self.settings.trim_lines);
        if next == current {
            return false;
        }
        debug!(
            key,
            ?transform,
            before = line_count(&current),
            after = line_count(&next),
            "trimmed value"
        );
        self.undo.entry(key.to_string()).or_insert(current);
        self.values.insert(key.to_string(), next);
        self.persist_values();
        true
    }

    pub fn can_undo(&self, key: &str) -> bool {
        self.undo.contains_key(key)
    }

    pub fn undo(&mut self, key: &str) -> bool {
        let Some(previous) = self.undo.remove(key) else {
            return false;
        };
        self.values.insert(key.to_string(), previous);
        self.persist_values();
        true
    }

    fn blank_keys_with_examples(&self) -> Vec<(String, String)> {
        self.placeholders()
            .into_iter()
            .filter(|key| self.value(key).trim().is_empty())
            .filter_map(|key| {
                let example = self.schemas.get(&key)?.example()?.to_string();
                Some((key, example))
            })
            .collect()
    }

    pub fn can_fill_examples(&self) -> bool {
        !self.blank_keys_with_examples().is_empty()
    }

    /// Fills blank placeholders that have an example. Non-blank values are kept.
    pub fn fill_examples(&mut self) -> bool {
        let fills = self.blank_keys_with_examples();
        if fills.is_empty() {
            return false;
        }
        self.values.extend(fills);
        self.persist_values();
        true
    }

    pub fn can_clear(&self) -> bool {
        self.placeholders().iter().any(|key| !self.value(key).is_empty())
    }

    /// Empties every value and undo snapshot and drops the persisted entry.
    pub fn clear_all(&mut self) {
        self.values.clear();
        self.undo.clear();
        if let Err(e) = clear_placeholder_values(&mut self.local, self.context) {
            warn!(error = %e, "failed to clear stored placeholder values");
        }
    }

    fn persist_values(&mut self) {
        if let Err(e) = save_placeholder_values(&mut self.local, self.context, &self.values) {
            warn!(error = %e, "failed to persist placeholder values");
        }
    }

    // Clipboard

    pub fn fenced_text(&self) -> String {
        format!("```\n{}\n```", self.rendered())
    }

    pub fn copy_plain<C: Clipboard>(&mut self, clipboard: &mut C) -> bool {
        let text = self.rendered();
        self.copy(clipboard, &text, "Copied the prompt", "Could not copy the prompt")
    }

    pub fn copy_fenced<C: Clipboard>(&mut self, clipboard: &mut C) -> bool {
        let text = self.fenced_text();
        self.copy(clipboard, &text, "Copied as a Markdown code block", "Could not copy as Markdown")
    }

    fn copy<C: Clipboard>(
        &mut self,
        clipboard: &mut C,
        text: &str,
        ok: &str,
        failed: &str,
    ) -> bool {
        match clipboard.write_text(text) {
            Ok(()) => {
                self.show_toast(ok, ToastVariant::Success);
                true
            }
            Err(e) => {
                warn!(error = %e, "clipboard write failed");
                self.show_toast(failed, ToastVariant::Error);
                false
            }
        }
    }

    // Keyboard

    /// Runs the global shortcut bound to `press`, if any. Focusing the search box is
    /// left to the caller.
    pub fn handle_key<C: Clipboard>(
        &mut self,
        press: &KeyPress,
        clipboard: &mut C,
    ) -> Option<Shortcut> {
        let shortcut = shortcut_for(press)?;
        if shortcut == Shortcut::CopyRendered {
            self.copy_plain(clipboard);
        }
        Some(shortcut)
    }

    // Notifications

    /// Shows a notification, replacing any current one and restarting its timer.
    pub fn show_toast(&mut self, message: &str, variant: ToastVariant) {
        self.toast = Some(Toast {
            message: message.to_string(),
            variant,
            expires_at: Instant::now() + self.settings.toast_duration(),
        });
    }

    pub fn toast(&self) -> Option<&Toast> {
        self.toast.as_ref()
    }

    pub fn dismiss_toast(&mut self) {
        self.toast = None;
    }

    pub fn dismiss_expired(&mut self, now: Instant) {
        if self.toast.as_ref().is_some_and(|t| t.expires_at <= now) {
            self.toast = None;
        }
    }

    // Pane resizing

    pub fn pointer_down(&mut self, pointer_id: PointerId, button: u16, x: f64) -> bool {
        self.resize.pointer_down(pointer_id, button, x, self.pane_width) == ResizeOutcome::Started
    }

    pub fn pointer_move(&mut self, pointer_id: PointerId, x: f64) {
        let outcome = self.resize.pointer_move(pointer_id, x, &self.settings.pane);
        self.apply_resize(outcome);
    }

    pub fn pointer_up(&mut self, pointer_id: PointerId, x: f64) {
        let outcome = self.resize.pointer_up(pointer_id, x, &self.settings.pane);
        self.apply_resize(outcome);
    }

    pub fn pointer_cancel(&mut self, pointer_id: PointerId) {
        let outcome = self.resize.pointer_cancel(pointer_id, self.pane_width, &self.settings.pane);
        self.apply_resize(outcome);
    }

    fn apply_resize(&mut self, outcome: ResizeOutcome) {
        match outcome {
            ResizeOutcome::Resized(width) => self.pane_width = width,
            ResizeOutcome::Finished(width) => {
                self.pane_width = width;
                if let Err(e) = save_pane_width(&mut self.local, width) {
                    warn!(error = %e, "failed to persist pane width");
                }
            }
            ResizeOutcome::Ignored | ResizeOutcome::Started => {}
        }
    }

    // Controls

    /// Controls present on screen right now. Mutating controls are absent in a
    /// read-only context, form controls outside the form.
    pub fn controls(&self) -> Vec<ControlState> {
        let idle = self.pending.is_none();
        let has_selection = self.selected_prompt().is_some();
        let has_preview = has_selection || !self.form.body.is_empty();
        let in_form = self.is_form_mode();

        let candidates = [
            (Control::Create, idle),
            (Control::Search, true),
            (Control::SelectPrompt, !self.filtered_prompts().is_empty()),
            (Control::Splitter, true),
            (Control::Logout, idle),
            (Control::Pin, idle && !self.prompts.is_empty()),
            (Control::Edit, idle && has_selection && !in_form),
            (Control::Delete, idle && has_selection),
            (Control::TitleInput, true),
            (Control::BodyInput, true),
            (Control::TagsInput, true),
            (Control::Save, idle),
            (Control::Cancel, idle),
            (Control::RenderedTab, has_preview),
            (Control::OriginalTab, has_preview),
            (Control::CopyBody, has_preview),
            (Control::CopyMarkdown, has_preview),
            (Control::ClearPlaceholders, self.can_clear()),
            (Control::FillExamples, self.can_fill_examples()),
        ];

        candidates
            .into_iter()
            .filter(|(control, _)| !(self.is_read_only() && control.mutates()))
            .filter(|(control, _)| in_form || !control.form_only())
            .map(|(control, enabled)| ControlState { control, enabled })
            .collect()
    }

    /// Whether `control` is on screen and enabled.
    pub fn is_available(&self, control: Control) -> bool {
        self.controls()
            .iter()
            .any(|state| state.control == control && state.enabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionResult, ErrorCode};
    use crate::local_store::{MemoryStorage, placeholder_values_key};
    use crate::pane::PRIMARY_BUTTON;
    use crate::prompt::{PromptInput, PromptMetadata, sort_for_listing};
    use crate::registry::ReadOnlyStore;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    fn prompt(id: &str, title: &str, body: &str) -> Prompt {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        Prompt::new(
            PromptMetadata::new(id.to_string(), title.to_string(), vec!["tag".to_string()], now),
            body.to_string(),
        )
    }

    #[derive(Default)]
    struct RecordingStore {
        calls: Vec<String>,
        fail_with: Option<ActionError>,
        next_id: usize,
        prompts: Vec<Prompt>,
    }

    impl RecordingStore {
        fn failing(code: ErrorCode, message: &str) -> Self {
            Self {
                fail_with: Some(ActionError::new(code, message)),
                ..Self::default()
            }
        }

        fn check(&mut self, call: String) -> ActionResult<()> {
            self.calls.push(call);
            match &self.fail_with {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    impl PromptStore for RecordingStore {
        async fn create_prompt(&mut self, input: PromptInput) -> ActionResult<Prompt> {
            self.check(format!("create:{}", input.title))?;
            self.next_id += 1;
            Ok(prompt(&format!("new-{}", self.next_id), &input.title, &input.body))
        }

        async fn update_prompt(&mut self, id: &str, input: PromptInput) -> ActionResult<Prompt> {
            self.check(format!("update:{id}"))?;
            Ok(prompt(id, &input.title, &input.body))
        }

        async fn delete_prompt(&mut self, id: &str) -> ActionResult<String> {
            self.check(format!("delete:{id}"))?;
            Ok(id.to_string())
        }

        async fn toggle_pin(&mut self, id: &str) -> ActionResult<Vec<Prompt>> {
            self.check(format!("pin:{id}"))?;
            let mut prompts = self.prompts.clone();
            if let Some(p) = prompts.iter_mut().find(|p| p.id() == id) {
                p.metadata.pinned_at = Some(Utc::now());
            }
            sort_for_listing(&mut prompts);
            Ok(prompts)
        }
    }

    #[derive(Default)]
    struct RecordingSession {
        signed_out: bool,
    }

    impl Session for RecordingSession {
        async fn sign_out(&mut self) {
            self.signed_out = true;
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("clipboard unavailable")]
    struct ClipboardUnavailable;

    #[derive(Default)]
    struct FakeClipboard {
        text: Option<String>,
        broken: bool,
    }

    impl Clipboard for FakeClipboard {
        type Error = ClipboardUnavailable;

        fn write_text(&mut self, text: &str) -> Result<(), Self::Error> {
            if self.broken {
                return Err(ClipboardUnavailable);
            }
            self.text = Some(text.to_string());
            Ok(())
        }
    }

    fn sample_prompts() -> Vec<Prompt> {
        vec![
            prompt("p1", "Debug build", "Fix {{project}}:\n{{error_logs}}"),
            prompt("p2", "Review", "Review {{diff_text}} in {{language}}"),
        ]
    }

    fn controller(prompts: Vec<Prompt>) -> VaultController<RecordingStore, MemoryStorage> {
        let store = RecordingStore {
            prompts: prompts.clone(),
            ..RecordingStore::default()
        };
        VaultController::new(
            RenderContext::SignedIn,
            prompts,
            store,
            MemoryStorage::new(),
            VaultSettings::default(),
        )
    }

    fn numbered(count: usize) -> String {
        (1..=count).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_initial_state_selects_first_prompt() {
        let vault = controller(sample_prompts());
        assert_eq!(vault.mode(), Mode::Browsing);
        assert_eq!(vault.selected_id(), Some("p1"));
        assert_eq!(vault.form().title, "Debug build");
        assert_eq!(vault.placeholders(), vec!["project", "error_logs"]);
    }

    #[test]
    fn test_initial_state_empty_collection_starts_creating() {
        let vault = controller(vec![]);
        assert_eq!(vault.mode(), Mode::Creating);
        assert_eq!(vault.selected_id(), None);
    }

    #[test]
    fn test_select_resets_values_undo_and_tab() {
        let mut vault = controller(sample_prompts());
        vault.set_value("error_logs", &numbered(120));
        vault.apply_transform("error_logs", LineTransform::Head);
        vault.set_preview_tab(PreviewTab::Original);

        assert!(vault.select("p2"));
        assert_eq!(vault.mode(), Mode::Browsing);
        assert!(vault.values().is_empty());
        assert!(!vault.can_undo("error_logs"));
        assert_eq!(vault.preview_tab(), PreviewTab::Rendered);
        assert_eq!(vault.form().title, "Review");
        assert!(!vault.select("missing"));
    }

    #[test]
    fn test_render_updates_with_values() {
        let mut vault = controller(sample_prompts());
        assert_eq!(vault.rendered(), "Fix :\n");
        vault.set_value("project", "pvault");
        assert_eq!(vault.rendered(), "Fix pvault:\n");
    }

    #[test]
    fn test_search_filters_title_and_tags() {
        let mut vault = controller(sample_prompts());
        vault.set_search("REVIEW");
        let ids: Vec<&str> = vault.filtered_prompts().into_iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec!["p2"]);
        vault.set_search("tag");
        assert_eq!(vault.filtered_prompts().len(), 2);
        vault.set_search("   ");
        assert_eq!(vault.filtered_prompts().len(), 2);
    }

    #[test]
    fn test_create_then_cancel_reselects_previous() {
        let mut vault = controller(sample_prompts());
        vault.select("p2");
        assert!(vault.start_create());
        assert_eq!(vault.mode(), Mode::Creating);
        assert_eq!(vault.selected_id(), None);
        assert_eq!(vault.form(), &PromptForm::default());

        assert!(vault.cancel());
        assert_eq!(vault.mode(), Mode::Browsing);
        assert_eq!(vault.selected_id(), Some("p2"));
    }

    #[test]
    fn test_cancel_create_without_previous_selection() {
        let mut vault = controller(vec![]);
        assert!(vault.cancel());
        assert_eq!(vault.mode(), Mode::Browsing);
        assert_eq!(vault.selected_id(), None);
    }

    #[test]
    fn test_edit_prefills_and_cancel_restores() {
        let mut vault = controller(sample_prompts());
        assert!(vault.start_edit());
        assert_eq!(vault.mode(), Mode::Editing);
        vault.set_title("Changed");
        assert!(vault.cancel());
        assert_eq!(vault.mode(), Mode::Browsing);
        assert_eq!(vault.form().title, "Debug build");
    }

    #[test]
    fn test_edit_requires_selection() {
        let mut vault = controller(vec![]);
        assert!(!vault.start_edit());
    }

    #[tokio::test]
    async fn test_create_prepends_and_selects() {
        let mut vault = controller(sample_prompts());
        vault.start_create();
        vault.set_title("  Summarize  ");
        vault.set_body("Summarize {{notes}}");
        vault.set_tags_csv("a, ,b");

        assert!(vault.save().await);
        assert_eq!(vault.store().calls, vec!["create:Summarize"]);
        assert_eq!(vault.prompts()[0].id(), "new-1");
        assert_eq!(vault.selected_id(), Some("new-1"));
        assert_eq!(vault.mode(), Mode::Browsing);
        assert_eq!(vault.pending(), None);
    }

    #[tokio::test]
    async fn test_invalid_form_never_calls_store() {
        let mut vault = controller(sample_prompts());
        vault.start_create();
        vault.set_body(&"x".repeat(10_001));

        assert!(!vault.save().await);
        assert!(vault.store().calls.is_empty());
        assert_eq!(vault.field_errors().title.as_deref(), Some("Title is required"));
        assert!(vault.field_errors().body.is_some());
        assert_eq!(vault.mode(), Mode::Creating);
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let mut vault = controller(sample_prompts());
        vault.select("p2");
        vault.start_edit();
        vault.set_title("Review v2");

        assert!(vault.save().await);
        assert_eq!(vault.prompts().len(), 2);
        assert_eq!(vault.prompts()[1].title(), "Review v2");
        assert_eq!(vault.selected_id(), Some("p2"));
        assert_eq!(vault.mode(), Mode::Browsing);
    }

    #[tokio::test]
    async fn test_collaborator_error_is_surfaced_verbatim() {
        let store = RecordingStore::failing(ErrorCode::DbError, "Failed to save the prompt");
        let mut vault = VaultController::new(
            RenderContext::SignedIn,
            sample_prompts(),
            store,
            MemoryStorage::new(),
            VaultSettings::default(),
        );
        vault.start_edit();
        vault.set_title("Changed");

        assert!(!vault.save().await);
        assert_eq!(vault.form_error(), Some("Failed to save the prompt"));
        assert_eq!(vault.mode(), Mode::Editing);
        assert_eq!(vault.prompts()[0].title(), "Debug build");

        assert!(!vault.delete("p1").await);
        assert_eq!(vault.prompts().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_selects_first_remaining() {
        let mut vault = controller(sample_prompts());
        assert!(vault.delete("p1").await);
        assert_eq!(vault.selected_id(), Some("p2"));

        assert!(vault.delete("p2").await);
        assert_eq!(vault.selected_id(), None);
        assert_eq!(vault.mode(), Mode::Browsing);
        assert_eq!(vault.form(), &PromptForm::default());
    }

    #[tokio::test]
    async fn test_toggle_pin_replaces_collection() {
        let mut vault = controller(sample_prompts());
        assert!(vault.toggle_pin("p2").await);
        assert_eq!(vault.prompts()[0].id(), "p2");
        assert!(vault.prompts()[0].is_pinned());
    }

    #[tokio::test]
    async fn test_logout_signs_out() {
        let mut vault = controller(sample_prompts());
        let mut session = RecordingSession::default();
        assert!(vault.logout(&mut session).await);
        assert!(session.signed_out);
    }

    #[tokio::test]
    async fn test_demo_never_calls_persistence() {
        let store = RecordingStore::default();
        let mut vault = VaultController::new(
            RenderContext::Demo,
            sample_prompts(),
            store,
            MemoryStorage::new(),
            VaultSettings::default(),
        );
        let mut session = RecordingSession::default();

        assert!(!vault.start_create());
        assert!(!vault.start_edit());
        assert!(!vault.save().await);
        assert!(!vault.delete("p1").await);
        assert!(!vault.toggle_pin("p1").await);
        assert!(!vault.logout(&mut session).await);

        assert!(vault.store().calls.is_empty());
        assert!(!session.signed_out);
        assert_eq!(vault.prompts().len(), 2);

        let controls: Vec<Control> = vault.controls().iter().map(|c| c.control).collect();
        for absent in [
            Control::Create,
            Control::Edit,
            Control::Delete,
            Control::Pin,
            Control::Logout,
        ] {
            assert!(!controls.contains(&absent), "{:?} should be absent", absent);
            assert!(!vault.is_available(absent));
        }
        assert!(controls.contains(&Control::Search));
        assert!(controls.contains(&Control::CopyBody));
    }

    #[test]
    fn test_controls_follow_mode() {
        let mut vault = controller(sample_prompts());
        let present = |vault: &VaultController<RecordingStore, MemoryStorage>| -> Vec<Control> {
            vault.controls().iter().map(|c| c.control).collect()
        };

        let browsing = present(&vault);
        assert!(browsing.contains(&Control::SelectPrompt));
        assert!(browsing.contains(&Control::Splitter));
        assert!(!browsing.contains(&Control::TitleInput));
        assert!(!browsing.contains(&Control::Save));
        assert!(vault.is_available(Control::Edit));
        assert!(vault.is_available(Control::FillExamples));
        assert!(!vault.is_available(Control::ClearPlaceholders));

        vault.start_create();
        let creating = present(&vault);
        for control in [
            Control::TitleInput,
            Control::BodyInput,
            Control::TagsInput,
            Control::Save,
            Control::Cancel,
        ] {
            assert!(creating.contains(&control), "{:?} should be present", control);
        }
        assert!(!vault.is_available(Control::Edit));
        assert!(!vault.is_available(Control::Delete));
        assert!(!vault.is_available(Control::CopyBody));

        assert_eq!(Control::RenderedTab.selector(), "pv-preview-tab-rendered");
        assert_eq!(PreviewTab::Original.selector(), "pv-preview-tab-original");
        assert_eq!(Control::TitleInput.selector(), "pv-title-input");
    }

    #[test]
    fn test_demo_keeps_placeholder_interaction() {
        let mut vault = VaultController::new(
            RenderContext::Demo,
            sample_prompts(),
            ReadOnlyStore,
            MemoryStorage::new(),
            VaultSettings::default(),
        );
        vault.set_value("error_logs", &numbered(120));
        assert!(vault.apply_transform("error_logs", LineTransform::Tail));
        assert!(vault.undo("error_logs"));
        assert!(
            vault.local_storage().get_item(&placeholder_values_key(RenderContext::Demo)).is_some()
        );
        assert!(
            vault
                .local_storage()
                .get_item(&placeholder_values_key(RenderContext::SignedIn))
                .is_none()
        );
    }

    #[test]
    fn test_undo_restores_original_after_single_trim() {
        let mut vault = controller(sample_prompts());
        let original = numbered(120);
        vault.set_value("error_logs", &original);

        assert!(vault.apply_transform("error_logs", LineTransform::Head));
        assert_eq!(line_count(vault.value("error_logs")), 50);
        assert!(vault.can_undo("error_logs"));

        assert!(vault.undo("error_logs"));
        assert_eq!(vault.value("error_logs"), original);
        assert!(!vault.can_undo("error_logs"));
        assert!(!vault.undo("error_logs"));
    }

    #[test]
    fn test_chained_trims_undo_to_first_snapshot() {
        let mut vault = controller(sample_prompts());
        let original = numbered(120);
        vault.set_value("error_logs", &original);

        assert!(vault.apply_transform("error_logs", LineTransform::HeadAndTail));
        let intermediate = vault.value("error_logs").to_string();
        assert_eq!(line_count(&intermediate), 101);

        assert!(vault.apply_transform("error_logs", LineTransform::Head));
        assert_eq!(line_count(vault.value("error_logs")), 50);

        assert!(vault.undo("error_logs"));
        assert_eq!(vault.value("error_logs"), original);
        assert_ne!(vault.value("error_logs"), intermediate);
        assert!(!vault.can_undo("error_logs"));
    }

    #[test]
    fn test_configured_window_chain_undo() {
        let settings = VaultSettings {
            trim_lines: 10,
            ..VaultSettings::default()
        };
        let mut vault = VaultController::new(
            RenderContext::SignedIn,
            sample_prompts(),
            RecordingStore::default(),
            MemoryStorage::new(),
            settings,
        );
        let original = numbered(120);
        vault.set_value("error_logs", &original);

        assert!(vault.apply_transform("error_logs", LineTransform::HeadAndTail));
        assert_eq!(line_count(vault.value("error_logs")), 21);
        assert!(vault.apply_transform("error_logs", LineTransform::Tail));
        assert!(vault.value("error_logs").starts_with("line 111\n"));
        assert!(!vault.apply_transform("error_logs", LineTransform::Head));

        assert!(vault.undo("error_logs"));
        assert_eq!(vault.value("error_logs"), original);
    }

    #[test]
    fn test_noop_trim_records_nothing() {
        let mut vault = controller(sample_prompts());
        vault.set_value("error_logs", &numbered(30));
        assert!(!vault.apply_transform("error_logs", LineTransform::Head));
        assert!(!vault.apply_transform("error_logs", LineTransform::HeadAndTail));
        assert!(!vault.can_undo("error_logs"));
    }

    #[test]
    fn test_manual_edit_keeps_undo_snapshot() {
        let mut vault = controller(sample_prompts());
        let original = numbered(120);
        vault.set_value("error_logs", &original);
        vault.apply_transform("error_logs", LineTransform::Head);
        vault.set_value("error_logs", "edited by hand");

        assert!(vault.can_undo("error_logs"));
        vault.undo("error_logs");
        assert_eq!(vault.value("error_logs"), original);
    }

    #[test]
    fn test_placeholder_fields_classification() {
        let mut vault = controller(sample_prompts());
        vault.set_value("error_logs", "a\nb\nc");
        let fields = vault.placeholder_fields();

        let project = &fields[0];
        assert_eq!(project.key, "project");
        assert!(!project.multiline);
        assert_eq!(project.label, "{{project}}");
        assert_eq!(project.input_selector, "pv-placeholder-input-project");
        assert!(project.log_tools.is_none());

        let logs = &fields[1];
        assert!(logs.multiline);
        assert_eq!(logs.label, "Error logs");
        let tools = logs.log_tools.as_ref().expect("logs tools");
        assert_eq!(tools.line_count, 3);
        assert!(!tools.can_undo);
        assert_eq!(tools.head_tail_selector, "pv-placeholder-log-head-tail-error-logs");

        vault.select("p2");
        let fields = vault.placeholder_fields();
        assert!(fields[0].multiline, "diff_text is long text");
        assert!(fields[0].log_tools.is_none());
        assert_eq!(fields[1].hint, "Enter a value");
    }

    #[test]
    fn test_fill_examples_only_fills_blank_keys() {
        let mut vault = controller(vec![prompt("p", "t", "{{error_logs}} {{error_log}} {{name}}")]);
        vault.set_value("error_log", "kept");
        vault.set_value("error_logs", "   ");

        assert!(vault.can_fill_examples());
        assert!(vault.fill_examples());
        assert!(vault.value("error_logs").contains("panicked"));
        assert_eq!(vault.value("error_log"), "kept");
        assert_eq!(vault.value("name"), "");

        assert!(!vault.can_fill_examples());
        assert!(!vault.fill_examples());
    }

    #[test]
    fn test_clear_all_survives_reload() {
        let mut vault = controller(sample_prompts());
        vault.set_value("project", "pvault");
        vault.set_value("error_logs", &numbered(120));
        vault.apply_transform("error_logs", LineTransform::Head);
        assert!(vault.can_clear());

        vault.clear_all();
        assert!(vault.values().is_empty());
        assert!(!vault.can_undo("error_logs"));
        assert!(!vault.can_clear());

        let local = vault.local_storage().clone();
        assert!(local.is_empty());
        let reloaded = VaultController::new(
            RenderContext::SignedIn,
            sample_prompts(),
            RecordingStore::default(),
            local,
            VaultSettings::default(),
        );
        assert!(reloaded.values().is_empty());
    }

    #[test]
    fn test_values_restored_on_mount() {
        let mut vault = controller(sample_prompts());
        vault.set_value("project", "pvault");
        vault.set_value("orphan", "kept");
        let local = vault.local_storage().clone();

        let reloaded = VaultController::new(
            RenderContext::SignedIn,
            sample_prompts(),
            RecordingStore::default(),
            local,
            VaultSettings::default(),
        );
        assert_eq!(reloaded.value("project"), "pvault");
        assert_eq!(reloaded.value("orphan"), "kept");
        assert!(reloaded.placeholder_fields().iter().all(|f| f.key != "orphan"));
    }

    #[test]
    fn test_copy_actions_and_toasts() {
        let mut vault = controller(sample_prompts());
        vault.set_value("project", "pvault");
        let mut clipboard = FakeClipboard::default();

        assert!(vault.copy_plain(&mut clipboard));
        assert_eq!(clipboard.text.as_deref(), Some("Fix pvault:\n"));
        assert_eq!(vault.toast().unwrap().variant, ToastVariant::Success);

        assert!(vault.copy_fenced(&mut clipboard));
        assert_eq!(clipboard.text.as_deref(), Some("```\nFix pvault:\n\n```"));

        clipboard.broken = true;
        assert!(!vault.copy_plain(&mut clipboard));
        let toast = vault.toast().unwrap();
        assert_eq!(toast.variant, ToastVariant::Error);
        assert_eq!(toast.selector(), "pv-toast-error");

        vault.dismiss_expired(Instant::now());
        assert!(vault.toast().is_some());
        vault.dismiss_expired(Instant::now() + Duration::from_secs(3));
        assert!(vault.toast().is_none());
    }

    #[test]
    fn test_alt_c_copies_outside_inputs() {
        let mut vault = controller(sample_prompts());
        vault.set_value("project", "pvault");
        let mut clipboard = FakeClipboard::default();

        let alt_c = KeyPress {
            code: "KeyC".to_string(),
            alt: true,
            ..KeyPress::default()
        };
        assert_eq!(vault.handle_key(&alt_c, &mut clipboard), Some(Shortcut::CopyRendered));
        assert_eq!(clipboard.text.as_deref(), Some("Fix pvault:\n"));

        clipboard.text = None;
        let typing = KeyPress { in_editable: true, ..alt_c };
        assert_eq!(vault.handle_key(&typing, &mut clipboard), None);
        assert!(clipboard.text.is_none());
    }

    #[test]
    fn test_pane_resize_persists_once_on_release() {
        let mut vault = controller(sample_prompts());
        assert_eq!(vault.pane_width(), 280.0);

        assert!(vault.pointer_down(PointerId(1), PRIMARY_BUTTON, 100.0));
        vault.pointer_move(PointerId(1), 140.0);
        assert_eq!(vault.pane_width(), 320.0);
        assert!(load_pane_width(vault.local_storage()).is_none());

        vault.pointer_move(PointerId(9), 400.0);
        assert_eq!(vault.pane_width(), 320.0);

        vault.pointer_up(PointerId(1), 150.0);
        assert_eq!(vault.pane_width(), 330.0);
        assert_eq!(load_pane_width(vault.local_storage()), Some(330.0));

        let local = vault.local_storage().clone();
        let reloaded = VaultController::new(
            RenderContext::SignedIn,
            vec![],
            RecordingStore::default(),
            local,
            VaultSettings::default(),
        );
        assert_eq!(reloaded.pane_width(), 330.0);
    }

    #[test]
    fn test_focus_marks_active_segment() {
        let mut vault = controller(sample_prompts());
        vault.focus_placeholder("project");
        let active = vault.preview_segments().into_iter().any(|s| {
            matches!(s, PreviewSegment::Unfilled { ref key, active: true, .. } if key == "project")
        });
        assert!(active);
        vault.blur_placeholder();
        assert_eq!(vault.active_key(), None);
    }

    #[test]
    fn test_creating_previews_form_body() {
        let mut vault = controller(sample_prompts());
        vault.start_create();
        vault.set_body("Hello {{who}}");
        assert_eq!(vault.placeholders(), vec!["who"]);
        vault.set_value("who", "world");
        assert_eq!(vault.rendered(), "Hello world");
    }
}
