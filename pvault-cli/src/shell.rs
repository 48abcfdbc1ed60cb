//! Interactive vault session on the terminal, driving the core controller one line at a time.
//!
//! Commands backed by a control are only offered, and only accepted, while the controller
//! lists that control as present and enabled.

use anyhow::{Context, Result};
use pvault_core::controller::{Control, PreviewTab, ToastVariant, VaultController};
use pvault_core::lines::LineTransform;
use pvault_core::local_store::LocalStorage;
use pvault_core::registry::{PromptStore, Session};
use std::io::{self, BufRead, Write};
use tracing::info;

use crate::clipboard::ArboardClipboard;

const NOT_AVAILABLE: &str = "Not available here.";

const BASE_HELP: &str = "\
show                  show the selected prompt and its placeholders
set <key> <value>     fill a placeholder
paste <key>           read a multi-line value, end with a single '.'
head|tail|headtail <key>  trim a long value
undo <key>            revert the last trims of a value
help | quit";

/// Signs the terminal user out by ending the shell.
pub struct CliSession {
    pub user: Option<String>,
}

impl Session for CliSession {
    async fn sign_out(&mut self) {
        info!("session closed");
        self.user = None;
    }
}

/// The control a command drives, if it is gated by one.
fn command_control(command: &str, rest: &str) -> Option<Control> {
    let control = match command {
        "ls" | "list" => Control::Search,
        "select" => Control::SelectPrompt,
        "new" => Control::Create,
        "edit" => Control::Edit,
        "cancel" => Control::Cancel,
        "title" => Control::TitleInput,
        "body" => Control::BodyInput,
        "tags" => Control::TagsInput,
        "save" => Control::Save,
        "delete" => Control::Delete,
        "pin" => Control::Pin,
        "logout" => Control::Logout,
        "tab" if rest.trim() == "original" => Control::OriginalTab,
        "tab" => Control::RenderedTab,
        "copy" => Control::CopyBody,
        "copy-md" => Control::CopyMarkdown,
        "fill" => Control::FillExamples,
        "clear" => Control::ClearPlaceholders,
        _ => return None,
    };
    Some(control)
}

fn help_line(control: Control) -> Option<&'static str> {
    let line = match control {
        Control::Search => "ls [query]            list prompts, filtered by title or tag",
        Control::SelectPrompt => "select <n|id>         select a prompt from the list",
        Control::Create => "new                   open a blank prompt form",
        Control::Edit => "edit                  edit the selected prompt",
        Control::Delete => "delete                delete the selected prompt",
        Control::Pin => "pin [id]              pin or unpin a prompt",
        Control::Logout => "logout                sign out and leave the shell",
        Control::TitleInput => "title <text>          set the form title",
        Control::BodyInput => "body                  read the form body, end with a single '.'",
        Control::TagsInput => "tags <a, b>           set the form tags",
        Control::Save => "save                  save the form",
        Control::Cancel => "cancel                close the form without saving",
        Control::RenderedTab => "tab rendered          preview the filled-in prompt",
        Control::OriginalTab => "tab original          preview the raw template",
        Control::CopyBody => "copy                  copy the rendered prompt",
        Control::CopyMarkdown => "copy-md               copy it as a Markdown block",
        Control::ClearPlaceholders => "clear                 clear every placeholder value",
        Control::FillExamples => "fill                  fill examples into blank fields",
        Control::Splitter => return None,
    };
    Some(line)
}

fn help_text<S: PromptStore, L: LocalStorage>(vault: &VaultController<S, L>) -> String {
    let mut lines: Vec<&str> = vault
        .controls()
        .iter()
        .filter(|state| state.enabled)
        .filter_map(|state| help_line(state.control))
        .collect();
    lines.push(BASE_HELP);
    lines.join("\n")
}

fn accepts<S: PromptStore, L: LocalStorage>(
    vault: &VaultController<S, L>,
    command: &str,
    rest: &str,
) -> bool {
    command_control(command, rest).is_none_or(|control| vault.is_available(control))
}

pub async fn run<S: PromptStore, L: LocalStorage>(
    mut vault: VaultController<S, L>,
    mut session: CliSession,
) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut clipboard = ArboardClipboard::default();

    if vault.is_read_only() {
        println!("Demo mode: prompts are read-only.");
    }
    print_list(&vault);

    loop {
        print!("pvault> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        if input.read_line(&mut line).context("Failed to read from stdin")? == 0 {
            break;
        }
        let line = line.trim_end_matches(['\r', '\n']);
        let (command, rest) = line.trim_start().split_once(' ').unwrap_or((line.trim(), ""));

        if !accepts(&vault, command, rest) {
            println!("{NOT_AVAILABLE}");
            continue;
        }

        match command {
            "" => {}
            "help" | "?" => println!("{}", help_text(&vault)),
            "ls" | "list" => {
                vault.set_search(rest);
                print_list(&vault);
            }
            "select" => select(&mut vault, rest.trim()),
            "show" => print_selected(&vault),
            "new" => refuse_unless(vault.start_create()),
            "edit" => refuse_unless(vault.start_edit()),
            "cancel" => refuse_unless(vault.cancel()),
            "title" => vault.set_title(rest),
            "body" => {
                let body = read_block(&mut input)?;
                vault.set_body(&body);
            }
            "tags" => vault.set_tags_csv(rest),
            "save" => {
                if vault.save().await {
                    print_selected(&vault);
                }
            }
            "delete" => {
                if let Some(id) = vault.selected_id().map(str::to_string) {
                    vault.delete(&id).await;
                    print_list(&vault);
                }
            }
            "pin" => {
                let id = match rest.trim() {
                    "" => vault.selected_id().map(str::to_string),
                    id => Some(id.to_string()),
                };
                match id {
                    Some(id) => {
                        vault.toggle_pin(&id).await;
                        print_list(&vault);
                    }
                    None => println!("{NOT_AVAILABLE}"),
                }
            }
            "set" => {
                let (key, value) = rest.split_once(' ').unwrap_or((rest, ""));
                vault.set_value(key, value);
            }
            "paste" => {
                let value = read_block(&mut input)?;
                vault.set_value(rest.trim(), &value);
            }
            "head" | "tail" | "headtail" => {
                let transform = match command {
                    "head" => LineTransform::Head,
                    "tail" => LineTransform::Tail,
                    _ => LineTransform::HeadAndTail,
                };
                if !vault.apply_transform(rest.trim(), transform) {
                    println!("Nothing to trim.");
                }
            }
            "undo" => {
                if !vault.undo(rest.trim()) {
                    println!("Nothing to undo.");
                }
            }
            "fill" => refuse_unless(vault.fill_examples()),
            "clear" => vault.clear_all(),
            "tab" => match rest.trim() {
                "original" => vault.set_preview_tab(PreviewTab::Original),
                _ => vault.set_preview_tab(PreviewTab::Rendered),
            },
            "copy" => {
                vault.copy_plain(&mut clipboard);
            }
            "copy-md" => {
                vault.copy_fenced(&mut clipboard);
            }
            "logout" => {
                if vault.logout(&mut session).await {
                    break;
                }
                println!("{NOT_AVAILABLE}");
            }
            "quit" | "exit" => break,
            other => println!("Unknown command `{other}`. Type `help`."),
        }

        report(&mut vault, matches!(command, "save" | "delete" | "pin"));
    }

    Ok(())
}

fn refuse_unless(accepted: bool) {
    if !accepted {
        println!("{NOT_AVAILABLE}");
    }
}

fn select<S: PromptStore, L: LocalStorage>(vault: &mut VaultController<S, L>, target: &str) {
    let id = match target.parse::<usize>() {
        Ok(n) => vault
            .filtered_prompts()
            .get(n.saturating_sub(1))
            .map(|p| p.id().to_string()),
        Err(_) => Some(target.to_string()),
    };
    match id {
        Some(id) if vault.select(&id) => print_selected(vault),
        _ => println!("No such prompt."),
    }
}

fn read_block(input: &mut impl BufRead) -> Result<String> {
    let mut lines = Vec::new();
    for line in input.lines() {
        let line = line.context("Failed to read from stdin")?;
        if line == "." {
            break;
        }
        lines.push(line);
    }
    Ok(lines.join("\n"))
}

fn print_list<S: PromptStore, L: LocalStorage>(vault: &VaultController<S, L>) {
    let prompts = vault.filtered_prompts();
    if prompts.is_empty() {
        println!("No prompts.");
    }
    for (i, prompt) in prompts.iter().enumerate() {
        let marker = if vault.selected_id() == Some(prompt.id()) { '>' } else { ' ' };
        let pin = if prompt.is_pinned() { "[pinned] " } else { "" };
        let tags = prompt.tags().join(", ");
        println!("{marker}{:>3}. {pin}{} [{tags}]", i + 1, prompt.title());
    }
}

fn print_selected<S: PromptStore, L: LocalStorage>(vault: &VaultController<S, L>) {
    if let Some(prompt) = vault.selected_prompt() {
        println!("# {}", prompt.title());
    } else if vault.is_form_mode() {
        println!("# {} (draft)", vault.form().title);
    }

    for field in vault.placeholder_fields() {
        let shown = if field.value.is_empty() {
            field.hint.as_str()
        } else {
            field.value.as_str()
        };
        match &field.log_tools {
            Some(tools) => {
                let undo = if tools.can_undo { ", undo" } else { "" };
                println!(
                    "  {} ({} lines{undo}): {}",
                    field.label,
                    tools.line_count,
                    first_line(shown)
                );
            }
            None => println!("  {}: {}", field.label, first_line(shown)),
        }
    }

    println!("---");
    match vault.preview_tab() {
        PreviewTab::Rendered => println!("{}", vault.rendered()),
        PreviewTab::Original => println!("{}", vault.preview_body()),
    }
    println!("---");
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

fn report<S: PromptStore, L: LocalStorage>(vault: &mut VaultController<S, L>, after_persist: bool) {
    if after_persist {
        if let Some(message) = vault.field_errors().first_message() {
            println!("Invalid: {message}");
        }
        if let Some(error) = vault.form_error() {
            println!("Error: {error}");
        }
    }
    if let Some(toast) = vault.toast() {
        let prefix = match toast.variant {
            ToastVariant::Success => "ok",
            ToastVariant::Error => "failed",
        };
        println!("[{prefix}] {}", toast.message);
    }
    // Printed once, no timer on a terminal.
    vault.dismiss_toast();
}
