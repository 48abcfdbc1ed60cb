mod clipboard;
mod config;
mod shell;

use crate::clipboard::ArboardClipboard;
use crate::config::{PvaultCliConfig, initialize_storage, load_config};
use crate::shell::CliSession;
use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use pvault_core::action::{ActionError, ErrorCode};
use pvault_core::controller::VaultController;
use pvault_core::demo::demo_prompts;
use pvault_core::file_storage::{FileStorage, FileStorageError};
use pvault_core::local_store::RenderContext;
use pvault_core::prompt::{Prompt, PromptInput, parse_tag_csv};
use pvault_core::registry::{Clipboard, PromptStore, ReadOnlyStore};
use pvault_core::template::{PlaceholderValues, render_template};
use std::io;
use tracing::{debug, error};

#[derive(Parser, Debug)]
#[command(version,
display_name = "pvault",
bin_name = "pvault",
about = "A prompt vault with fill-in templates",
long_about = "Store reusable prompts with {{placeholder}} tokens, fill them in and copy them")]
struct Args {
    #[arg(short = 'p', long, global = true)]
    storage_path: Option<String>,

    /// Email of the signed-in user, checked against the allowlist.
    #[arg(short = 'u', long, env = "PVAULT_USER", global = true)]
    user: Option<String>,

    /// Browse the built-in read-only demo prompts.
    #[arg(long, global = true)]
    demo: bool,

    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    List {
        #[arg(short = 's', long)]
        search: Option<String>,
        #[arg(short = 't', long)]
        tags: Vec<String>,
    },
    Show {
        id: String,
    },
    Add {
        #[arg(short = 'n', long)]
        title: String,
        #[arg(short = 'c', long)]
        content: String,
        #[arg(short = 't', long, default_value = "")]
        tags: String,
    },
    Edit {
        id: String,
        #[arg(short = 'n', long)]
        title: Option<String>,
        #[arg(short = 'c', long)]
        content: Option<String>,
        #[arg(short = 't', long)]
        tags: Option<String>,
    },
    Delete {
        id: String,
    },
    /// Pins or unpins a prompt.
    Pin {
        id: String,
    },
    Render {
        id: String,
        /// Placeholder values as key=value.
        #[arg(short = 's', long = "set", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
        #[arg(short = 'c', long)]
        copy: bool,
        /// Wrap the output in a Markdown code block.
        #[arg(short = 'f', long)]
        fenced: bool,
    },
    /// Interactive session with placeholder editing and log trimming.
    Shell,
    Completions {
        shell: Shell,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got `{raw}`"))
}

fn setup_logging(verbose: bool) {
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

fn exit_code(err: &anyhow::Error) -> exitcode::ExitCode {
    match err.downcast_ref::<ActionError>().map(|e| e.code) {
        Some(ErrorCode::Unauthorized | ErrorCode::Forbidden) => exitcode::NOPERM,
        Some(ErrorCode::NotFound | ErrorCode::UserNotFound) => exitcode::NOINPUT,
        Some(ErrorCode::ValidationError) => exitcode::DATAERR,
        Some(ErrorCode::DbError) => exitcode::IOERR,
        _ => exitcode::SOFTWARE,
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    setup_logging(args.verbose);

    if let Commands::Completions { shell } = &args.cmd {
        clap_complete::generate(*shell, &mut Args::command(), "pvault", &mut io::stdout());
        return;
    }

    let config = load_config();
    if let Err(err) = run(args, config).await {
        error!("{err:#}");
        eprintln!("Error: {err:#}");
        std::process::exit(exit_code(&err));
    }
}

async fn run(args: Args, config: PvaultCliConfig) -> Result<()> {
    if args.demo {
        return run_demo(args.cmd, &config).await;
    }

    config.allowlist().authorize(args.user.as_deref())?;
    let mut storage = initialize_storage(args.storage_path, &config);
    debug!(path = %storage.base_path.display(), "using prompt storage");

    match args.cmd {
        Commands::List { search, tags } => {
            let prompts = if tags.is_empty() {
                storage.get_prompts()?
            } else {
                storage.get_prompts_by_tag(&tags)?
            };
            print_prompts(&prompts, search.as_deref());
        }
        Commands::Show { id } => {
            let prompt = fetch(&storage, &id)?;
            print_prompt(&prompt);
        }
        Commands::Add { title, content, tags } => {
            let input = PromptInput {
                title,
                body: content,
                tags: parse_tag_csv(&tags),
            };
            let prompt = storage.create_prompt(input).await?;
            println!("{}", prompt.id());
        }
        Commands::Edit { id, title, content, tags } => {
            let existing = fetch(&storage, &id)?;
            let input = PromptInput {
                title: title.unwrap_or_else(|| existing.title().to_string()),
                body: content.unwrap_or(existing.body),
                tags: tags.map(|t| parse_tag_csv(&t)).unwrap_or(existing.metadata.tags),
            };
            let prompt = storage.update_prompt(&id, input).await?;
            println!("{}", prompt.id());
        }
        Commands::Delete { id } => {
            let id = PromptStore::delete_prompt(&mut storage, &id).await?;
            println!("Deleted {id}");
        }
        Commands::Pin { id } => {
            let prompts = storage.toggle_pin(&id).await?;
            print_prompts(&prompts, None);
        }
        Commands::Render { id, values, copy, fenced } => {
            let prompt = fetch(&storage, &id)?;
            render(&prompt, values, copy, fenced)?;
        }
        Commands::Shell => {
            storage.ensure_base_directory_exists()?;
            let prompts = storage.get_prompts()?;
            let vault = VaultController::new(
                RenderContext::SignedIn,
                prompts,
                storage,
                config.local_storage(),
                config.vault.clone(),
            );
            shell::run(vault, CliSession { user: args.user }).await?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

async fn run_demo(cmd: Commands, config: &PvaultCliConfig) -> Result<()> {
    let prompts = demo_prompts();
    let find = |id: &str| {
        prompts
            .iter()
            .find(|p| p.id() == id)
            .cloned()
            .ok_or_else(ActionError::not_found)
    };

    match cmd {
        Commands::List { search, tags } => {
            let listed: Vec<Prompt> = prompts
                .iter()
                .filter(|p| tags.is_empty() || tags.iter().any(|t| p.tags().contains(t)))
                .cloned()
                .collect();
            print_prompts(&listed, search.as_deref());
        }
        Commands::Show { id } => print_prompt(&find(&id)?),
        Commands::Render { id, values, copy, fenced } => render(&find(&id)?, values, copy, fenced)?,
        Commands::Shell => {
            let vault = VaultController::new(
                RenderContext::Demo,
                prompts.clone(),
                ReadOnlyStore,
                config.local_storage(),
                config.vault.clone(),
            );
            shell::run(vault, CliSession { user: None }).await?;
        }
        Commands::Add { .. }
        | Commands::Edit { .. }
        | Commands::Delete { .. }
        | Commands::Pin { .. } => {
            return Err(
                anyhow::Error::new(ActionError::forbidden()).context("The demo is read-only")
            );
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}

fn fetch(storage: &FileStorage, id: &str) -> Result<Prompt> {
    match storage.get_prompt(id) {
        Ok(prompt) => Ok(prompt),
        Err(FileStorageError::PromptNotFound(_)) => Err(ActionError::not_found().into()),
        Err(e) => Err(e).with_context(|| format!("Failed to read prompt {id}")),
    }
}

fn render(prompt: &Prompt, values: Vec<(String, String)>, copy: bool, fenced: bool) -> Result<()> {
    let values: PlaceholderValues = values.into_iter().collect();
    let rendered = render_template(&prompt.body, &values);
    let output = if fenced { format!("```\n{rendered}\n```") } else { rendered };

    if copy {
        ArboardClipboard::default()
            .write_text(&output)
            .context("Failed to copy to the clipboard")?;
        eprintln!("Copied to the clipboard");
    } else {
        println!("{output}");
    }
    Ok(())
}

fn print_prompts(prompts: &[Prompt], search: Option<&str>) {
    for prompt in prompts.iter().filter(|p| p.matches_query(search.unwrap_or(""))) {
        let pin = if prompt.is_pinned() { "* " } else { "  " };
        println!("{pin}{}  {}  [{}]", prompt.id(), prompt.title(), prompt.tags().join(", "));
    }
}

fn print_prompt(prompt: &Prompt) {
    println!("# {}", prompt.title());
    println!("tags: {}", prompt.tags().join(", "));
    let placeholders = prompt.template();
    let keys = placeholders.placeholders();
    if !keys.is_empty() {
        println!("placeholders: {}", keys.join(", "));
    }
    println!();
    println!("{}", prompt.body);
}
