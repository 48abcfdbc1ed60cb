use confy::ConfyError;
use pvault_core::access::Allowlist;
use pvault_core::config::VaultSettings;
use pvault_core::file_storage::FileStorage;
use pvault_core::local_store::FileLocalStorage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

pub const PVAULT_CLI: &str = "pvault";

#[derive(Debug, Serialize, Deserialize)]
pub struct PvaultCliConfig {
    pub storage_path: String,
    /// Where placeholder values and the pane width survive between shell sessions.
    pub state_path: String,
    /// Addresses allowed to use the vault. Empty denies everyone.
    #[serde(default)]
    pub allow_emails: Vec<String>,
    #[serde(default)]
    pub vault: VaultSettings,
}

impl Default for PvaultCliConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .map(|p| p.join("pvault"))
            .unwrap_or_else(|| PathBuf::from("pvault"));

        Self {
            storage_path: data_dir.join("prompts").display().to_string(),
            state_path: data_dir.join("state.json").display().to_string(),
            allow_emails: Vec::new(),
            vault: VaultSettings::default(),
        }
    }
}

impl PvaultCliConfig {
    pub fn allowlist(&self) -> Allowlist {
        Allowlist::new(&self.allow_emails)
    }

    pub fn local_storage(&self) -> FileLocalStorage {
        FileLocalStorage::open(&self.state_path)
    }
}

pub fn load_config() -> PvaultCliConfig {
    let config: Result<PvaultCliConfig, ConfyError> = confy::load(PVAULT_CLI, None);
    match config {
        Ok(config) => {
            debug!(storage_path = %config.storage_path, "configuration loaded");
            config
        }
        Err(e) => {
            eprintln!("Error: Problem loading config ({e}). Exiting...");
            std::process::exit(exitcode::CONFIG);
        }
    }
}

/// The command line path wins over the configured one.
pub fn initialize_storage(storage_path: Option<String>, config: &PvaultCliConfig) -> FileStorage {
    let path = storage_path.unwrap_or_else(|| config.storage_path.clone());
    FileStorage::new(PathBuf::from(path))
}
