//! `mdr profile` subcommand group.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use mdr_config::{Config, ProfileStore};

use super::render::RenderOptions;
use crate::error::CliError;
use crate::output::Output;

/// Profile commands.
#[derive(Args)]
pub(crate) struct ProfileCommand {
    /// Path to configuration file (default: auto-discover mdr.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Path to the profile store (default: .mdr/profiles.json).
    #[arg(long, value_name = "PATH", global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    action: ProfileAction,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// List saved profiles.
    List,
    /// Show the settings of a profile.
    Show {
        /// Profile name.
        name: String,
    },
    /// Save render options under a name, replacing any existing profile.
    Save {
        /// Profile name.
        name: String,
        #[command(flatten)]
        options: RenderOptions,
    },
    /// Delete a profile.
    Delete {
        /// Profile name.
        name: String,
    },
}

impl ProfileCommand {
    /// Execute the profile subcommand.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let store_path = match self.store {
            Some(path) => path,
            None => Config::load(self.config.as_deref(), None)?.profiles_path(),
        };
        let mut store = ProfileStore::load(&store_path);

        match self.action {
            ProfileAction::List => {
                if store.is_empty() {
                    output.info(&format!("No profiles in {}", store.path().display()));
                }
                for name in store.names() {
                    output.info(name);
                }
            }
            ProfileAction::Show { name } => {
                let profile = store.get(&name)?;
                output.highlight(&name);
                output.info(&serde_json::to_string_pretty(profile)?);
            }
            ProfileAction::Save { name, options } => {
                let profile = options.to_profile()?;
                // Reject settings that would fail when the profile is applied
                profile.to_settings()?;
                let replaced = store.insert(&name, profile)?.is_some();
                store.save()?;
                let verb = if replaced { "Updated" } else { "Saved" };
                output.success(&format!(
                    "{verb} profile '{}' in {}",
                    name.trim(),
                    store.path().display()
                ));
            }
            ProfileAction::Delete { name } => {
                store.remove(&name)?;
                store.save()?;
                output.success(&format!("Deleted profile '{name}'"));
            }
        }

        Ok(())
    }
}
