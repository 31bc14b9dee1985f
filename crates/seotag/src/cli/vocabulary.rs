//! The `seotag vocabulary` command for inspecting the tag vocabulary.

use clap::{Args, Subcommand};
use seotag_core::{load_vocabulary, Config, TagVocabulary};
use std::path::PathBuf;

/// Arguments for the `vocabulary` command.
#[derive(Args, Debug)]
pub struct VocabularyArgs {
    #[command(subcommand)]
    pub command: VocabularyCommand,
}

/// Subcommands for the vocabulary.
#[derive(Subcommand, Debug)]
pub enum VocabularyCommand {
    /// Print categories and their tags
    Show {
        /// Print the flattened candidate list, one tag per line
        #[arg(long)]
        flat: bool,
    },

    /// Write the active vocabulary as TOML
    Export {
        /// Destination file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Execute the vocabulary command.
pub async fn execute(args: VocabularyArgs, config: &Config) -> anyhow::Result<()> {
    let vocabulary = load_vocabulary(config)?;

    match args.command {
        VocabularyCommand::Show { flat } => {
            print!("{}", render(&vocabulary, flat));
        }

        VocabularyCommand::Export { output } => {
            let toml = vocabulary.to_toml()?;
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, toml)?;
                    tracing::info!(
                        "Exported {} tags in {} categories to {:?}",
                        vocabulary.tag_count(),
                        vocabulary.categories().len(),
                        path
                    );
                }
                None => print!("{toml}"),
            }
        }
    }

    Ok(())
}

fn render(vocabulary: &TagVocabulary, flat: bool) -> String {
    if flat {
        return vocabulary
            .flatten()
            .iter()
            .map(|tag| format!("{tag}\n"))
            .collect();
    }

    let mut out = String::new();
    for category in vocabulary.categories() {
        out.push_str(&format!(
            "{} ({})\n  {}\n",
            category.name(),
            category.tags().len(),
            category.tags().join(", ")
        ));
    }
    out.push_str(&format!(
        "\n{} categories, {} tags\n",
        vocabulary.categories().len(),
        vocabulary.tag_count()
    ));
    out
}
