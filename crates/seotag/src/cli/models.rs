//! The `seotag models` command for managing the CLIP model files.

use clap::{Args, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use seotag_core::embedding::VISION_MODEL_FILENAME;
use seotag_core::tagging::text_encoder::{TEXT_MODEL_FILENAME, TOKENIZER_FILENAME};
use seotag_core::Config;
use std::path::{Path, PathBuf};

/// Arguments for the `models` command.
#[derive(Args, Debug)]
pub struct ModelsArgs {
    #[command(subcommand)]
    pub command: ModelsCommand,
}

/// Subcommands for model management.
#[derive(Subcommand, Debug)]
pub enum ModelsCommand {
    /// Download the CLIP vision tower, text tower and tokenizer
    Download,

    /// List installed model files
    List,

    /// Show model directory path
    Path,
}

/// Hugging Face repository hosting the ONNX export of CLIP ViT-B/32.
const CLIP_REPO: &str = "Xenova/clip-vit-base-patch32";

/// One file of the model, remote path and local name.
struct ModelFile {
    label: &'static str,
    remote_path: &'static str,
    local_name: &'static str,
}

const MODEL_FILES: &[ModelFile] = &[
    ModelFile {
        label: "Vision encoder",
        remote_path: "onnx/vision_model.onnx",
        local_name: VISION_MODEL_FILENAME,
    },
    ModelFile {
        label: "Text encoder",
        remote_path: "onnx/text_model.onnx",
        local_name: TEXT_MODEL_FILENAME,
    },
    ModelFile {
        label: "Tokenizer",
        remote_path: "tokenizer.json",
        local_name: TOKENIZER_FILENAME,
    },
];

/// Status of each model file on disk.
struct InstalledModels {
    files: Vec<(&'static ModelFile, PathBuf, bool)>,
}

impl InstalledModels {
    fn check(variant_dir: &Path) -> Self {
        let files = MODEL_FILES
            .iter()
            .map(|file| {
                let path = variant_dir.join(file.local_name);
                let exists = path.exists();
                (file, path, exists)
            })
            .collect();
        Self { files }
    }

    /// Returns true if everything needed for tagging is present.
    fn can_tag(&self) -> bool {
        self.files.iter().all(|(_, _, exists)| *exists)
    }
}

/// Execute the models command.
pub async fn execute(args: ModelsArgs, config: &Config) -> anyhow::Result<()> {
    match args.command {
        ModelsCommand::Download => {
            let variant_dir = config.model_variant_dir();
            let client = reqwest::Client::new();

            tracing::info!("Downloading {} into {:?}", CLIP_REPO, variant_dir);
            download_all(&client, &variant_dir).await?;

            tracing::info!("All downloads complete.");
        }

        ModelsCommand::List => {
            let variant_dir = config.model_variant_dir();
            let installed = InstalledModels::check(&variant_dir);

            println!("Model: {} ({})", config.embedding.model, CLIP_REPO);
            println!("  Directory: {}\n", variant_dir.display());
            for (file, _, exists) in &installed.files {
                let status = if *exists { "ready" } else { "not installed" };
                println!("    - {:20} {:18} {}", file.local_name, file.label, status);
            }

            if !installed.can_tag() {
                println!("\nRun `seotag models download` to download the missing files.");
            }
        }

        ModelsCommand::Path => {
            println!("{}", config.model_dir().display());
        }
    }

    Ok(())
}

/// Download every missing model file. Existing files are left alone.
async fn download_all(client: &reqwest::Client, variant_dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(variant_dir)?;

    for file in MODEL_FILES {
        let dest = variant_dir.join(file.local_name);
        if dest.exists() {
            tracing::info!("{} already exists at {:?}", file.label, dest);
            continue;
        }

        let url = model_url(file.remote_path);
        tracing::info!("Downloading {}...", file.label);
        tracing::info!("  Source: {}", url);
        tracing::info!("  Destination: {:?}", dest);

        download_file(client, &url, &dest).await?;

        let file_size = std::fs::metadata(&dest)?.len();
        tracing::info!(
            "  {} complete ({:.1} MB, blake3 {})",
            file.label,
            file_size as f64 / (1024.0 * 1024.0),
            blake3_digest(&dest)?
        );
    }

    Ok(())
}

fn model_url(remote_path: &str) -> String {
    format!("https://huggingface.co/{CLIP_REPO}/resolve/main/{remote_path}")
}

/// Download a file from a URL to a local path, streaming to disk.
///
/// Writes to a `.part` file first and renames on success, so an interrupted
/// download is never mistaken for an installed model.
async fn download_file(client: &reqwest::Client, url: &str, dest: &Path) -> anyhow::Result<()> {
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    let response = client
        .get(url)
        .send()
        .await?
        .error_for_status()
        .map_err(|e| anyhow::anyhow!("Download failed: {e}"))?;

    let progress = match response.content_length() {
        Some(size) => {
            let bar = ProgressBar::new(size);
            bar.set_style(
                ProgressStyle::with_template(
                    "  {bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
                )?
                .progress_chars("=> "),
            );
            bar
        }
        None => ProgressBar::new_spinner(),
    };

    let partial = dest.with_extension("part");
    let mut file = tokio::fs::File::create(&partial).await?;
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        progress.inc(chunk.len() as u64);
    }

    file.flush().await?;
    drop(file);
    progress.finish_and_clear();

    tokio::fs::rename(&partial, dest).await?;
    Ok(())
}

/// BLAKE3 digest of a file, streamed.
fn blake3_digest(path: &Path) -> anyhow::Result<String> {
    let mut hasher = blake3::Hasher::new();
    let mut file = std::fs::File::open(path)
        .map_err(|e| anyhow::anyhow!("Checksum computation failed for {}: {e}", path.display()))?;
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hasher.finalize().to_hex().to_string())
}
