//! The `seotag tag` command: suggest tags for one image.

use clap::{Args, ValueEnum};
use seotag_core::{
    load_vocabulary, tagging, Config, EmbeddingScorer, ImageStore, OutputFormat, OutputWriter,
    SeoTagError, SeoTagger, TagReport, TagVocabulary, TaggingError,
};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Arguments for the `tag` command.
#[derive(Args, Debug)]
pub struct TagArgs {
    /// Image to tag (jpg, jpeg or png)
    #[arg(required = true)]
    pub image: PathBuf,

    /// Number of tags to suggest (defaults to `tagging.top_k`)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Vocabulary TOML file to use instead of the configured one
    #[arg(long, value_name = "FILE")]
    pub vocabulary: Option<PathBuf>,

    /// Do not copy the image into the upload directory
    #[arg(long)]
    pub no_save: bool,

    /// Output format (defaults to `output.format`)
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

/// Output formats accepted on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    /// Human-readable summary
    Text,
    /// Single JSON object
    Json,
    /// One JSON object per line
    Jsonl,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Jsonl => OutputFormat::JsonLines,
        }
    }
}

/// Execute the tag command.
pub async fn execute(args: TagArgs, config: &Config) -> anyhow::Result<()> {
    let image_path = expand_path(&args.image);
    let file_name = upload_name(&image_path)?;

    let store = ImageStore::new(config.upload_dir());
    if !config.store.accepts(&file_name) {
        anyhow::bail!(
            "Unsupported file type: {}\n  Allowed extensions: {}",
            file_name,
            config.store.allowed_extensions.join(", ")
        );
    }

    let bytes = tokio::fs::read(&image_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", image_path.display()))?;

    let vocabulary = match &args.vocabulary {
        Some(path) => TagVocabulary::load(&expand_path(path))?,
        None => load_vocabulary(config)?,
    };
    let top_k = args.top_k.unwrap_or(config.tagging.top_k);
    let format = match args.format {
        Some(arg) => arg.into(),
        None => OutputFormat::parse(&config.output.format).unwrap_or(OutputFormat::Text),
    };
    let pretty = args.pretty || config.output.pretty;

    // Model loading, label bank encoding and inference are CPU-bound; keep
    // them all off the async worker threads.
    let (bytes, mut report) = suggest_blocking(
        |config| tagging::scorer::shared(config).map_err(model_hint),
        vocabulary,
        config.clone(),
        bytes,
        file_name.clone(),
        top_k,
    )
    .await?;

    if !args.no_save {
        report.stored_path = Some(store.save(&bytes, &file_name)?);
    }

    let stdout = std::io::stdout();
    let mut writer = OutputWriter::new(BufWriter::new(stdout.lock()), format, pretty);
    writer.write_report(&report)?;
    writer.into_inner().flush()?;

    Ok(())
}

/// Load the scorer, build the tagger and tag `bytes` on the blocking pool.
///
/// Hands `bytes` back so the caller can store the upload afterwards.
async fn suggest_blocking<S, F>(
    load_scorer: F,
    vocabulary: TagVocabulary,
    config: Config,
    bytes: Vec<u8>,
    name: String,
    top_k: usize,
) -> anyhow::Result<(Vec<u8>, TagReport)>
where
    S: EmbeddingScorer,
    F: FnOnce(&Config) -> anyhow::Result<S> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let scorer = load_scorer(&config)?;
        let tagger = SeoTagger::from_config(scorer, vocabulary, &config)?;

        tracing::info!(
            "Tagging {} against {} candidates",
            name,
            tagger.candidates().len()
        );

        match tagger.suggest_bytes_k(&bytes, &name, top_k) {
            Ok(report) => Ok((bytes, report)),
            Err(SeoTagError::Tagging(e)) if e.is_recoverable() => {
                anyhow::bail!("Please upload a valid image file. ({e})")
            }
            Err(e) => Err(e.into()),
        }
    })
    .await?
}

/// Attach a download hint to a missing-model error.
fn model_hint(err: TaggingError) -> anyhow::Error {
    match err {
        TaggingError::ModelUnavailable { .. } => anyhow::anyhow!(
            "{err}\n  Run `seotag models download` to fetch the CLIP model."
        ),
        other => other.into(),
    }
}

/// File name used for the stored copy and in the report.
fn upload_name(path: &Path) -> anyhow::Result<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("Not a file path: {}", path.display()))
}

fn expand_path(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use seotag_core::{CandidateSet, ScoreVector, TaggingResult};
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};
    use std::thread::ThreadId;

    #[test]
    fn format_arg_maps_to_core_format() {
        assert_eq!(OutputFormat::from(FormatArg::Text), OutputFormat::Text);
        assert_eq!(OutputFormat::from(FormatArg::Json), OutputFormat::Json);
        assert_eq!(OutputFormat::from(FormatArg::Jsonl), OutputFormat::JsonLines);
    }

    #[test]
    fn upload_name_keeps_only_file_name() {
        let name = upload_name(Path::new("/tmp/photos/beach.jpg")).unwrap();
        assert_eq!(name, "beach.jpg");
    }

    #[test]
    fn upload_name_rejects_directory_like_paths() {
        assert!(upload_name(Path::new("/")).is_err());
        assert!(upload_name(Path::new("photos/..")).is_err());
    }

    #[test]
    fn missing_model_error_mentions_download() {
        let err = model_hint(TaggingError::ModelUnavailable {
            path: PathBuf::from("/models/vision_model.onnx"),
            message: "Not found".into(),
        });
        assert!(err.to_string().contains("seotag models download"));
    }

    /// Scores "pizza" highest and records which thread ran `prepare`.
    struct ThreadRecordingScorer {
        prepared_on: Arc<Mutex<Option<ThreadId>>>,
    }

    impl EmbeddingScorer for ThreadRecordingScorer {
        fn score(
            &self,
            _image: &DynamicImage,
            candidates: &[String],
        ) -> TaggingResult<ScoreVector> {
            let logits: Vec<f32> = candidates
                .iter()
                .map(|c| if c == "pizza" { 5.0 } else { 0.0 })
                .collect();
            Ok(ScoreVector::from_logits(&logits))
        }

        fn prepare(&self, _candidates: &CandidateSet) -> TaggingResult<()> {
            *self.prepared_on.lock().unwrap() = Some(std::thread::current().id());
            Ok(())
        }
    }

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(8, 8));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageFormat::Png).unwrap();
        buf.into_inner()
    }

    #[tokio::test]
    async fn tagger_is_prepared_off_the_runtime_thread() {
        let prepared_on = Arc::new(Mutex::new(None));
        let scorer = ThreadRecordingScorer {
            prepared_on: Arc::clone(&prepared_on),
        };

        let (bytes, report) = suggest_blocking(
            move |_| Ok(scorer),
            TagVocabulary::reference(),
            Config::default(),
            png_bytes(),
            "lunch.png".to_string(),
            1,
        )
        .await
        .unwrap();

        assert_eq!(bytes, png_bytes());
        assert_eq!(report.tag_names(), vec!["pizza"]);
        let prepare_thread = prepared_on.lock().unwrap().expect("prepare was called");
        assert_ne!(prepare_thread, std::thread::current().id());
    }

    #[tokio::test]
    async fn invalid_upload_asks_for_a_valid_image() {
        let scorer = ThreadRecordingScorer {
            prepared_on: Arc::new(Mutex::new(None)),
        };
        let err = suggest_blocking(
            move |_| Ok(scorer),
            TagVocabulary::reference(),
            Config::default(),
            b"not an image".to_vec(),
            "broken.png".to_string(),
            5,
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Please upload a valid image file"));
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected_before_loading_models() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"not an image").unwrap();

        let args = TagArgs {
            image: path,
            top_k: None,
            vocabulary: None,
            no_save: true,
            format: None,
            pretty: false,
        };
        let err = execute(args, &Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("Unsupported file type"));
    }
}
