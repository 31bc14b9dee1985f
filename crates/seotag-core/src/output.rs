//! Rendering tag reports as text, JSON or JSON Lines.

use std::io::{self, Write};

use crate::types::TagReport;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable summary
    Text,
    /// Single JSON object
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Some(Self::Text),
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Writes tag reports to any `Write` sink.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer.
    ///
    /// `pretty` only affects the JSON format.
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
        }
    }

    /// Write one report.
    pub fn write_report(&mut self, report: &TagReport) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => self.write_text(report)?,
            OutputFormat::Json if self.pretty => {
                serde_json::to_writer_pretty(&mut self.writer, report)
                    .map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
            OutputFormat::Json | OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, report).map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
        }
        self.writer.flush()
    }

    fn write_text(&mut self, report: &TagReport) -> io::Result<()> {
        if let Some(path) = &report.stored_path {
            writeln!(self.writer, "Image saved at {}", path.display())?;
        }
        writeln!(
            self.writer,
            "{} ({}x{}, {})",
            report.file_name, report.width, report.height, report.format
        )?;
        writeln!(self.writer, "Suggested Tags: {}", report.tag_names().join(", "))?;
        for (rank, tag) in report.tags.iter().enumerate() {
            let category = tag.category.as_deref().unwrap_or("-");
            writeln!(
                self.writer,
                "  {:>2}. {:<24} {:>6.2}%  {}",
                rank + 1,
                tag.name,
                tag.confidence * 100.0,
                category
            )?;
        }
        Ok(())
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tag;
    use std::path::PathBuf;

    fn report() -> TagReport {
        TagReport {
            file_name: "beach.jpg".to_string(),
            stored_path: Some(PathBuf::from("upload_images/beach.jpg")),
            width: 800,
            height: 600,
            format: "jpeg".to_string(),
            tags: vec![
                Tag::with_category("beach", 0.5, "Landscapes"),
                Tag::with_category("ocean", 0.25, "Landscapes"),
            ],
        }
    }

    fn render(format: OutputFormat, pretty: bool) -> String {
        let mut writer = OutputWriter::new(Vec::new(), format, pretty);
        writer.write_report(&report()).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_write_text() {
        let output = render(OutputFormat::Text, false);
        assert!(output.contains("Image saved at upload_images/beach.jpg"));
        assert!(output.contains("Suggested Tags: beach, ocean"));
        assert!(output.contains("50.00%"));
    }

    #[test]
    fn test_write_json() {
        let output = render(OutputFormat::Json, false);
        assert!(output.contains("\"file_name\":\"beach.jpg\""));
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_write_pretty_json() {
        let output = render(OutputFormat::Json, true);
        assert!(output.lines().count() > 1);
        let parsed: TagReport = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.tags.len(), 2);
    }

    #[test]
    fn test_jsonl_ignores_pretty() {
        let output = render(OutputFormat::JsonLines, true);
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(OutputFormat::parse("text"), Some(OutputFormat::Text));
        assert_eq!(OutputFormat::parse("json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("JSONL"), Some(OutputFormat::JsonLines));
        assert_eq!(OutputFormat::parse("invalid"), None);
    }
}
