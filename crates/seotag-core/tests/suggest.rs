//! End-to-end tagging through the public API with a deterministic scorer.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use seotag_core::{
    select_top_k, CandidateSet, EmbeddingScorer, ImageStore, ScoreVector, SeoTagError, SeoTagger,
    TagVocabulary, TaggingError, TaggingResult,
};

/// Favors candidates whose text contains the keyword, by word count overlap.
struct KeywordScorer {
    keyword: &'static str,
}

impl EmbeddingScorer for KeywordScorer {
    fn score(&self, _image: &DynamicImage, candidates: &[String]) -> TaggingResult<ScoreVector> {
        if candidates.is_empty() {
            return Err(TaggingError::EmptyCandidateSet);
        }
        let logits: Vec<f32> = candidates
            .iter()
            .map(|c| {
                if c.eq_ignore_ascii_case(self.keyword) {
                    10.0
                } else if c.to_lowercase().contains(self.keyword) {
                    5.0
                } else {
                    0.0
                }
            })
            .collect();
        Ok(ScoreVector::from_logits(&logits))
    }

    fn prepare(&self, candidates: &CandidateSet) -> TaggingResult<()> {
        if candidates.is_empty() {
            return Err(TaggingError::EmptyCandidateSet);
        }
        Ok(())
    }
}

fn jpeg_bytes() -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 48, Rgb([250, 140, 30])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Jpeg).unwrap();
    buf.into_inner()
}

#[test]
fn reference_vocabulary_sunset_ranking() {
    let tagger = SeoTagger::new(
        KeywordScorer { keyword: "sunset" },
        TagVocabulary::reference(),
        5,
    )
    .unwrap();

    let report = tagger.suggest_bytes(&jpeg_bytes(), "evening.jpg").unwrap();
    assert_eq!(report.format, "jpeg");
    assert_eq!(
        report.tag_names(),
        vec![
            "sunset",
            "sunset",
            "desert sunset",
            "beach sunset",
            "mountain sunset"
        ]
    );
    assert!(report
        .tags
        .iter()
        .all(|t| t.category.as_deref() == Some("Landscapes")));
}

#[test]
fn score_vector_is_a_distribution() {
    let scorer = KeywordScorer { keyword: "cat" };
    let candidates: Vec<String> = ["cat", "dog", "cat", "tree"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let image = DynamicImage::ImageRgb8(RgbImage::new(4, 4));

    let scores = scorer.score(&image, &candidates).unwrap();
    assert_eq!(scores.len(), candidates.len());
    assert!(scores.iter().all(|&p| p >= 0.0));
    assert!((scores.iter().sum::<f32>() - 1.0).abs() < 1e-4);

    let top = select_top_k(&scores, &candidates, 2).unwrap();
    assert_eq!(top, vec!["cat", "cat"]);
}

#[test]
fn invalid_upload_is_recoverable() {
    let tagger = SeoTagger::new(
        KeywordScorer { keyword: "pizza" },
        TagVocabulary::reference(),
        5,
    )
    .unwrap();

    match tagger.suggest_bytes(b"", "nothing.png") {
        Err(SeoTagError::Tagging(err)) => assert!(err.is_recoverable()),
        other => panic!("expected InvalidImage, got {:?}", other.map(|r| r.file_name)),
    }
}

#[test]
fn store_save_then_tag_then_delete() {
    let dir = tempfile::tempdir().unwrap();
    let store = ImageStore::new(dir.path().join("upload_images"));
    let bytes = jpeg_bytes();

    let path = store.save(&bytes, "holiday.jpg").unwrap();
    let stored = std::fs::read(&path).unwrap();

    let tagger = SeoTagger::new(
        KeywordScorer { keyword: "beach" },
        TagVocabulary::reference(),
        3,
    )
    .unwrap();
    let report = tagger.suggest_bytes(&stored, "holiday.jpg").unwrap();
    assert_eq!(report.tags[0].name, "beach");

    store.delete(&path).unwrap();
    assert!(!path.exists());
}
