use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use strum::{Display, EnumString};

/// How inline images are marked in the extracted lines.
///
/// * `Placeholder` - opaque `%%IMAGE_<n>%%` tokens.
/// * `HtmlTag` - literal `<img src='...'>` tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ImageMode {
    #[default]
    Placeholder,
    HtmlTag,
}

/// Marker strings used by the line normalizer to recognise boilerplate.
///
/// # Fields
///
/// * `watermark_suffix` - A line ending with this is a watermark/footer line.
/// * `brand_marker` - A line containing this is a watermark/footer line.
/// * `secondary_marker` - Phrase printed next to watermarks in running headers.
/// * `banner_phrase` - A line containing this is dropped together with the next line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseMarkers {
    pub watermark_suffix: String,
    pub brand_marker: String,
    pub secondary_marker: String,
    pub banner_phrase: String,
}

impl Default for NoiseMarkers {
    fn default() -> Self {
        NoiseMarkers {
            watermark_suffix: ".COM".to_string(),
            brand_marker: "CERT MAGE".to_string(),
            secondary_marker: "Exam Dumps".to_string(),
            banner_phrase: "Questions and Answers PDF".to_string(),
        }
    }
}

/// `ExtractorConfig` holds the knobs of one extraction run.
///
/// # Fields
///
/// * `noise` - Boilerplate markers for the line normalizer.
/// * `image_mode` - Which kind of inline image token to reconcile.
/// * `topic_key_prefix` - Prefix of the topic keys in the JSON output (`topic1`, ...).
/// * `dedupe` - Whether to run the deduplication pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub noise: NoiseMarkers,
    pub image_mode: ImageMode,
    pub topic_key_prefix: String,
    pub dedupe: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            noise: NoiseMarkers::default(),
            image_mode: ImageMode::default(),
            topic_key_prefix: "topic".to_string(),
            dedupe: true,
        }
    }
}

impl ExtractorConfig {
    /// Creates a new `ExtractorConfig` with default markers and placeholder images.
    pub fn new() -> ExtractorConfig {
        ExtractorConfig::default()
    }

    /// Loads a configuration from a JSON file.
    ///
    /// Fields missing from the file keep their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<ExtractorConfig> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str::<ExtractorConfig>(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(config)
    }
}
