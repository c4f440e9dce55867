use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{Error, Result};
use crate::extractor::rules::{TextRule, default_rules};

static SETTINGS_NAME: &str = "ebookify";
static ENV_PREFIX: &str = "EBOOKIFY";

/// The story description handed to a run: the set name and its chapter URLs,
/// in reading order.
#[derive(Debug, Clone, Deserialize)]
pub struct StoryConfig {
    pub expansion: String,
    pub urls: Vec<String>,
}

impl StoryConfig {
    #[instrument]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::config(format!(
                "story file {} does not exist",
                path.display()
            )));
        }

        let story: StoryConfig = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Json))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?;

        story.validate()?;
        debug!(chapters = story.urls.len(), "story config loaded");
        Ok(story)
    }

    pub fn validate(&self) -> Result<()> {
        if self.expansion.trim().is_empty() {
            return Err(Error::config("`expansion` must not be empty"));
        }
        if self.urls.is_empty() {
            return Err(Error::config("`urls` must list at least one chapter"));
        }

        for (index, raw) in self.urls.iter().enumerate() {
            let url = Url::parse(raw)
                .map_err(|e| Error::config(format!("`urls[{}]` ({}): {}", index, raw, e)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::config(format!(
                    "`urls[{}]` ({}): expected an http(s) URL",
                    index, raw
                )));
            }
        }
        Ok(())
    }
}

/// Runtime knobs. Every field has a default so the settings file is optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub cache_dir: PathBuf,
    pub timeout_secs: u64,
    pub concurrency_limit: usize,
    pub site: SiteConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(".cache"),
            timeout_secs: 30,
            concurrency_limit: 4,
            site: SiteConfig::default(),
        }
    }
}

impl Settings {
    /// Layers `ebookify.toml` (if present) and `EBOOKIFY_*` variables over
    /// the defaults.
    pub fn load() -> Result<Self> {
        config::Config::builder()
            .add_source(config::File::with_name(SETTINGS_NAME).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| Error::config(format!("settings: {}", e)))
    }
}

/// Where things live in a chapter page, and which body elements are
/// cross-link boilerplate.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub title_suffix: String,
    pub author: String,
    pub content: String,
    pub rules: Vec<TextRule>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title_suffix: r" \| [^|]*".to_string(),
            author: "div.author p".to_string(),
            content: "#content-detail-page-of-an-article".to_string(),
            rules: default_rules(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn story_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_story_in_order() {
        let file = story_file(
            r#"{"expansion": "Aether Revolt", "urls": ["https://example.com/a", "https://example.com/b"]}"#,
        );
        let story = StoryConfig::load(file.path()).unwrap();
        assert_eq!(story.expansion, "Aether Revolt");
        assert_eq!(story.urls, vec!["https://example.com/a", "https://example.com/b"]);
    }

    #[test]
    fn missing_urls_is_config_error() {
        let file = story_file(r#"{"expansion": "Aether Revolt"}"#);
        let err = StoryConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("urls")), "{err}");
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = StoryConfig::load(Path::new("/nonexistent/story.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn rejects_empty_and_relative_urls() {
        let empty = StoryConfig {
            expansion: "Kaladesh".into(),
            urls: vec![],
        };
        assert!(empty.validate().is_err());

        let relative = StoryConfig {
            expansion: "Kaladesh".into(),
            urls: vec!["https://example.com/a".into(), "/story/b".into()],
        };
        let err = relative.validate().unwrap_err().to_string();
        assert!(err.contains("urls[1]"), "{err}");
    }

    #[test]
    fn default_settings_target_the_story_archive() {
        let settings = Settings::default();
        assert_eq!(settings.cache_dir, PathBuf::from(".cache"));
        assert_eq!(settings.site.author, "div.author p");
        assert_eq!(settings.site.rules.len(), 4);
    }
}
