pub mod rules;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::config::SiteConfig;
use crate::error::{Error, Result};

pub use rules::{RuleAction, Rules, TextRule};

/// Compiled selectors and policies for one chapter page layout.
#[derive(Debug)]
pub struct ChapterExtractor {
    pub title: Selector,
    pub author: Selector,
    pub content: Selector,
    pub figure: Selector,
    pub figcaption: Selector,
    pub image: Selector,
    pub title_suffix: Regex,
    pub rules: Rules,
    // kept for error messages
    author_css: String,
    content_css: String,
}

impl ChapterExtractor {
    pub fn new(site: &SiteConfig) -> Result<Self> {
        let title_suffix = Regex::new(&site.title_suffix)
            .map_err(|e| Error::config(format!("site.title_suffix: {}", e)))?;

        Ok(Self {
            title: parse_selector("title", "title")?,
            author: parse_selector(&site.author, "site.author")?,
            content: parse_selector(&site.content, "site.content")?,
            figure: parse_selector("figure", "figure")?,
            figcaption: parse_selector("figcaption", "figcaption")?,
            image: parse_selector("img", "img")?,
            title_suffix,
            rules: Rules::new(site.rules.clone()),
            author_css: site.author.clone(),
            content_css: site.content.clone(),
        })
    }

    /// The declared document title with any `| Site Name` suffix removed.
    pub fn extract_title(&self, document: &Html) -> Option<String> {
        let raw = document
            .select(&self.title)
            .next()?
            .text()
            .collect::<String>();
        let title = self.title_suffix.replace_all(&raw, "").trim().to_string();

        if title.is_empty() { None } else { Some(title) }
    }

    pub fn extract_author(&self, document: &Html) -> Option<String> {
        let byline = document.select(&self.author).next()?;
        Some(byline.text().collect::<String>().trim().to_string())
    }

    pub fn content_region<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        document.select(&self.content).next()
    }

    /// Caption of the first captioned figure inside `element`.
    pub fn figure_caption(&self, element: ElementRef) -> Option<String> {
        element.select(&self.figure).find_map(|figure| {
            figure
                .select(&self.figcaption)
                .next()
                .map(|caption| caption.text().collect::<String>().trim().to_string())
        })
    }

    /// `src` of every image nested in `element`, in document order.
    pub fn image_sources(&self, element: ElementRef) -> Vec<String> {
        element
            .select(&self.image)
            .filter_map(|img| img.value().attr("src"))
            .filter(|src| !src.trim().is_empty())
            .map(|src| src.to_owned())
            .collect()
    }

    pub fn author_description(&self) -> String {
        format!("author byline (`{}`)", self.author_css)
    }

    pub fn content_description(&self) -> String {
        format!("content region (`{}`)", self.content_css)
    }
}

/// Anchor id for a chapter title: lowercase, spaces as hyphens.
pub fn slug(title: &str) -> String {
    title.replace(' ', "-").to_lowercase()
}

fn parse_selector(css: &str, field: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| Error::config(format!("{}: invalid selector '{}': {}", field, css, e)))
}
