use scraper::{ElementRef, Html};
use tracing::{debug, instrument};

use crate::epub::chapter::ContentBlock;
use crate::epub::markup::{Element, Kind};
use crate::error::{Error, Result};
use crate::extractor::{ChapterExtractor, RuleAction, slug};

/// A chapter as read from its page, before images are localized.
#[derive(Debug, Clone)]
pub struct ChapterDraft {
    pub title: String,
    pub anchor: String,
    pub author: String,
    pub blocks: Vec<ContentBlock>,
    /// Image `src` values found in every element that passed the rule
    /// filter, in document order, without duplicates.
    pub images: Vec<String>,
}

#[derive(Debug)]
pub struct Parser {
    extractor: ChapterExtractor,
}

impl Parser {
    pub fn new(extractor: ChapterExtractor) -> Self {
        Self { extractor }
    }

    /// Reads one chapter page. The parsed document never outlives this call.
    #[instrument(skip(self, html))]
    pub fn chapter(&self, html: &str, url: &str) -> Result<ChapterDraft> {
        let document = Html::parse_document(html);

        let title = self
            .extractor
            .extract_title(&document)
            .ok_or_else(|| Error::extraction(url, "document title (`title`)"))?;
        let mut author = self
            .extractor
            .extract_author(&document)
            .ok_or_else(|| Error::extraction(url, self.extractor.author_description()))?;
        let content = self
            .extractor
            .content_region(&document)
            .ok_or_else(|| Error::extraction(url, self.extractor.content_description()))?;

        let mut blocks = Vec::new();
        let mut images: Vec<String> = Vec::new();

        for element in content.children().filter_map(ElementRef::wrap) {
            let text = element.text().collect::<String>();
            if let Some(rule) = self.extractor.rules.classify(&text) {
                match rule.action {
                    RuleAction::Author => {
                        author = rule.byline(&text);
                        debug!(%author, "author override");
                    }
                    RuleAction::Skip => debug!(pattern = %rule.pattern, "skipping boilerplate"),
                }
                continue;
            }

            for src in self.extractor.image_sources(element) {
                if !images.contains(&src) {
                    images.push(src);
                }
            }

            if let Some(block) = self.block(element) {
                blocks.push(block);
            }
        }

        if blocks.last().is_some_and(ContentBlock::is_rule) {
            blocks.pop();
        }

        debug!(%title, blocks = blocks.len(), images = images.len(), "chapter parsed");
        Ok(ChapterDraft {
            anchor: slug(&title),
            title,
            author,
            blocks,
            images,
        })
    }

    fn block(&self, element: ElementRef) -> Option<ContentBlock> {
        if let Some(caption) = self.extractor.figure_caption(element) {
            return Some(ContentBlock::Illustration { caption });
        }

        match Kind::from_name(element.value().name()) {
            Kind::P => Some(ContentBlock::Paragraph(Element::from_source(element))),
            Kind::Hr => Some(ContentBlock::Rule(Element::from_source(element))),
            other => {
                debug!(tag = other.as_str(), "discarding element");
                None
            }
        }
    }
}
