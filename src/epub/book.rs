use std::collections::HashSet;

use tracing::{debug, warn};

use crate::epub::STYLESHEET;
use crate::epub::chapter::{Chapter, TocEntry};
use crate::epub::markup::{Element, Kind};
use crate::extractor::slug;

pub const TITLE_PAGE_ID: &str = "title-page";
pub const TOC_ID: &str = "table-of-contents";
pub const DISCLAIMER_ID: &str = "disclaimer";

static DISCLAIMER: &str = "All stories are owned by Wizards of the Coast, this is intended \
merely to create a cache for personal use.";

/// The single growing content document of a run.
///
/// Chapters can only be appended; the table of contents and the body grow
/// together, in call order.
#[derive(Debug)]
pub struct Book {
    expansion: String,
    title: String,
    toc: Vec<TocEntry>,
    body: Vec<Element>,
    anchors: HashSet<String>,
}

impl Book {
    pub fn new(expansion: &str) -> Self {
        // Fixed ids of the title page and table of contents.
        let anchors = [TITLE_PAGE_ID, DISCLAIMER_ID, TOC_ID]
            .into_iter()
            .map(str::to_string)
            .collect();

        Self {
            expansion: expansion.to_string(),
            title: format!("{}: Collected Stories", expansion),
            toc: Vec::new(),
            body: Vec::new(),
            anchors,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Identifier shared by the package and navigation documents.
    pub fn identifier(&self) -> String {
        slug(&self.title)
    }

    pub fn toc(&self) -> &[TocEntry] {
        &self.toc
    }

    pub fn len(&self) -> usize {
        self.toc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toc.is_empty()
    }

    /// Appends the chapter header and blocks to the body and its entry to the
    /// table of contents. Returns the entry as recorded.
    pub fn append(&mut self, mut chapter: Chapter) -> &TocEntry {
        let anchor = self.claim_anchor(&chapter.anchor);
        if anchor != chapter.anchor {
            warn!(title = %chapter.title, from = %chapter.anchor, to = %anchor, "duplicate anchor renamed");
            chapter.anchor = anchor;
        }

        debug!(
            number = chapter.number,
            anchor = %chapter.anchor,
            blocks = chapter.blocks.len(),
            "appending chapter"
        );
        self.toc.push(chapter.toc_entry());

        let header = Element::new(Kind::Div)
            .attr("class", "ch-header")
            .child(Element::new(Kind::Span).text(chapter.number.to_string()))
            .child(
                Element::new(Kind::H2).attr("id", chapter.anchor.as_str()).child(
                    Element::new(Kind::A)
                        .attr("href", chapter.url.as_str())
                        .text(chapter.title.as_str()),
                ),
            )
            .child(Element::new(Kind::H3).text(chapter.author.as_str()));
        self.body.push(header);
        self.body
            .extend(chapter.blocks.into_iter().map(|block| block.into_element()));

        &self.toc[self.toc.len() - 1]
    }

    fn claim_anchor(&mut self, anchor: &str) -> String {
        if self.anchors.insert(anchor.to_string()) {
            return anchor.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}-{}", anchor, n);
            if self.anchors.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    fn head(&self) -> Element {
        Element::new(Kind::Head)
            .child(
                Element::new(Kind::Meta)
                    .attr("http-equiv", "Content-Type")
                    .attr("content", "text/html; charset=utf-8"),
            )
            .child(Element::new(Kind::Title).text(self.title.as_str()))
            .child(
                Element::new(Kind::Link)
                    .attr("rel", "stylesheet")
                    .attr("href", STYLESHEET)
                    .attr("type", "text/css"),
            )
    }

    fn title_page(&self) -> Element {
        Element::new(Kind::Div)
            .attr("id", TITLE_PAGE_ID)
            .child(Element::new(Kind::H1).text(self.expansion.as_str()))
            .child(Element::new(Kind::Span).text("Collected Stories"))
            .child(
                Element::new(Kind::Div)
                    .attr("id", DISCLAIMER_ID)
                    .child(Element::new(Kind::Strong).text("Disclaimer"))
                    .child(Element::new(Kind::P).text(DISCLAIMER)),
            )
    }

    fn table_of_contents(&self) -> Element {
        let mut list = Element::new(Kind::Ol);
        for entry in &self.toc {
            list.push(
                Element::new(Kind::Li).child(
                    Element::new(Kind::A)
                        .attr("href", format!("#{}", entry.anchor))
                        .text(entry.title.as_str()),
                ),
            );
        }

        Element::new(Kind::Div)
            .attr("id", TOC_ID)
            .child(Element::new(Kind::H2).text("Table of Contents"))
            .child(list)
    }

    /// Serializes the finished book as an XHTML content document.
    pub fn to_xhtml(&self) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n");
        out.push_str(r#"<html lang="en" xmlns="http://www.w3.org/1999/xhtml">"#);
        out.push('\n');
        self.head().write_to(&mut out, 1);
        out.push_str("  <body>\n");
        self.title_page().write_to(&mut out, 2);
        self.table_of_contents().write_to(&mut out, 2);
        for element in &self.body {
            element.write_to(&mut out, 2);
        }
        out.push_str("  </body>\n");
        out.push_str("</html>\n");
        out
    }
}
