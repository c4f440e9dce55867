use crate::epub::markup::{Element, Kind};

/// One unit of chapter body that survived filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentBlock {
    /// A `<p>` copied verbatim from the source page.
    Paragraph(Element),
    /// A separator `<hr>`.
    Rule(Element),
    /// A captioned figure, reduced to its caption.
    Illustration { caption: String },
}

impl ContentBlock {
    pub fn into_element(self) -> Element {
        match self {
            ContentBlock::Paragraph(element) | ContentBlock::Rule(element) => element,
            ContentBlock::Illustration { caption } => Element::new(Kind::Div)
                .attr("class", "illustration")
                .child(Element::new(Kind::Span).text(caption)),
        }
    }

    pub fn is_rule(&self) -> bool {
        matches!(self, ContentBlock::Rule(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub anchor: String,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct Chapter {
    pub number: usize,
    pub title: String,
    pub anchor: String,
    pub author: String,
    pub url: String,
    pub blocks: Vec<ContentBlock>,
}

impl Chapter {
    pub fn toc_entry(&self) -> TocEntry {
        TocEntry {
            anchor: self.anchor.clone(),
            title: self.title.clone(),
        }
    }
}
