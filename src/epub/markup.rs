//! Owned output element model.
//!
//! Source pages are only ever read through `scraper`; everything that ends up
//! in the content document is built here, either explicitly or by copying a
//! retained source element with [`Element::from_source`].

use quick_xml::escape::{escape, partial_escape};
use scraper::ElementRef;

const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Html,
    Head,
    Meta,
    Title,
    Link,
    Body,
    Div,
    Span,
    Strong,
    H1,
    H2,
    H3,
    P,
    Hr,
    Ol,
    Li,
    A,
    Img,
    Figure,
    /// Any other tag copied from a source page.
    Other(String),
}

impl Kind {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "html" => Kind::Html,
            "head" => Kind::Head,
            "meta" => Kind::Meta,
            "title" => Kind::Title,
            "link" => Kind::Link,
            "body" => Kind::Body,
            "div" => Kind::Div,
            "span" => Kind::Span,
            "strong" => Kind::Strong,
            "h1" => Kind::H1,
            "h2" => Kind::H2,
            "h3" => Kind::H3,
            "p" => Kind::P,
            "hr" => Kind::Hr,
            "ol" => Kind::Ol,
            "li" => Kind::Li,
            "a" => Kind::A,
            "img" => Kind::Img,
            "figure" => Kind::Figure,
            other => Kind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Kind::Html => "html",
            Kind::Head => "head",
            Kind::Meta => "meta",
            Kind::Title => "title",
            Kind::Link => "link",
            Kind::Body => "body",
            Kind::Div => "div",
            Kind::Span => "span",
            Kind::Strong => "strong",
            Kind::H1 => "h1",
            Kind::H2 => "h2",
            Kind::H3 => "h3",
            Kind::P => "p",
            Kind::Hr => "hr",
            Kind::Ol => "ol",
            Kind::Li => "li",
            Kind::A => "a",
            Kind::Img => "img",
            Kind::Figure => "figure",
            Kind::Other(name) => name,
        }
    }

    /// Elements that never have content and are written self-closed.
    pub fn is_void(&self) -> bool {
        match self {
            Kind::Meta | Kind::Link | Kind::Hr | Kind::Img => true,
            Kind::Other(name) => matches!(
                name.as_str(),
                "br" | "wbr" | "col" | "source" | "area" | "input" | "embed" | "track"
            ),
            _ => false,
        }
    }

    /// Containers whose element children go on their own indented lines.
    fn is_block(&self) -> bool {
        matches!(
            self,
            Kind::Html | Kind::Head | Kind::Body | Kind::Div | Kind::Ol | Kind::Figure
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub kind: Kind,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn child(mut self, element: Element) -> Self {
        self.push(element);
        self
    }

    pub fn push(&mut self, element: Element) {
        self.children.push(Node::Element(element));
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Replaces the value in place if present, otherwise appends.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(n, _)| n != name);
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Visits this element and all element descendants, depth first.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Element)) {
        visit(self);
        for child in self.children.iter_mut() {
            if let Node::Element(element) = child {
                element.walk_mut(visit);
            }
        }
    }

    pub fn text_content(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => e.collect_text(out),
            }
        }
    }

    /// Deep copy of a source element. Comments and processing instructions
    /// are dropped; attributes are sorted by name so output is stable.
    pub fn from_source(source: ElementRef) -> Self {
        let value = source.value();
        let mut attrs: Vec<(String, String)> = value
            .attrs()
            .map(|(name, value)| (name.to_owned(), value.to_owned()))
            .collect();
        attrs.sort();

        let children = source
            .children()
            .filter_map(|node| match node.value() {
                scraper::Node::Text(text) => Some(Node::Text(text.to_string())),
                scraper::Node::Element(_) => {
                    ElementRef::wrap(node).map(|e| Node::Element(Element::from_source(e)))
                }
                _ => None,
            })
            .collect();

        Self {
            kind: Kind::from_name(value.name()),
            attrs,
            children,
        }
    }

    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out, 0);
        out
    }

    /// Writes the element on its own line(s) at `depth`.
    pub fn write_to(&self, out: &mut String, depth: usize) {
        indent(out, depth);
        let has_text = self.children.iter().any(|c| matches!(c, Node::Text(_)));

        if !self.kind.is_block() || has_text || self.children.is_empty() {
            self.write_inline(out);
            out.push('\n');
            return;
        }

        self.write_open(out);
        out.push('>');
        out.push('\n');
        for child in &self.children {
            if let Node::Element(element) = child {
                element.write_to(out, depth + 1);
            }
        }
        indent(out, depth);
        self.write_close(out);
        out.push('\n');
    }

    fn write_inline(&self, out: &mut String) {
        self.write_open(out);
        if self.children.is_empty() {
            if self.kind.is_void() {
                out.push_str("/>");
            } else {
                out.push('>');
                self.write_close(out);
            }
            return;
        }

        out.push('>');
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(&partial_escape(text.as_str())),
                Node::Element(element) => element.write_inline(out),
            }
        }
        self.write_close(out);
    }

    fn write_open(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.kind.as_str());
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
    }

    fn write_close(&self, out: &mut String) {
        out.push_str("</");
        out.push_str(self.kind.as_str());
        out.push('>');
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::*;

    #[test]
    fn builder_keeps_attribute_order() {
        let link = Element::new(Kind::Link)
            .attr("rel", "stylesheet")
            .attr("href", "style.css")
            .attr("type", "text/css");
        assert_eq!(
            link.to_markup(),
            "<link rel=\"stylesheet\" href=\"style.css\" type=\"text/css\"/>\n"
        );
    }

    #[test]
    fn set_attr_replaces_in_place() {
        let mut img = Element::new(Kind::Img).attr("alt", "x").attr("src", "http://a/b.jpg");
        img.set_attr("src", ".cache/b.jpg");
        assert_eq!(
            img.attrs(),
            &[
                ("alt".to_string(), "x".to_string()),
                ("src".to_string(), ".cache/b.jpg".to_string())
            ]
        );
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        let a = Element::new(Kind::A)
            .attr("href", "https://example.com/?a=1&b=\"2\"")
            .text("Fish & <Chips>");
        assert_eq!(
            a.to_markup(),
            "<a href=\"https://example.com/?a=1&amp;b=&quot;2&quot;\">Fish &amp; &lt;Chips&gt;</a>\n"
        );
    }

    #[test]
    fn block_containers_indent_children() {
        let ol = Element::new(Kind::Ol)
            .child(Element::new(Kind::Li).child(Element::new(Kind::A).attr("href", "#one").text("One")));
        assert_eq!(
            ol.to_markup(),
            "<ol>\n  <li><a href=\"#one\">One</a></li>\n</ol>\n"
        );
    }

    #[test]
    fn empty_non_void_elements_are_not_self_closed() {
        assert_eq!(Element::new(Kind::Ol).to_markup(), "<ol></ol>\n");
        assert_eq!(Element::new(Kind::Hr).to_markup(), "<hr/>\n");
    }

    #[test]
    fn from_source_copies_inline_markup() {
        let document = Html::parse_fragment(
            r#"<p title="t" class="lead">Hello <em>there</em><!-- note --><br> friend</p>"#,
        );
        let p = document.select(&Selector::parse("p").unwrap()).next().unwrap();
        let copy = Element::from_source(p);

        assert_eq!(copy.kind, Kind::P);
        assert_eq!(copy.get_attr("class"), Some("lead"));
        assert_eq!(copy.text_content(), "Hello there friend");
        assert_eq!(
            copy.to_markup(),
            "<p class=\"lead\" title=\"t\">Hello <em>there</em><br/> friend</p>\n"
        );
    }

    #[test]
    fn walk_mut_reaches_nested_images() {
        let document = Html::parse_fragment(
            r#"<p><span><img src="a.jpg"></span><img src="b.jpg"></p>"#,
        );
        let p = document.select(&Selector::parse("p").unwrap()).next().unwrap();
        let mut copy = Element::from_source(p);

        let mut seen = Vec::new();
        copy.walk_mut(&mut |e: &mut Element| {
            if e.kind == Kind::Img {
                seen.push(e.get_attr("src").unwrap_or_default().to_string());
                e.set_attr("src", "local.jpg");
            }
        });

        assert_eq!(seen, vec!["a.jpg", "b.jpg"]);
        assert_eq!(copy.to_markup().matches("local.jpg").count(), 2);
    }
}
