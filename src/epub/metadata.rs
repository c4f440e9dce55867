use quick_xml::escape::{escape, partial_escape};
use tracing::{info, instrument};

use crate::epub::book::TOC_ID;

static CREATOR: &str = "Magic Creative Team";
static PUBLISHER: &str = "Blind Eternities";
static COPYRIGHT: &str = "Wizards of the Coast";

/// Everything the OPF package document is templated from.
#[derive(Debug, Clone)]
pub struct PackageDescriptor {
    pub identifier: String,
    pub title: String,
    pub content_href: String,
    pub navigation_href: String,
    pub stylesheet_href: String,
    pub cover_href: String,
}

impl PackageDescriptor {
    #[instrument(skip_all)]
    pub fn content_opf(&self) -> String {
        info!("rendering package descriptor");
        let mut content_opf = String::new();
        self.opf_header(&mut content_opf);
        self.opf_metadata(&mut content_opf);
        self.opf_manifest(&mut content_opf);
        self.opf_spine(&mut content_opf);
        self.opf_guide(&mut content_opf);
        content_opf.push_str("</package>\n");
        content_opf
    }

    fn opf_header(&self, content_opf: &mut String) {
        content_opf.push_str(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="2.0" xmlns="http://www.idpf.org/2007/opf" unique-identifier="BookId">"#,
        );
    }

    fn opf_metadata(&self, content_opf: &mut String) {
        content_opf.push_str(&format!(
            r#"
    <metadata xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:opf="http://www.idpf.org/2007/opf">
        <dc:identifier id="BookId">{}</dc:identifier>
        <dc:title>{}</dc:title>
        <dc:language>en</dc:language>
        <dc:creator>{}</dc:creator>
        <dc:rights>{}</dc:rights>
        <dc:publisher>{}</dc:publisher>
        <meta name="cover" content="cover-image"/>
    </metadata>"#,
            partial_escape(self.identifier.as_str()),
            partial_escape(self.title.as_str()),
            CREATOR,
            COPYRIGHT,
            PUBLISHER
        ));
    }

    fn opf_manifest(&self, content_opf: &mut String) {
        content_opf.push_str(&format!(
            r#"
    <manifest>
        <item id="book" href="{}" media-type="application/xhtml+xml"/>
        <item id="stylesheet" href="{}" media-type="text/css"/>
        <item id="ncx" href="{}" media-type="application/x-dtbncx+xml"/>
        <item id="cover-image" href="{}" media-type="{}"/>
    </manifest>"#,
            escape(self.content_href.as_str()),
            escape(self.stylesheet_href.as_str()),
            escape(self.navigation_href.as_str()),
            escape(self.cover_href.as_str()),
            media_type(&self.cover_href)
        ));
    }

    fn opf_spine(&self, content_opf: &mut String) {
        content_opf.push_str(
            r#"
    <spine toc="ncx">
        <itemref idref="book"/>
    </spine>"#,
        );
    }

    fn opf_guide(&self, content_opf: &mut String) {
        let href = escape(self.content_href.as_str());
        content_opf.push_str(&format!(
            r#"
    <guide>
        <reference type="toc" title="Table of Contents" href="{}#{}"/>
        <reference type="text" title="Beginning" href="{}"/>
    </guide>
"#,
            href, TOC_ID, href
        ));
    }
}

fn media_type(filename: &str) -> &'static str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".png") {
        "image/png"
    } else if lower.ends_with(".jpg") || lower.ends_with(".jpeg") {
        "image/jpeg"
    } else if lower.ends_with(".gif") {
        "image/gif"
    } else {
        "application/octet-stream"
    }
}
