use quick_xml::escape::{escape, partial_escape};
use tracing::{info, instrument};

use crate::epub::book::TOC_ID;
use crate::epub::chapter::TocEntry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    pub id: String,
    pub label: String,
    pub play_order: usize,
    pub src: String,
}

/// Navigation points for a finished table of contents.
///
/// Play order 1 is the table of contents itself; chapters follow as 2, 3, ...
/// in exactly the order of `toc`.
pub fn nav_points(toc: &[TocEntry], content_href: &str) -> Vec<NavPoint> {
    let contents = NavPoint {
        id: TOC_ID.to_string(),
        label: "Table of Contents".to_string(),
        play_order: 1,
        src: format!("{}#{}", content_href, TOC_ID),
    };

    std::iter::once(contents)
        .chain(toc.iter().enumerate().map(|(index, entry)| NavPoint {
            id: entry.anchor.clone(),
            label: entry.title.clone(),
            play_order: index + 2,
            src: format!("{}#{}", content_href, entry.anchor),
        }))
        .collect()
}

/// Renders the NCX navigation document.
#[instrument(skip_all, fields(points = points.len()))]
pub fn toc_ncx(uid: &str, title: &str, points: &[NavPoint]) -> String {
    info!("rendering navigation document");
    let mut toc_ncx = String::new();

    toc_ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
    <head>
        <meta name="dtb:uid" content=""#,
    );
    toc_ncx.push_str(&escape(uid));
    toc_ncx.push_str(
        r#""/>
        <meta name="dtb:depth" content="1"/>
        <meta name="dtb:totalPageCount" content="0"/>
        <meta name="dtb:maxPageNumber" content="0"/>
    </head>
    <docTitle>
        <text>"#,
    );
    toc_ncx.push_str(&partial_escape(title));
    toc_ncx.push_str(
        r#"</text>
    </docTitle>
    <navMap>"#,
    );

    for point in points {
        toc_ncx.push_str(&format!(
            r#"
        <navPoint id="{}" playOrder="{}">
            <navLabel>
                <text>{}</text>
            </navLabel>
            <content src="{}"/>
        </navPoint>"#,
            escape(point.id.as_str()),
            point.play_order,
            partial_escape(point.label.as_str()),
            escape(point.src.as_str())
        ));
    }

    toc_ncx.push_str(
        r#"
    </navMap>
</ncx>
"#,
    );
    toc_ncx
}
