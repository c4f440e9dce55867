pub mod book;
pub mod chapter;
pub mod markup;
pub mod metadata;
pub mod navigation;

pub use book::Book;
pub use chapter::{Chapter, ContentBlock, TocEntry};
pub use metadata::PackageDescriptor;
pub use navigation::NavPoint;

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{info, instrument};

use crate::error::{Error, Result};

/// Stylesheet and cover are provided next to the outputs, never generated.
pub const STYLESHEET: &str = "style.css";
pub const COVER: &str = "cover.jpg";

/// Where the three documents of a run are written: siblings of the story
/// file, sharing its base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub content: PathBuf,
    pub navigation: PathBuf,
    pub package: PathBuf,
}

impl OutputPaths {
    pub fn for_input(input: &Path) -> Self {
        Self {
            content: input.with_extension("html"),
            navigation: input.with_extension("ncx"),
            package: input.with_extension("opf"),
        }
    }

    /// Directory the documents are written to.
    pub fn dir(&self) -> &Path {
        match self.content.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Path of `path` as referenced from inside the package.
    pub fn href(path: &Path) -> String {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// The serialized documents of a finished book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    pub content: String,
    pub navigation: String,
    pub package: String,
}

impl Outputs {
    pub fn render(book: &Book, paths: &OutputPaths) -> Self {
        let content_href = OutputPaths::href(&paths.content);
        let navigation_href = OutputPaths::href(&paths.navigation);
        let identifier = book.identifier();

        let points = navigation::nav_points(book.toc(), &content_href);
        let navigation = navigation::toc_ncx(&identifier, book.title(), &points);

        let package = PackageDescriptor {
            identifier,
            title: book.title().to_string(),
            content_href,
            navigation_href,
            stylesheet_href: STYLESHEET.to_string(),
            cover_href: COVER.to_string(),
        }
        .content_opf();

        Self {
            content: book.to_xhtml(),
            navigation,
            package,
        }
    }

    #[instrument(skip_all)]
    pub async fn write(&self, paths: &OutputPaths) -> Result<()> {
        for (path, body) in [
            (&paths.content, &self.content),
            (&paths.navigation, &self.navigation),
            (&paths.package, &self.package),
        ] {
            fs::write(path, body)
                .await
                .map_err(|e| Error::io(path, e))?;
            info!("written: {}", path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_share_the_story_base_name() {
        let paths = OutputPaths::for_input(Path::new("stories/aer.json"));
        assert_eq!(paths.content, PathBuf::from("stories/aer.html"));
        assert_eq!(paths.navigation, PathBuf::from("stories/aer.ncx"));
        assert_eq!(paths.package, PathBuf::from("stories/aer.opf"));
        assert_eq!(OutputPaths::href(&paths.content), "aer.html");
        assert_eq!(paths.dir(), Path::new("stories"));
        assert_eq!(OutputPaths::for_input(Path::new("aer.json")).dir(), Path::new("."));
    }

    #[test]
    fn render_wires_documents_together() {
        let book = Book::new("Aether Revolt");
        let outputs = Outputs::render(&book, &OutputPaths::for_input(Path::new("aer.json")));

        assert!(outputs.navigation.contains(r#"<content src="aer.html#table-of-contents"/>"#));
        assert!(outputs.package.contains(r#"href="aer.ncx""#));
        assert!(outputs.package.contains(&format!(
            "<dc:identifier id=\"BookId\">{}</dc:identifier>",
            book.identifier()
        )));
        assert!(outputs.navigation.contains(&format!(
            "<meta name=\"dtb:uid\" content=\"{}\"/>",
            book.identifier()
        )));
    }

    #[tokio::test]
    async fn write_creates_all_three_files() {
        let dir = tempfile::tempdir().unwrap();
        let paths = OutputPaths::for_input(&dir.path().join("aer.json"));
        let outputs = Outputs::render(&Book::new("Aether Revolt"), &paths);

        outputs.write(&paths).await.unwrap();

        assert_eq!(std::fs::read_to_string(&paths.content).unwrap(), outputs.content);
        assert_eq!(std::fs::read_to_string(&paths.navigation).unwrap(), outputs.navigation);
        assert_eq!(std::fs::read_to_string(&paths.package).unwrap(), outputs.package);
    }
}
