pub mod config;
pub mod crawler;
pub mod epub;
pub mod error;
pub mod extractor;
pub mod logger;
pub mod utils;

pub use config::{Settings, SiteConfig, StoryConfig};
pub use crawler::{FetchCache, StoryCrawler};
pub use epub::{Book, Chapter, ContentBlock, OutputPaths, Outputs, TocEntry};
pub use error::{Error, Result};
