pub mod cache;
pub mod parser;
pub mod task;

pub use cache::{FetchCache, Payload};
pub use parser::{ChapterDraft, Parser};
pub use task::TaskManager;

use std::collections::HashMap;
use std::iter;
use std::path::{self, Component, Path};
use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::{Settings, StoryConfig};
use crate::epub::markup::{Element, Kind};
use crate::epub::{Book, Chapter, ContentBlock, OutputPaths, Outputs};
use crate::error::{Error, Result};
use crate::extractor::ChapterExtractor;

/// Bytes escaped in each segment of an image reference. Cache keys keep the
/// query and fragment of the source URL, so `?`, `#` and `%` must not reach
/// the document literally.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Turns a story config into the finished documents.
pub struct StoryCrawler {
    cache: Arc<FetchCache>,
    parser: Arc<Parser>,
    concurrency_limit: usize,
}

impl StoryCrawler {
    pub async fn new(settings: &Settings) -> Result<Self> {
        let parser = Parser::new(ChapterExtractor::new(&settings.site)?);
        let cache = FetchCache::open(
            &settings.cache_dir,
            Duration::from_secs(settings.timeout_secs),
        )
        .await?;

        Ok(Self {
            cache: Arc::new(cache),
            parser: Arc::new(parser),
            concurrency_limit: settings.concurrency_limit.max(1),
        })
    }

    pub fn cache(&self) -> &FetchCache {
        &self.cache
    }

    #[instrument(skip_all, fields(expansion = %story.expansion))]
    pub async fn generate(&self, story: &StoryConfig, paths: &OutputPaths) -> Result<Outputs> {
        let chapters = self.chapters(&story.urls, paths.dir()).await?;

        let mut book = Book::new(&story.expansion);
        for chapter in chapters {
            book.append(chapter);
        }
        info!("assembled {} chapters", book.len());

        Ok(Outputs::render(&book, paths))
    }

    /// Fetches and extracts every chapter, numbered from 1 in input order.
    /// Image references are written relative to `content_dir`, the directory
    /// the content document will live in.
    #[instrument(skip_all, fields(chapters = urls.len()))]
    pub async fn chapters(&self, urls: &[String], content_dir: &Path) -> Result<Vec<Chapter>> {
        let permits = Arc::new(Semaphore::new(self.concurrency_limit));
        let content_dir = Arc::new(content_dir.to_path_buf());
        let mut tasks = TaskManager::new();

        for (index, url) in urls.iter().enumerate() {
            let cache = Arc::clone(&self.cache);
            let parser = Arc::clone(&self.parser);
            let permits = Arc::clone(&permits);
            let content_dir = Arc::clone(&content_dir);
            let url = url.clone();

            tasks.spawn(index, async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .map_err(|e| Error::Task(e.to_string()))?;
                fetch_chapter(&cache, &parser, &content_dir, index + 1, &url).await
            });
        }

        tasks.wait().await
    }
}

#[instrument(skip(cache, parser, content_dir))]
async fn fetch_chapter(
    cache: &FetchCache,
    parser: &Parser,
    content_dir: &Path,
    number: usize,
    url: &str,
) -> Result<Chapter> {
    let html = cache.text(url).await?;
    let draft = parser.chapter(&html, url)?;
    let blocks = localize_images(cache, content_dir, url, draft.images, draft.blocks).await?;

    info!("chapter {}: {}", number, draft.title);
    Ok(Chapter {
        number,
        title: draft.title,
        anchor: draft.anchor,
        author: draft.author,
        url: url.to_string(),
        blocks,
    })
}

/// Fetches every image through the cache and points the blocks at the local
/// copies.
async fn localize_images(
    cache: &FetchCache,
    content_dir: &Path,
    url: &str,
    images: Vec<String>,
    mut blocks: Vec<ContentBlock>,
) -> Result<Vec<ContentBlock>> {
    let mut local = HashMap::new();
    for src in images {
        if src.starts_with("data:") {
            continue;
        }
        let absolute = resolve(url, &src)?;
        let path = cache.path(&absolute).await?;
        let reference = image_reference(content_dir, &path)?;
        debug!("image {} -> {}", src, reference);
        local.insert(src, reference);
    }

    if local.is_empty() {
        return Ok(blocks);
    }

    for block in blocks.iter_mut() {
        if let ContentBlock::Paragraph(element) | ContentBlock::Rule(element) = block {
            element.walk_mut(&mut |e: &mut Element| rewrite_image(e, &local));
        }
    }
    Ok(blocks)
}

fn rewrite_image(element: &mut Element, local: &HashMap<String, String>) {
    if element.kind != Kind::Img {
        return;
    }
    let Some(path) = element.get_attr("src").and_then(|src| local.get(src)) else {
        return;
    };
    let path = path.clone();
    element.set_attr("src", path);
    element.remove_attr("srcset");
}

/// Percent-encoded relative reference from a document in `from` to the file
/// at `target`.
fn image_reference(from: &Path, target: &Path) -> Result<String> {
    let from_abs = path::absolute(from).map_err(|e| Error::io(from, e))?;
    let target_abs = path::absolute(target).map_err(|e| Error::io(target, e))?;

    let from: Vec<_> = from_abs
        .components()
        .filter(|c| *c != Component::CurDir)
        .collect();
    let to: Vec<_> = target_abs
        .components()
        .filter(|c| *c != Component::CurDir)
        .collect();
    let shared = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let up = iter::repeat_n("..".to_string(), from.len() - shared);
    let down = to[shared..].iter().map(|c| {
        utf8_percent_encode(&c.as_os_str().to_string_lossy(), SEGMENT).to_string()
    });
    Ok(up.chain(down).collect::<Vec<_>>().join("/"))
}

fn resolve(base: &str, src: &str) -> Result<String> {
    Url::parse(base)
        .and_then(|base| base.join(src))
        .map(String::from)
        .map_err(|e| Error::extraction(base, format!("resolvable image `{}` ({})", src, e)))
}
