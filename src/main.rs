use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::info;

use ebookify::utils::display_elapsed_time;
use ebookify::{OutputPaths, Settings, StoryConfig, StoryCrawler, logger};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    logger::init();

    let story_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: ebookify <story.json>")?;

    let settings = Settings::load()?;
    let story = StoryConfig::load(&story_path)?;
    let paths = OutputPaths::for_input(&story_path);

    info!(
        "collecting {} chapters of {}",
        story.urls.len(),
        story.expansion
    );
    let start = Instant::now();

    let crawler = StoryCrawler::new(&settings).await?;
    let outputs = crawler.generate(&story, &paths).await?;
    outputs.write(&paths).await?;

    info!("{} network fetches", crawler.cache().network_fetches());
    display_elapsed_time(start.elapsed());
    Ok(())
}
