use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};

/// What a cache lookup hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Decoded page text.
    Text(String),
    /// Location of the cached bytes; the bytes themselves are not loaded.
    Path(PathBuf),
}

/// Disk-backed, non-expiring store of fetched resources.
///
/// Entries are never invalidated: once a URL is on disk it is served from
/// there even if the remote copy changes.
#[derive(Debug)]
pub struct FetchCache {
    client: Client,
    dir: PathBuf,
    fetches: AtomicUsize,
    pending: AtomicUsize,
}

impl FetchCache {
    /// Creates the cache directory if needed.
    pub async fn open(dir: impl Into<PathBuf>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(ua_generator::ua::spoof_ua())
            .build()
            .map_err(|e| Error::config(format!("http client: {}", e)))?;
        Self::with_client(dir, client).await
    }

    pub async fn with_client(dir: impl Into<PathBuf>, client: Client) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::io(&dir, e))?;

        Ok(Self {
            client,
            dir,
            fetches: AtomicUsize::new(0),
            pending: AtomicUsize::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, url: &str) -> PathBuf {
        self.dir.join(cache_key(url))
    }

    /// Number of requests that actually went to the network.
    pub fn network_fetches(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, url: &str, binary: bool) -> Result<Payload> {
        let path = self.entry_path(url);
        let cached = fs::try_exists(&path)
            .await
            .map_err(|e| Error::io(&path, e))?;

        if cached {
            debug!("cache hit: {}", path.display());
            if binary {
                return Ok(Payload::Path(path));
            }
            let bytes = fs::read(&path).await.map_err(|e| Error::io(&path, e))?;
            return Ok(Payload::Text(String::from_utf8_lossy(&bytes).into_owned()));
        }

        let bytes = self.download(url).await?;
        self.store(&path, &bytes).await?;

        if binary {
            Ok(Payload::Path(path))
        } else {
            Ok(Payload::Text(String::from_utf8_lossy(&bytes).into_owned()))
        }
    }

    pub async fn text(&self, url: &str) -> Result<String> {
        match self.get(url, false).await? {
            Payload::Text(text) => Ok(text),
            Payload::Path(path) => Err(Error::io(
                path,
                std::io::Error::other("expected text payload"),
            )),
        }
    }

    pub async fn path(&self, url: &str) -> Result<PathBuf> {
        match self.get(url, true).await? {
            Payload::Path(path) => Ok(path),
            Payload::Text(_) => Err(Error::io(
                self.entry_path(url),
                std::io::Error::other("expected path payload"),
            )),
        }
    }

    async fn download(&self, url: &str) -> Result<Bytes> {
        info!("downloading: {}", url);
        self.fetches.fetch_add(1, Ordering::Relaxed);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::fetch(url, e))?;

        response.bytes().await.map_err(|e| Error::fetch(url, e))
    }

    /// Writes to a private `.part` file first so a reader never sees a
    /// truncated entry. The `.part` file is removed again if either step
    /// fails.
    async fn store(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let n = self.pending.fetch_add(1, Ordering::Relaxed);
        let mut part = path.as_os_str().to_owned();
        part.push(format!(".{}.part", n));
        let part = PathBuf::from(part);

        let stored = match fs::write(&part, bytes).await {
            Ok(()) => fs::rename(&part, path)
                .await
                .map_err(|e| Error::io(path, e)),
            Err(e) => Err(Error::io(&part, e)),
        };
        if let Err(e) = &stored {
            warn!("discarding {}: {}", part.display(), e);
            fs::remove_file(&part).await.ok();
        }
        stored?;

        debug!("cached: {}", path.display());
        Ok(())
    }
}

/// File name of the cache entry for `url`.
///
/// Separators are substituted, not hashed, so URLs that differ only in `:`
/// versus `/` share an entry.
pub fn cache_key(url: &str) -> String {
    url.replace([':', '/'], "^")
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn cache(dir: &Path) -> FetchCache {
        FetchCache::open(dir.join("cache"), Duration::from_secs(5))
            .await
            .unwrap()
    }

    #[test]
    fn key_substitutes_separators() {
        assert_eq!(
            cache_key("https://magic.wizards.com/en/articles/archive"),
            "https^^^magic.wizards.com^en^articles^archive"
        );
    }

    #[test]
    fn key_collides_on_substituted_characters() {
        assert_eq!(cache_key("http://a/b:c"), cache_key("http://a/b/c"));
    }

    #[tokio::test]
    async fn open_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        cache(dir.path()).await;
        let cache = cache(dir.path()).await;
        assert!(cache.dir().is_dir());
    }

    #[tokio::test]
    async fn second_text_lookup_is_served_from_disk() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/story"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>hello</p>"))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path()).await;
        let url = format!("{}/story", server.uri());

        assert_eq!(cache.text(&url).await.unwrap(), "<p>hello</p>");
        assert_eq!(cache.text(&url).await.unwrap(), "<p>hello</p>");
        assert_eq!(cache.network_fetches(), 1);

        let on_disk = std::fs::read_to_string(cache.entry_path(&url)).unwrap();
        assert_eq!(on_disk, "<p>hello</p>");
    }

    #[tokio::test]
    async fn binary_lookup_returns_cache_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img/a.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xff, 0xd8, 0xff]))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path()).await;
        let url = format!("{}/img/a.jpg", server.uri());

        let first = cache.path(&url).await.unwrap();
        let second = cache.path(&url).await.unwrap();
        assert_eq!(first, second);
        assert!(first.starts_with(cache.dir()));
        assert_eq!(std::fs::read(&first).unwrap(), vec![0xff, 0xd8, 0xff]);
    }

    #[tokio::test]
    async fn error_status_is_fetch_failure_and_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path()).await;
        let url = format!("{}/missing", server.uri());

        let err = cache.text(&url).await.unwrap_err();
        assert!(matches!(err, Error::Fetch { ref url, .. } if url.ends_with("/missing")));
        assert!(!cache.entry_path(&url).exists());
    }

    #[tokio::test]
    async fn failed_store_leaves_no_part_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = cache(dir.path()).await;

        // A non-empty directory in the entry's place makes the rename fail.
        let target = cache.entry_path("https://example.com/blocked");
        std::fs::create_dir_all(target.join("inner")).unwrap();

        let err = cache.store(&target, b"bytes").await.unwrap_err();
        assert!(matches!(err, Error::Io { ref path, .. } if path == &target));

        let leftovers: Vec<_> = std::fs::read_dir(cache.dir())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty(), "{leftovers:?}");
    }
}
