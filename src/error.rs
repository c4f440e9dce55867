use std::path::PathBuf;

/// Everything that can abort a run.
///
/// There are no retries: the first failure of any chapter stops the whole
/// book, and the cache makes the rerun cheap.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network or HTTP status failure while retrieving a resource.
    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A structural element the chapter layout relies on is absent.
    #[error("chapter {url}: could not find {what}")]
    Extraction { url: String, what: String },

    /// Missing or malformed configuration.
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A chapter task panicked or was cancelled.
    #[error("chapter task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn fetch(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }

    pub fn extraction(url: impl Into<String>, what: impl Into<String>) -> Self {
        Self::Extraction {
            url: url.into(),
            what: what.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
