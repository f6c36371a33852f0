use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use url::Url;

use crate::store::PostNum;

/// Source of raw JSON documents.
pub trait Fetcher {
    fn get_json(&self, url: &Url) -> Result<Vec<u8>>;
}

/// URLs of the three makaba JSON endpoints, relative to the board origin.
#[derive(Clone, Debug)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn catalog(&self) -> Result<Url> {
        self.join("makaba/mobile.fcgi?task=get_boards")
    }

    pub fn board_index(&self, board: &str) -> Result<Url> {
        self.join(&format!("{board}/index.json"))
    }

    pub fn thread(&self, board: &str, num: PostNum) -> Result<Url> {
        self.join(&format!("{board}/res/{num}.json"))
    }

    fn join(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .with_context(|| format!("build url {path} against {}", self.base))
    }
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("chanview/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn get_json(&self, url: &Url) -> Result<Vec<u8>> {
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("request {url}"))?;
        let status = response.status();
        if !status.is_success() {
            bail!("{url} returned status {status}");
        }
        let body = response
            .bytes()
            .with_context(|| format!("read body of {url}"))?;
        tracing::debug!(%url, bytes = body.len(), "fetched");
        Ok(body.to_vec())
    }
}

/// Serves saved JSON dumps from a directory, picking the file by the shape of the URL.
pub struct FileFetcher {
    dir: PathBuf,
}

impl FileFetcher {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn file_for(url: &Url) -> Option<&'static str> {
        if url.query().is_some_and(|q| q.contains("get_boards")) {
            Some("boards.json")
        } else if url.path().ends_with("/index.json") {
            Some("board_index.json")
        } else if url.path().contains("/res/") {
            Some("full_thread.json")
        } else {
            None
        }
    }
}

impl Fetcher for FileFetcher {
    fn get_json(&self, url: &Url) -> Result<Vec<u8>> {
        let Some(name) = Self::file_for(url) else {
            bail!("no offline file for {url}");
        };
        let path = self.dir.join(name);
        tracing::debug!(%url, path = %path.display(), "offline read");
        std::fs::read(&path).with_context(|| format!("read {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints::new(Url::parse("https://2ch.hk").unwrap())
    }

    #[test]
    fn builds_makaba_urls() {
        let e = endpoints();
        assert_eq!(
            e.catalog().unwrap().as_str(),
            "https://2ch.hk/makaba/mobile.fcgi?task=get_boards"
        );
        assert_eq!(
            e.board_index("sci").unwrap().as_str(),
            "https://2ch.hk/sci/index.json"
        );
        assert_eq!(
            e.thread("b", PostNum(123)).unwrap().as_str(),
            "https://2ch.hk/b/res/123.json"
        );
    }

    #[test]
    fn offline_files_follow_url_shape() {
        let e = endpoints();
        assert_eq!(FileFetcher::file_for(&e.catalog().unwrap()), Some("boards.json"));
        assert_eq!(
            FileFetcher::file_for(&e.board_index("b").unwrap()),
            Some("board_index.json")
        );
        assert_eq!(
            FileFetcher::file_for(&e.thread("b", PostNum(1)).unwrap()),
            Some("full_thread.json")
        );
        assert_eq!(
            FileFetcher::file_for(&Url::parse("https://2ch.hk/other").unwrap()),
            None
        );
    }

    #[test]
    fn file_fetcher_reads_from_its_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("boards.json"), b"{}").unwrap();
        let fetcher = FileFetcher::new(dir.path());
        assert_eq!(fetcher.get_json(&endpoints().catalog().unwrap()).unwrap(), b"{}");

        let err = fetcher
            .get_json(&endpoints().board_index("b").unwrap())
            .unwrap_err();
        assert!(err.to_string().contains("board_index.json"));
    }
}
