pub mod http_client;

use crate::config::FetchConfig;
use crate::error::ExtractError;
use crate::models::IpoListing;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use self::http_client::HttpClient;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Somewhere a prospectus can be fetched from.
#[async_trait]
pub trait FilingSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self, listing: &IpoListing) -> Result<Vec<u8>>;
}

// ── SEC archive ───────────────────────────────────────────────────────────────

/// Downloads the listing's `url` from EDGAR.
pub struct SecArchiveSource {
    client: HttpClient,
}

impl SecArchiveSource {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(config)?,
        })
    }
}

#[async_trait]
impl FilingSource for SecArchiveSource {
    fn name(&self) -> &str {
        "sec-archive"
    }

    async fn fetch(&self, listing: &IpoListing) -> Result<Vec<u8>> {
        self.client
            .get_bytes(&listing.url)
            .await
            .with_context(|| format!("Failed to download filing for {}", listing.symbol))
    }
}

// ── Local mirror ──────────────────────────────────────────────────────────────

/// Copies from local roots laid out as `<root>/<SYMBOL>/<file>`.
pub struct LocalMirrorSource {
    roots: Vec<PathBuf>,
}

impl LocalMirrorSource {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    fn locate(&self, listing: &IpoListing) -> Option<PathBuf> {
        let file = listing.file_name();
        self.roots
            .iter()
            .map(|root| root.join(&listing.symbol).join(&file))
            .find(|p| p.is_file())
    }
}

#[async_trait]
impl FilingSource for LocalMirrorSource {
    fn name(&self) -> &str {
        "local-mirror"
    }

    async fn fetch(&self, listing: &IpoListing) -> Result<Vec<u8>> {
        let path = self
            .locate(listing)
            .ok_or_else(|| ExtractError::MissingFiling(format!("{}/{}", listing.symbol, listing.file_name())))?;
        debug!("{}: mirror hit {:?}", listing.symbol, path);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {:?}", path))
    }
}

// ── Fetch loop ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, PartialEq)]
pub struct FetchStats {
    pub fetched: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Where a listing's filing lives on disk.
pub fn filing_path(filings_dir: &Path, listing: &IpoListing) -> PathBuf {
    filings_dir.join(&listing.symbol).join(listing.file_name())
}

/// Mirror sources first, then the archive.
pub fn default_sources(config: &FetchConfig) -> Result<Vec<Box<dyn FilingSource>>> {
    let mut sources: Vec<Box<dyn FilingSource>> = Vec::new();
    if !config.mirror_dirs.is_empty() {
        sources.push(Box::new(LocalMirrorSource::new(config.mirror_dirs.clone())));
    }
    sources.push(Box::new(SecArchiveSource::new(config)?));
    Ok(sources)
}

/// Fetch every listing's filing that is not already on disk, trying each
/// source in order. One company failing never stops the loop.
pub async fn fetch_all(
    sources: &[Box<dyn FilingSource>],
    listings: &[IpoListing],
    filings_dir: &Path,
) -> Result<FetchStats> {
    let mut stats = FetchStats::default();

    for listing in listings {
        let target = filing_path(filings_dir, listing);
        if target.exists() {
            debug!("{}: already on disk", listing.symbol);
            stats.skipped += 1;
            continue;
        }

        let mut body = None;
        for source in sources {
            match source.fetch(listing).await {
                Ok(bytes) => {
                    debug!("{}: {} bytes from {}", listing.symbol, bytes.len(), source.name());
                    body = Some(bytes);
                    break;
                }
                Err(e) => debug!("{}: {} failed: {:#}", listing.symbol, source.name(), e),
            }
        }

        let Some(bytes) = body else {
            warn!("{}: no source could provide {}", listing.symbol, listing.file_name());
            stats.failed += 1;
            continue;
        };

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }
        tokio::fs::write(&target, &bytes)
            .await
            .with_context(|| format!("Failed to write {:?}", target))?;
        stats.fetched += 1;
    }

    info!(
        "Fetch complete: {} fetched, {} already present, {} failed",
        stats.fetched, stats.skipped, stats.failed
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn listing(symbol: &str, file: &str) -> IpoListing {
        IpoListing {
            symbol: symbol.into(),
            url: format!("https://www.sec.gov/Archives/edgar/data/1/000/{file}"),
            extra: vec![],
        }
    }

    struct Counting {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FilingSource for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch(&self, listing: &IpoListing) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("<html>{}</html>", listing.symbol).into_bytes())
        }
    }

    #[test]
    fn mirror_finds_first_root_with_file() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(b.path().join("SMLR")).unwrap();
        std::fs::write(b.path().join("SMLR/form424b4.htm"), "<html>b</html>").unwrap();

        let mirror = LocalMirrorSource::new(vec![a.path().to_path_buf(), b.path().to_path_buf()]);
        let bytes = tokio_test::block_on(mirror.fetch(&listing("SMLR", "form424b4.htm"))).unwrap();
        assert_eq!(bytes, b"<html>b</html>");

        let missing = tokio_test::block_on(mirror.fetch(&listing("ZZZ", "x.htm")));
        assert!(missing.is_err());
    }

    #[test]
    fn fetch_skips_existing_and_falls_through_sources() {
        let mirror_root = tempfile::tempdir().unwrap();
        let filings = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(filings.path().join("OLD")).unwrap();
        std::fs::write(filings.path().join("OLD/old.htm"), "kept").unwrap();

        let counting = Box::new(Counting { calls: AtomicUsize::new(0) });
        let sources: Vec<Box<dyn FilingSource>> = vec![
            Box::new(LocalMirrorSource::new(vec![mirror_root.path().to_path_buf()])),
            counting,
        ];
        let listings = vec![listing("OLD", "old.htm"), listing("NEW", "new.htm")];

        let stats = tokio_test::block_on(fetch_all(&sources, &listings, filings.path())).unwrap();
        assert_eq!(stats, FetchStats { fetched: 1, skipped: 1, failed: 0 });
        assert_eq!(
            std::fs::read_to_string(filings.path().join("NEW/new.htm")).unwrap(),
            "<html>NEW</html>"
        );
        assert_eq!(std::fs::read_to_string(filings.path().join("OLD/old.htm")).unwrap(), "kept");
    }
}
