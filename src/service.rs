use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::task::{Context, Poll};

use tower::Service;
use tracing::info;

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::export;
use crate::maps::{Business, MapsResult, MapsScraper, ProgressCallback};
use crate::traits::Scraper;

/// スクレイピングリクエスト
#[derive(Clone)]
pub struct ScrapeRequest {
    pub query: String,
    pub target: usize,
    pub headless: bool,
    pub export_path: PathBuf,
    pub progress: Option<ProgressCallback>,
}

impl ScrapeRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            target: 10,
            headless: true,
            export_path: PathBuf::from("./exports"),
            progress: None,
        }
    }

    pub fn with_target(mut self, target: usize) -> Self {
        self.target = target;
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = path.into();
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl std::fmt::Debug for ScrapeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScrapeRequest")
            .field("query", &self.query)
            .field("target", &self.target)
            .field("headless", &self.headless)
            .field("export_path", &self.export_path)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl From<ScrapeRequest> for ScraperConfig {
    fn from(req: ScrapeRequest) -> Self {
        ScraperConfig::default()
            .with_headless(req.headless)
            .with_export_path(req.export_path)
    }
}

/// スクレイピング結果
#[derive(Debug)]
pub struct ScrapeResult {
    pub businesses: Vec<Business>,
    pub skipped: usize,
    pub run_id: String,
    pub csv_path: PathBuf,
    pub csv_content: Vec<u8>,
}

impl ScrapeResult {
    pub fn new(result: MapsResult, csv_path: PathBuf) -> std::io::Result<Self> {
        let csv_content = std::fs::read(&csv_path)?;
        Ok(Self {
            businesses: result.businesses.into_items(),
            skipped: result.skipped,
            run_id: result.run_id,
            csv_path,
            csv_content,
        })
    }
}

/// tower::Serviceを実装したスクレイパーサービス
#[derive(Debug, Clone, Default)]
pub struct ScraperService {
    // 将来的な拡張用（レートリミット、キャッシュなど）
}

impl ScraperService {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Service<ScrapeRequest> for ScraperService {
    type Response = ScrapeResult;
    type Error = ScraperError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: ScrapeRequest) -> Self::Future {
        info!(
            "スクレイピングリクエスト受信: query={}, target={}",
            req.query, req.target
        );

        Box::pin(async move {
            let query = req.query.clone();
            let target = req.target;
            let progress = req.progress.clone();
            let export_path = req.export_path.clone();
            let config: ScraperConfig = req.into();

            // スクレイピング実行
            let mut scraper = MapsScraper::new(config);
            let maps_result = scraper.execute(&query, target, progress).await?;

            // CSVエクスポート
            let csv_path = export::save_csv(&maps_result.businesses, &export_path)?;
            let result = ScrapeResult::new(maps_result, csv_path)?;

            info!(
                "スクレイピング完了: records={}, skipped={}, path={:?}",
                result.businesses.len(),
                result.skipped,
                result.csv_path
            );

            Ok(result)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_request_builder() {
        let req = ScrapeRequest::new("ramen in Shibuya")
            .with_target(25)
            .with_headless(false)
            .with_export_path("/tmp/exports");

        assert_eq!(req.query, "ramen in Shibuya");
        assert_eq!(req.target, 25);
        assert!(!req.headless);
        assert_eq!(req.export_path, PathBuf::from("/tmp/exports"));
        assert!(req.progress.is_none());
    }

    #[test]
    fn test_scrape_request_to_config() {
        let req = ScrapeRequest::new("ramen in Shibuya")
            .with_headless(false)
            .with_export_path("/tmp/exports");
        let config: ScraperConfig = req.into();

        assert!(!config.headless);
        assert_eq!(config.export_path, PathBuf::from("/tmp/exports"));
    }
}
