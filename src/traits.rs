use async_trait::async_trait;

use crate::error::ScraperError;
use crate::maps::{MapsResult, ProgressCallback};

#[async_trait]
pub trait Scraper: Send + Sync {
    /// ブラウザ初期化
    async fn initialize(&mut self) -> Result<(), ScraperError>;

    /// 検索クエリを送信して結果一覧を表示する
    async fn search(&mut self, query: &str) -> Result<(), ScraperError>;

    /// 表示中のエントリを巡回してレコードを収集する
    async fn collect(
        &mut self,
        target: usize,
        progress: Option<ProgressCallback>,
    ) -> Result<MapsResult, ScraperError>;

    /// リソース解放
    async fn close(&mut self) -> Result<(), ScraperError>;

    /// 一括実行（initialize → search → collect → close）
    ///
    /// 途中で失敗した場合も close は試行し、元のエラーを返す。
    async fn execute(
        &mut self,
        query: &str,
        target: usize,
        progress: Option<ProgressCallback>,
    ) -> Result<MapsResult, ScraperError> {
        self.initialize().await?;

        let result = match self.search(query).await {
            Ok(()) => self.collect(target, progress).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(r) => {
                self.close().await?;
                Ok(r)
            }
            Err(e) => {
                let _ = self.close().await;
                Err(e)
            }
        }
    }
}
