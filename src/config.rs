use std::path::PathBuf;
use std::time::Duration;

/// 地図検索スクレイパーの実行設定
///
/// 各待機時間は「固定待機してから確認する」方式のまま調整できるように
/// している（適応的ポーリングには置き換えない）。
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// 検索ページURL
    pub search_url: String,
    /// CSVエクスポート先ディレクトリ
    pub export_path: PathBuf,
    /// ヘッドレスモード
    pub headless: bool,
    /// デバッグモード（スクリーンショットログ出力）
    pub debug: bool,
    /// CDPリクエストタイムアウト
    pub request_timeout: Duration,
    /// 検索ページ表示後の待機
    pub navigation_wait: Duration,
    /// クエリ送信後、結果一覧が描画されるまでの待機
    pub results_wait: Duration,
    /// エントリクリック後、詳細パネルが描画されるまでの待機
    pub detail_wait: Duration,
    /// スクロール1回ごとの待機
    pub scroll_wait: Duration,
    /// 1サイクルあたりのスクロール回数
    pub scroll_steps: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            search_url: "https://www.google.com/maps".to_string(),
            export_path: PathBuf::from("./exports"),
            headless: true,
            debug: false,
            request_timeout: Duration::from_secs(60),
            navigation_wait: Duration::from_secs(2),
            results_wait: Duration::from_secs(4),
            detail_wait: Duration::from_secs(4),
            scroll_wait: Duration::from_secs(2),
            scroll_steps: 2,
        }
    }
}

impl ScraperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    pub fn with_export_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.export_path = path.into();
        self
    }

    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_navigation_wait(mut self, wait: Duration) -> Self {
        self.navigation_wait = wait;
        self
    }

    pub fn with_results_wait(mut self, wait: Duration) -> Self {
        self.results_wait = wait;
        self
    }

    pub fn with_detail_wait(mut self, wait: Duration) -> Self {
        self.detail_wait = wait;
        self
    }

    pub fn with_scroll_wait(mut self, wait: Duration) -> Self {
        self.scroll_wait = wait;
        self
    }

    pub fn with_scroll_steps(mut self, steps: u32) -> Self {
        self.scroll_steps = steps;
        self
    }
}
