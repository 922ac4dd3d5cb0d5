//! 地図検索スクレイパー実装
//!
//! 検索結果一覧を巡回し、詳細パネルから名称・住所・ウェブサイト・
//! 電話番号を抽出する

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use chrono::Utc;
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::config::ScraperConfig;
use crate::error::ScraperError;
use crate::traits::Scraper;

use super::types::{Business, BusinessList, MapsResult, ProgressCallback};

/// 検索ボックス
const SEARCH_BOX_SELECTOR: &str = "#searchboxinput";
/// 結果一覧のエントリリンク
const ENTRY_LINK_SELECTOR: &str = r#"a[href*="/maps/place"]"#;
/// 結果一覧のスクロールパネル
const RESULTS_FEED_SELECTOR: &str = r#"div[role="feed"]"#;

/// 詳細パネルの各フィールド
const NAME_SELECTOR: &str = "h1.DUwDvf";
const ADDRESS_SELECTOR: &str = r#"button[data-item-id="address"] div.fontBodyMedium"#;
const WEBSITE_SELECTOR: &str = r#"a[data-item-id="authority"] div.fontBodyMedium"#;
const PHONE_SELECTOR: &str = r#"button[data-item-id^="phone:tel:"] div.fontBodyMedium"#;

/// スクロール1回の移動量 (px)
const SCROLL_DELTA: u32 = 3000;

/// エントリ巡回の状態管理
///
/// URLの重複排除（1実行につき1回だけ試行）と、スクロール後に件数が
/// 増えなかった場合の打ち切り判定を持つ。
struct EntryTracker {
    visited: HashSet<String>,
    previous_count: usize,
}

impl EntryTracker {
    fn new() -> Self {
        Self {
            visited: HashSet::new(),
            previous_count: 0,
        }
    }

    /// 前回の列挙から件数が増えていなければ true
    ///
    /// 件数のみを比較する。件数が同じまま内容だけ入れ替わった場合は
    /// 検出できない（既知の制限）。
    fn is_stagnant(&mut self, current_count: usize) -> bool {
        if current_count == self.previous_count {
            return true;
        }
        self.previous_count = current_count;
        false
    }

    /// 未訪問のURLなら訪問済みに登録して true を返す
    fn try_visit(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

/// 地図検索スクレイパー
pub struct MapsScraper {
    config: ScraperConfig,
    browser: Option<Browser>,
    page: Option<Arc<Page>>,
}

impl MapsScraper {
    pub fn new(config: ScraperConfig) -> Self {
        Self {
            config,
            browser: None,
            page: None,
        }
    }

    fn get_page(&self) -> Result<&Arc<Page>, ScraperError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScraperError::BrowserInit("ブラウザが初期化されていません".into()))
    }

    /// 表示中のエントリリンクURLを列挙する
    async fn enumerate_entries(&self, page: &Page) -> Result<Vec<String>, ScraperError> {
        let script = format!(
            r#"JSON.stringify(Array.from(document.querySelectorAll('{sel}')).map((a) => a.href))"#,
            sel = ENTRY_LINK_SELECTOR
        );

        let result = page
            .evaluate(script.as_str())
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?;

        let json_str = result.into_value::<String>().unwrap_or_default();
        serde_json::from_str(&json_str).map_err(|e| ScraperError::Json(e.to_string()))
    }

    /// URLが一致するエントリリンクをクリックする
    async fn click_entry(&self, page: &Page, url: &str) -> Result<(), ScraperError> {
        let url_json =
            serde_json::to_string(url).map_err(|e| ScraperError::Json(e.to_string()))?;
        let script = format!(
            r#"
            (() => {{
                const target = {url};
                const links = document.querySelectorAll('{sel}');
                for (const link of links) {{
                    if (link.href === target) {{
                        link.click();
                        return true;
                    }}
                }}
                return false;
            }})()
            "#,
            url = url_json,
            sel = ENTRY_LINK_SELECTOR
        );

        let clicked = page
            .evaluate(script.as_str())
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?
            .into_value::<bool>()
            .unwrap_or(false);

        if !clicked {
            return Err(ScraperError::ElementNotFound(format!(
                "エントリリンク: {}",
                url
            )));
        }
        Ok(())
    }

    /// 詳細パネルの1フィールドを読み取る
    ///
    /// 要素が存在しない場合は None（正常系）。evaluate 自体の失敗のみ
    /// エラーとして返す。
    async fn read_field(&self, page: &Page, selector: &str) -> Result<Option<String>, ScraperError> {
        let script = format!(
            r#"
            (() => {{
                const el = document.querySelector('{sel}');
                return el ? el.innerText.trim() : null;
            }})()
            "#,
            sel = selector
        );

        let result = page
            .evaluate(script.as_str())
            .await
            .map_err(|e| ScraperError::JavaScript(e.to_string()))?;

        Ok(result.into_value::<Option<String>>().unwrap_or(None))
    }

    /// 1エントリを開いてレコードを組み立てる
    async fn scrape_entry(&self, page: &Page, url: &str) -> Result<Business, ScraperError> {
        self.click_entry(page, url).await?;
        sleep(self.config.detail_wait).await;

        Ok(Business {
            name: self.read_field(page, NAME_SELECTOR).await?,
            address: self.read_field(page, ADDRESS_SELECTOR).await?,
            website: self.read_field(page, WEBSITE_SELECTOR).await?,
            phone_number: self.read_field(page, PHONE_SELECTOR).await?,
        })
    }

    /// 結果一覧パネルをスクロールして追加エントリを読み込ませる
    async fn scroll_results(&self, page: &Page) -> Result<(), ScraperError> {
        let script = format!(
            r#"
            (() => {{
                const feed = document.querySelector('{sel}');
                if (feed) {{
                    feed.scrollBy(0, {delta});
                    return true;
                }}
                window.scrollBy(0, {delta});
                return false;
            }})()
            "#,
            sel = RESULTS_FEED_SELECTOR,
            delta = SCROLL_DELTA
        );

        for _ in 0..self.config.scroll_steps {
            let on_feed = page
                .evaluate(script.as_str())
                .await
                .map_err(|e| ScraperError::JavaScript(e.to_string()))?
                .into_value::<bool>()
                .unwrap_or(false);
            if !on_feed {
                debug!("Results feed not found, scrolled window instead");
            }
            sleep(self.config.scroll_wait).await;
        }
        Ok(())
    }

    /// デバッグ用フルページスクリーンショットをログ出力する
    async fn debug_screenshot(&self, page: &Page, label: &str) {
        if let Ok(screenshot) = page
            .screenshot(ScreenshotParams::builder().full_page(true).build())
            .await
        {
            use base64::Engine;
            let encoded = base64::engine::general_purpose::STANDARD.encode(&screenshot);
            debug!("{} screenshot: data:image/png;base64,{}", label, encoded);
        }
    }
}

#[async_trait]
impl Scraper for MapsScraper {
    async fn initialize(&mut self) -> Result<(), ScraperError> {
        info!("Initializing browser...");

        // ユニークなユーザーデータディレクトリを生成
        let unique_id = format!(
            "{}-{}",
            std::process::id(),
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        );
        let user_data_dir = std::env::temp_dir().join(format!("maps-scraper-{}", unique_id));

        // Chrome パスを取得
        let chrome_path = std::env::var("CHROME_PATH")
            .or_else(|_| std::env::var("CHROMIUM_PATH"))
            .unwrap_or_else(|_| "chromium".to_string());

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .user_data_dir(&user_data_dir)
            .window_size(1280, 800);

        if !self.config.headless {
            builder = builder.with_head();
        }

        builder = builder
            .no_sandbox()
            .request_timeout(self.config.request_timeout)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        if self.config.debug {
            builder = builder.arg("--enable-logging=stderr").arg("--v=1");
        }

        let browser_config = builder
            .build()
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        // ブラウザイベントハンドラをバックグラウンドで実行
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                debug!("Browser event: {:?}", event);
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScraperError::BrowserInit(e.to_string()))?;

        self.browser = Some(browser);
        self.page = Some(Arc::new(page));

        info!("Browser initialized successfully");
        Ok(())
    }

    async fn search(&mut self, query: &str) -> Result<(), ScraperError> {
        let page = self.get_page()?.clone();
        info!("Navigating to {}", self.config.search_url);

        page.goto(self.config.search_url.as_str())
            .await
            .map_err(|e| ScraperError::Navigation(e.to_string()))?;
        sleep(self.config.navigation_wait).await;

        // 検索ボックスにクエリを入力してEnter送信
        let searchbox = page
            .find_element(SEARCH_BOX_SELECTOR)
            .await
            .map_err(|e| ScraperError::ElementNotFound(format!("検索ボックス: {}", e)))?;
        searchbox
            .type_str(query)
            .await
            .map_err(|e| ScraperError::Search(format!("クエリ入力: {}", e)))?;
        searchbox
            .press_key("Enter")
            .await
            .map_err(|e| ScraperError::Search(format!("クエリ送信: {}", e)))?;

        sleep(self.config.results_wait).await;

        if self.config.debug {
            self.debug_screenshot(&page, "post-search").await;
        }

        info!("Search submitted: {}", query);
        Ok(())
    }

    async fn collect(
        &mut self,
        target: usize,
        progress: Option<ProgressCallback>,
    ) -> Result<MapsResult, ScraperError> {
        let page = self.get_page()?.clone();
        info!("Collecting up to {} entries...", target);

        let run_id = format!("run_{}", Utc::now().timestamp());
        let mut businesses = BusinessList::new(target);
        let mut tracker = EntryTracker::new();
        let mut skipped = 0usize;

        while !businesses.is_full() {
            let entries = self.enumerate_entries(&page).await?;
            debug!("{} entry links rendered", entries.len());

            if tracker.is_stagnant(entries.len()) {
                info!(
                    "No new entries after scroll, stopping at {} records",
                    businesses.len()
                );
                break;
            }

            for url in entries {
                if businesses.is_full() {
                    break;
                }
                if !tracker.try_visit(&url) {
                    continue;
                }

                // 1エントリの失敗は実行全体を止めない（リトライもしない）
                match self.scrape_entry(&page, &url).await {
                    Ok(business) => {
                        businesses.push(business);
                        if let Some(cb) = progress.as_ref() {
                            cb(businesses.progress());
                        }
                    }
                    Err(e) => {
                        skipped += 1;
                        debug!("Entry skipped ({}): {}", url, e);
                    }
                }
            }

            if businesses.is_full() {
                break;
            }

            self.scroll_results(&page).await?;
        }

        let visited = tracker.visited_count();
        info!(
            "Collection finished: {} records, {} visited, {} skipped",
            businesses.len(),
            visited,
            skipped
        );

        Ok(MapsResult {
            businesses,
            visited,
            skipped,
            run_id,
        })
    }

    async fn close(&mut self) -> Result<(), ScraperError> {
        info!("Closing browser...");

        // ページとブラウザの参照を解放
        self.page = None;
        self.browser = None;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_maps_scraper_new() {
        let config = ScraperConfig::default();
        let scraper = MapsScraper::new(config);
        assert!(scraper.browser.is_none());
        assert!(scraper.page.is_none());
    }

    #[test]
    fn test_config_builder() {
        let config = ScraperConfig::new()
            .with_search_url("http://localhost:8080/maps")
            .with_headless(false)
            .with_export_path("/tmp/exports")
            .with_detail_wait(Duration::from_millis(100))
            .with_scroll_steps(3);

        assert_eq!(config.search_url, "http://localhost:8080/maps");
        assert!(!config.headless);
        assert_eq!(config.export_path, std::path::PathBuf::from("/tmp/exports"));
        assert_eq!(config.detail_wait, Duration::from_millis(100));
        assert_eq!(config.scroll_steps, 3);
    }

    #[test]
    fn test_entry_tracker_dedup() {
        let mut tracker = EntryTracker::new();
        assert!(tracker.try_visit("https://example.com/maps/place/a"));
        assert!(tracker.try_visit("https://example.com/maps/place/b"));
        assert!(!tracker.try_visit("https://example.com/maps/place/a"));
        assert_eq!(tracker.visited_count(), 2);
    }

    #[test]
    fn test_entry_tracker_stagnation() {
        let mut tracker = EntryTracker::new();
        // 初回の列挙が空なら即打ち切り
        assert!(tracker.is_stagnant(0));

        let mut tracker = EntryTracker::new();
        assert!(!tracker.is_stagnant(5));
        assert!(!tracker.is_stagnant(8));
        // スクロール後も件数が変わらなければ打ち切り
        assert!(tracker.is_stagnant(8));
    }

    #[tokio::test]
    #[ignore] // 実環境テスト用: cargo test test_maps_scraper_live -- --ignored --nocapture
    async fn test_maps_scraper_live() {
        // トレーシング初期化
        tracing_subscriber::fmt()
            .with_env_filter("info,maps_scraper=debug")
            .init();

        let query = std::env::var("MAPS_QUERY").expect("MAPS_QUERY not set");

        let config = ScraperConfig::default().with_debug(true);
        let mut scraper = MapsScraper::new(config);

        let result = scraper.execute(&query, 3, None).await;

        match result {
            Ok(data) => {
                println!("\n=== Scrape Result ===");
                println!("Records: {}", data.businesses.len());
                println!("Visited: {}, skipped: {}", data.visited, data.skipped);
                for b in data.businesses.items() {
                    println!(
                        "  - {:?} / {:?} / {:?} / {:?}",
                        b.name, b.address, b.website, b.phone_number
                    );
                }
            }
            Err(e) => {
                panic!("Scrape failed: {:?}", e);
            }
        }
    }
}
