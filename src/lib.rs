//! 地図検索ビジネス情報スクレイパー
//!
//! - 地図検索の結果一覧からビジネス情報（名称・住所・ウェブサイト・
//!   電話番号）を収集
//! - 収集結果をCSVにエクスポートし、Webシェルからダウンロード提供
//!
//! # サービス使用例
//!
//! ```rust,ignore
//! use maps_scraper::{ScraperService, ScrapeRequest};
//! use tower::Service;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut service = ScraperService::new();
//!
//!     let request = ScrapeRequest::new("Jewellery shop in Kanpur")
//!         .with_target(10)
//!         .with_headless(true);
//!
//!     let result = service.call(request).await.unwrap();
//!     println!("Records: {}", result.businesses.len());
//! }
//! ```
//!
//! # スクレイパー単体の使用例
//!
//! ```rust,ignore
//! use maps_scraper::{MapsScraper, Scraper, ScraperConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ScraperConfig::default().with_headless(true);
//!     let mut scraper = MapsScraper::new(config);
//!     let result = scraper.execute("ramen in Shibuya", 10, None).await.unwrap();
//!     println!("Records: {}", result.businesses.len());
//! }
//! ```

pub mod config;
pub mod error;
pub mod export;
pub mod maps;
pub mod service;
pub mod traits;
pub mod web;

// 主要な型をリエクスポート
pub use config::ScraperConfig;
pub use error::ScraperError;
pub use maps::{Business, BusinessList, MapsResult, MapsScraper, ProgressCallback};
pub use service::{ScrapeRequest, ScrapeResult, ScraperService};
pub use traits::Scraper;
