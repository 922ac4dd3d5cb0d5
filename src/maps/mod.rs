//! 地図検索スクレイパーモジュール
//!
//! 検索クエリを送信し、結果一覧からビジネス情報を収集する

mod scraper;
mod types;

pub use scraper::MapsScraper;
pub use types::{Business, BusinessList, MapsResult, ProgressCallback};
