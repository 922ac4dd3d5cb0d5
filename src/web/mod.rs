//! Webシェル
//!
//! 検索フォーム・進捗表示・CSVダウンロードを提供する。実行状態は
//! グローバルではなく `AppState` として各ハンドラへ渡す。

mod handlers;

use std::sync::atomic::AtomicU8;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::sync::RwLock;

/// 取得件数の下限
pub const MIN_TARGET: usize = 5;
/// 取得件数の上限
pub const MAX_TARGET: usize = 100;
/// 取得件数のデフォルト
pub const DEFAULT_TARGET: usize = 10;

/// 実行状態（同時に1実行のみ）
#[derive(Debug)]
pub enum RunState {
    Idle,
    Running {
        query: String,
    },
    /// エクスポートファイルは削除済みで、CSVバイト列のみ保持する
    Done {
        count: usize,
        skipped: usize,
        filename: String,
        csv: Vec<u8>,
    },
    Failed {
        message: String,
    },
}

/// 共有アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub run: Arc<RwLock<RunState>>,
    /// 進捗 (0〜100)。同期コールバックから更新するためロックと分離
    pub percent: Arc<AtomicU8>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            run: Arc::new(RwLock::new(RunState::Idle)),
            percent: Arc::new(AtomicU8::new(0)),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// 目標件数を設定範囲に丸める
fn clamp_target(requested: usize) -> usize {
    requested.clamp(MIN_TARGET, MAX_TARGET)
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/scrape", post(handlers::start_scrape))
        .route("/api/progress", get(handlers::progress))
        .route("/download", get(handlers::download))
        .with_state(AppState::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_target() {
        assert_eq!(clamp_target(1), MIN_TARGET);
        assert_eq!(clamp_target(MIN_TARGET), MIN_TARGET);
        assert_eq!(clamp_target(42), 42);
        assert_eq!(clamp_target(MAX_TARGET), MAX_TARGET);
        assert_eq!(clamp_target(500), MAX_TARGET);
    }
}
