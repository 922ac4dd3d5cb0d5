//! Webシェルのハンドラ群

use std::sync::atomic::Ordering;
use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Form, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tower::Service;
use tracing::{error, warn};

use crate::maps::ProgressCallback;
use crate::service::{ScrapeRequest, ScraperService};

use super::{clamp_target, AppState, RunState, DEFAULT_TARGET, MAX_TARGET, MIN_TARGET};

/// 検索フォームページ
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub min_target: usize,
    pub max_target: usize,
    pub default_target: usize,
}

/// `GET /`
pub async fn index() -> impl IntoResponse {
    IndexTemplate {
        min_target: MIN_TARGET,
        max_target: MAX_TARGET,
        default_target: DEFAULT_TARGET,
    }
}

/// スクレイプ開始フォーム
#[derive(Debug, Deserialize)]
pub struct ScrapeForm {
    pub query: String,
    pub target: Option<usize>,
}

/// 進捗スナップショット
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub phase: &'static str,
    pub percent: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl ProgressResponse {
    fn status(phase: &'static str, percent: u8, message: impl Into<String>) -> Self {
        Self {
            phase,
            percent,
            message: message.into(),
            count: None,
            filename: None,
        }
    }
}

/// `POST /scrape`
///
/// 同時実行は1つのみ。スクレイピングはバックグラウンドタスクで実行し、
/// 進捗コールバックが共有状態へ書き込む。
pub async fn start_scrape(
    State(state): State<AppState>,
    Form(form): Form<ScrapeForm>,
) -> Json<ProgressResponse> {
    let query = form.query.trim().to_string();
    if query.is_empty() {
        return Json(ProgressResponse::status(
            "warning",
            0,
            "検索クエリを入力してください",
        ));
    }
    let target = clamp_target(form.target.unwrap_or(DEFAULT_TARGET));

    {
        let mut run = state.run.write().await;
        if matches!(*run, RunState::Running { .. }) {
            return Json(ProgressResponse::status(
                "running",
                state.percent.load(Ordering::Relaxed),
                "別の実行が進行中です",
            ));
        }
        *run = RunState::Running {
            query: query.clone(),
        };
        state.percent.store(0, Ordering::Relaxed);
    }

    let task_state = state.clone();
    tokio::spawn(async move {
        run_scrape(task_state, query, target).await;
    });

    Json(ProgressResponse::status(
        "running",
        0,
        "スクレイピングを開始しました",
    ))
}

/// 1実行分のスクレイピングを行い、結果を共有状態へ反映する
///
/// ここで発生したエラーは一括で捕捉し、UIには汎用メッセージのみを
/// 返す（部分結果は提供しない）。
async fn run_scrape(state: AppState, query: String, target: usize) {
    let percent = state.percent.clone();
    let callback: ProgressCallback = Arc::new(move |p: f64| {
        let value = (p.clamp(0.0, 1.0) * 100.0).round() as u8;
        percent.store(value, Ordering::Relaxed);
    });

    let request = ScrapeRequest::new(query)
        .with_target(target)
        .with_progress(callback);
    let mut service = ScraperService::new();

    match service.call(request).await {
        Ok(result) => {
            // CSVバイト列を確保した時点でエクスポートファイルは削除する
            if let Err(e) = std::fs::remove_file(&result.csv_path) {
                warn!("Failed to remove export file {:?}: {}", result.csv_path, e);
            }
            let filename = result
                .csv_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "scraped_data.csv".to_string());

            state.percent.store(100, Ordering::Relaxed);
            let mut run = state.run.write().await;
            *run = RunState::Done {
                count: result.businesses.len(),
                skipped: result.skipped,
                filename,
                csv: result.csv_content,
            };
        }
        Err(e) => {
            error!("Scrape run failed: {}", e);
            let mut run = state.run.write().await;
            *run = RunState::Failed {
                message: "処理中にエラーが発生しました".to_string(),
            };
        }
    }
}

/// `GET /api/progress`
pub async fn progress(State(state): State<AppState>) -> Json<ProgressResponse> {
    let run = state.run.read().await;
    let percent = state.percent.load(Ordering::Relaxed);

    let response = match &*run {
        RunState::Idle => ProgressResponse::status("idle", 0, "待機中"),
        RunState::Running { query } => ProgressResponse::status(
            "running",
            percent,
            format!("スクレイピング中... {}% ({})", percent, query),
        ),
        RunState::Done {
            count,
            skipped,
            filename,
            ..
        } => {
            let message = if *skipped > 0 {
                format!("完了: {}件取得（{}件スキップ）", count, skipped)
            } else {
                format!("完了: {}件取得", count)
            };
            ProgressResponse {
                phase: "done",
                percent: 100,
                message,
                count: Some(*count),
                filename: Some(filename.clone()),
            }
        }
        RunState::Failed { message } => {
            ProgressResponse::status("failed", percent, message.clone())
        }
    };

    Json(response)
}

/// `GET /download`
///
/// 完了済み実行のCSVをattachmentとして返す。ファイル自体は既に削除
/// 済みなので、保持しているバイト列から配信する。
pub async fn download(State(state): State<AppState>) -> Response {
    let run = state.run.read().await;

    match &*run {
        RunState::Done { filename, csv, .. } => {
            let headers = [
                (
                    header::CONTENT_TYPE,
                    "text/csv; charset=utf-8".to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ];
            (headers, csv.clone()).into_response()
        }
        _ => (
            StatusCode::NOT_FOUND,
            "ダウンロード可能な結果がありません",
        )
            .into_response(),
    }
}
