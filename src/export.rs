//! CSVエクスポート
//!
//! 取得したビジネス情報を1レコード1行のCSVに書き出す

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::ScraperError;
use crate::maps::BusinessList;

/// CSVヘッダ（レコードの4属性に対応）
const CSV_HEADERS: [&str; 4] = ["name", "address", "website", "phone_number"];

/// 実行ごとにユニークなエクスポートファイル名を生成する
pub fn export_filename() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let uuid = Uuid::new_v4().simple().to_string();
    format!("scraped_data_{}_{}.csv", timestamp, &uuid[..8])
}

/// コレクションをCSVバイト列に変換する
///
/// 空のコレクションはヘッダ行のみ。欠損フィールドは空セルになる。
pub fn to_csv(list: &BusinessList) -> Result<Vec<u8>, ScraperError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADERS)?;

    for business in list.items() {
        writer.write_record([
            business.name.as_deref().unwrap_or(""),
            business.address.as_deref().unwrap_or(""),
            business.website.as_deref().unwrap_or(""),
            business.phone_number.as_deref().unwrap_or(""),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ScraperError::FileIO(e.into_error()))
}

/// コレクションをエクスポートディレクトリにCSVファイルとして保存する
pub fn save_csv(list: &BusinessList, export_dir: &Path) -> Result<PathBuf, ScraperError> {
    std::fs::create_dir_all(export_dir)?;

    let path = export_dir.join(export_filename());
    std::fs::write(&path, to_csv(list)?)?;

    info!("Saved {} records to {:?}", list.len(), path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maps::Business;

    fn populated_list() -> BusinessList {
        let mut list = BusinessList::new(10);
        list.push(Business {
            name: Some("寿司処さくら".to_string()),
            address: Some("東京都中央区1-2-3".to_string()),
            website: Some("sakura-sushi.example.com".to_string()),
            phone_number: Some("03-1234-5678".to_string()),
        });
        list.push(Business {
            name: Some("Cafe Blue".to_string()),
            address: None,
            website: None,
            phone_number: Some("03-9876-5432".to_string()),
        });
        list
    }

    #[test]
    fn test_empty_list_exports_headers_only() {
        let list = BusinessList::new(10);
        let bytes = to_csv(&list).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines, vec!["name,address,website,phone_number"]);
    }

    #[test]
    fn test_one_row_per_record() {
        let bytes = to_csv(&populated_list()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("寿司処さくら,"));
    }

    #[test]
    fn test_absent_fields_become_empty_cells() {
        let bytes = to_csv(&populated_list()).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let second = text.lines().nth(2).unwrap();
        assert_eq!(second, "Cafe Blue,,,03-9876-5432");
    }

    #[test]
    fn test_export_filename_format() {
        let name = export_filename();
        assert!(name.starts_with("scraped_data_"));
        assert!(name.ends_with(".csv"));
        assert_ne!(name, export_filename());
    }
}
