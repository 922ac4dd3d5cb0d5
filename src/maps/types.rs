//! 地図検索スクレイパー関連の型定義

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// 進捗コールバック（レコード追加ごとに 0.0〜1.0 で通知）
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// 1件のビジネス情報
///
/// 4フィールドはそれぞれ独立にオプショナル。詳細パネルに該当要素が
/// 無ければ None のままレコードとして成立する（エラーではない）。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Business {
    pub name: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
}

/// 取得結果コレクション
///
/// 発見順を保持する。目標件数を超える追加は受け付けない。
#[derive(Debug, Clone)]
pub struct BusinessList {
    items: Vec<Business>,
    target: usize,
}

impl BusinessList {
    pub fn new(target: usize) -> Self {
        Self {
            items: Vec::new(),
            target,
        }
    }

    /// レコードを追加する。目標件数に達している場合は追加せず false を返す
    pub fn push(&mut self, business: Business) -> bool {
        if self.is_full() {
            return false;
        }
        self.items.push(business);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.target
    }

    /// 現在の進捗 (0.0〜1.0)
    pub fn progress(&self) -> f64 {
        if self.target == 0 {
            return 1.0;
        }
        (self.items.len() as f64 / self.target as f64).min(1.0)
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn items(&self) -> &[Business] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Business> {
        self.items
    }
}

/// 地図検索スクレイプ結果
#[derive(Debug, Clone)]
pub struct MapsResult {
    /// 取得したビジネス情報
    pub businesses: BusinessList,
    /// 処理したエントリURL数（スキップ分を含む）
    pub visited: usize,
    /// エラーでスキップしたエントリ数
    pub skipped: usize,
    /// 実行ID
    pub run_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_list_respects_target() {
        let mut list = BusinessList::new(2);
        assert!(list.push(Business::default()));
        assert!(list.push(Business::default()));
        assert!(list.is_full());
        assert!(!list.push(Business::default()));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_progress_monotonic_and_bounded() {
        let mut list = BusinessList::new(3);
        let mut last = 0.0;
        assert_eq!(list.progress(), 0.0);
        for _ in 0..3 {
            list.push(Business::default());
            let p = list.progress();
            assert!(p >= last && p <= 1.0);
            last = p;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut list = BusinessList::new(10);
        for i in 0..3 {
            list.push(Business {
                name: Some(format!("store-{}", i)),
                ..Default::default()
            });
        }
        let names: Vec<_> = list
            .items()
            .iter()
            .map(|b| b.name.clone().unwrap())
            .collect();
        assert_eq!(names, vec!["store-0", "store-1", "store-2"]);
    }

    #[test]
    fn test_optional_fields_stay_absent() {
        let business = Business {
            name: Some("店名のみ".to_string()),
            ..Default::default()
        };
        assert!(business.address.is_none());
        assert!(business.website.is_none());
        assert!(business.phone_number.is_none());
    }
}
