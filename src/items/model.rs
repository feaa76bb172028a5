use serde::{Deserialize, Serialize};
use thiserror::Error;

/// アイテム名として使えない理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemError {
    #[error("item name cannot be empty")]
    EmptyName,

    #[error("item name cannot contain ',' or line breaks: {0:?}")]
    InvalidName(String),

    #[error("built-in item cannot be changed: {0}")]
    ReadOnly(String),
}

/// 収集対象のアイテム
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchedItem {
    /// アイテム名（ログの列と完全一致で比較する）
    pub name: String,
    /// ノルマ数
    pub quota: u32,
    /// 読み取り専用（設定ファイル由来の固定アイテム）
    #[serde(default)]
    pub read_only: bool,
}

impl WatchedItem {
    /// ユーザ定義アイテム
    pub fn user(name: impl Into<String>, quota: u32) -> Result<Self, ItemError> {
        let name = name.into();
        validate_name(&name)?;
        Ok(Self {
            name,
            quota,
            read_only: false,
        })
    }

    /// 固定アイテム
    pub fn builtin(name: impl Into<String>, quota: u32) -> Self {
        Self {
            name: name.into(),
            quota,
            read_only: true,
        }
    }

    /// 新規追加用の空行など、名前が空白のみのアイテムか
    pub fn is_blank(&self) -> bool {
        self.name.trim().is_empty()
    }
}

/// items.csv に書けて、読み戻せる名前か
pub fn validate_name(name: &str) -> Result<(), ItemError> {
    if name.trim().is_empty() {
        return Err(ItemError::EmptyName);
    }
    if name.contains([',', '\r', '\n']) {
        return Err(ItemError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// 同名のユーザ定義アイテムがあればノルマを更新し、無ければ末尾に追加する
pub fn upsert_item(items: &mut Vec<WatchedItem>, item: WatchedItem) -> Result<(), ItemError> {
    match items.iter_mut().find(|existing| existing.name == item.name) {
        Some(existing) if existing.read_only => Err(ItemError::ReadOnly(item.name)),
        Some(existing) => {
            existing.quota = item.quota;
            Ok(())
        }
        None => {
            items.push(item);
            Ok(())
        }
    }
}

/// 読み込んだユーザ定義アイテムを末尾に加える
///
/// 同名の行が重なっていても読んだとおりに残す。固定アイテムと同名の行だけは捨てる。
pub fn merge_user_items(items: &mut Vec<WatchedItem>, user_items: Vec<WatchedItem>) {
    for item in user_items {
        if items.iter().any(|existing| existing.read_only && existing.name == item.name) {
            tracing::warn!("Ignoring user item: {}", ItemError::ReadOnly(item.name));
            continue;
        }
        items.push(item);
    }
}

/// 同名のユーザ定義アイテムをすべて削除する。削除した件数を返す
pub fn remove_item(items: &mut Vec<WatchedItem>, name: &str) -> Result<usize, ItemError> {
    if items.iter().any(|item| item.read_only && item.name == name) {
        return Err(ItemError::ReadOnly(name.to_string()));
    }
    let before = items.len();
    items.retain(|item| item.name != name);
    Ok(before - items.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_item() {
        let item = WatchedItem::user("アルファリアクター", 30).unwrap();
        assert_eq!(item.quota, 30);
        assert!(!item.read_only);
        assert!(!item.is_blank());
    }

    #[test]
    fn test_builtin_item_is_read_only() {
        assert!(WatchedItem::builtin("X", 1).read_only);
    }

    #[test]
    fn test_rejects_unsavable_names() {
        assert_eq!(WatchedItem::user("  ", 1), Err(ItemError::EmptyName));
        assert!(matches!(
            WatchedItem::user("a,b", 1),
            Err(ItemError::InvalidName(_))
        ));
        assert!(matches!(
            WatchedItem::user("a\nb", 1),
            Err(ItemError::InvalidName(_))
        ));
    }

    #[test]
    fn test_name_is_kept_verbatim() {
        // 全角・半角や前後の空白は正規化しない
        let item = WatchedItem::user(" ﾓﾉﾒｲﾄ", 1).unwrap();
        assert_eq!(item.name, " ﾓﾉﾒｲﾄ");
    }

    #[test]
    fn test_upsert_updates_existing_quota() {
        let mut items = vec![WatchedItem::user("X", 1).unwrap()];
        upsert_item(&mut items, WatchedItem::user("X", 9).unwrap()).unwrap();
        upsert_item(&mut items, WatchedItem::user("Y", 2).unwrap()).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].quota, 9);
        assert_eq!(items[1].name, "Y");
    }

    #[test]
    fn test_builtin_items_cannot_be_edited() {
        let mut items = vec![WatchedItem::builtin("X", 1)];
        assert_eq!(
            upsert_item(&mut items, WatchedItem::user("X", 9).unwrap()),
            Err(ItemError::ReadOnly("X".to_string()))
        );
        assert_eq!(
            remove_item(&mut items, "X"),
            Err(ItemError::ReadOnly("X".to_string()))
        );
        assert_eq!(items[0].quota, 1);
    }

    #[test]
    fn test_merge_keeps_duplicates_but_not_builtin_names() {
        let mut items = vec![WatchedItem::builtin("Fixed", 1)];
        merge_user_items(
            &mut items,
            vec![
                WatchedItem::user("X", 1).unwrap(),
                WatchedItem::user("Fixed", 5).unwrap(),
                WatchedItem::user("X", 2).unwrap(),
            ],
        );
        assert_eq!(
            items,
            vec![
                WatchedItem::builtin("Fixed", 1),
                WatchedItem::user("X", 1).unwrap(),
                WatchedItem::user("X", 2).unwrap(),
            ]
        );
    }

    #[test]
    fn test_remove_item() {
        let mut items = vec![
            WatchedItem::user("X", 1).unwrap(),
            WatchedItem::user("Y", 1).unwrap(),
        ];
        assert_eq!(remove_item(&mut items, "X"), Ok(1));
        assert_eq!(remove_item(&mut items, "X"), Ok(0));
        assert_eq!(items.len(), 1);
    }
}
