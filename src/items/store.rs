//! ユーザ定義アイテムの保存先（items.csv）
//!
//! 1行1アイテムで `アイテム名,ノルマ数`。ヘッダ・クォートなし。

use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::model::WatchedItem;
use crate::actionlog::reader::{read_text, split_lines};

/// デフォルトのファイル名（カレントディレクトリ）
pub const DEFAULT_ITEMS_FILE: &str = "items.csv";

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// 保存結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// 書き込んだ件数
    Written(usize),
    /// 保存対象が無いので書き込まなかった（既存ファイルはそのまま）
    Skipped,
}

pub fn default_items_path() -> PathBuf {
    PathBuf::from(DEFAULT_ITEMS_FILE)
}

/// 1行を読む。列数が2でない・名前が空・ノルマが0以上の整数でない行は None
pub fn parse_item_line(line: &str) -> Option<WatchedItem> {
    let columns: Vec<&str> = line.split(',').collect();
    if columns.len() != 2 {
        return None;
    }
    let quota = columns[1].trim().parse::<u32>().ok()?;
    WatchedItem::user(columns[0], quota).ok()
}

/// ファイル内容からアイテムを読む（不正な行は黙って読み飛ばす）
pub fn parse_watch_list(content: &str) -> Vec<WatchedItem> {
    split_lines(content)
        .iter()
        .filter_map(|line| parse_item_line(line))
        .collect()
}

/// 保存対象（固定アイテム・名前が空のものを除く）を書式化する。対象が無ければ None
pub fn format_watch_list(items: &[WatchedItem]) -> Option<String> {
    let lines: Vec<String> = items
        .iter()
        .filter(|item| !item.read_only && !item.is_blank())
        .map(|item| format!("{},{}", item.name, item.quota))
        .collect();

    if lines.is_empty() {
        return None;
    }

    let mut content = lines.join(LINE_ENDING);
    content.push_str(LINE_ENDING);
    Some(content)
}

/// ユーザ定義アイテムを読む（ファイルが無ければ空）
pub fn load(path: &Path) -> Result<Vec<WatchedItem>> {
    let content = match read_text(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Watch list not found: {}", path.display());
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    };

    let items = parse_watch_list(&content);
    info!("Loaded {} watched items from {}", items.len(), path.display());
    Ok(items)
}

/// ユーザ定義アイテムを保存する
///
/// 保存対象が1件も無い場合は書き込まない（誤って空で上書きしないため）。
pub fn save(path: &Path, items: &[WatchedItem]) -> Result<SaveOutcome> {
    let Some(content) = format_watch_list(items) else {
        debug!("No user items to save, leaving {} untouched", path.display());
        return Ok(SaveOutcome::Skipped);
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    let count = content.lines().count();
    info!("Saved {} watched items to {}", count, path.display());
    Ok(SaveOutcome::Written(count))
}
