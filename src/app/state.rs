use chrono::{NaiveDate, NaiveDateTime};

use crate::actionlog::{Progress, ScanReport, Snapshot};
use crate::items::{upsert_item, ItemError, WatchedItem};
use crate::ui::input_dialog::{InputDialog, InputDialogKind};

/// アプリケーションの表示モード
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    List,
    Help,
    /// 入力ダイアログ表示中
    Input,
}

/// 一覧の1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRow {
    pub item: WatchedItem,
    pub progress: Progress,
}

impl ItemRow {
    fn new(item: WatchedItem) -> Self {
        let progress = Progress::of(0, item.quota);
        Self { item, progress }
    }
}

/// アプリケーション状態
///
/// 一覧の末尾には常に新規追加用の空行があり、`selected_index` は
/// `items.len()` を指すことがある。空行は集計にも保存にも含めない。
pub struct AppState {
    /// 収集対象アイテム（固定アイテムが先頭）
    pub items: Vec<ItemRow>,
    /// 現在選択中の行
    pub selected_index: usize,
    /// 表示モード
    pub view_mode: ViewMode,
    /// 入力ダイアログ状態
    pub input_dialog: Option<InputDialog>,
    /// 終了フラグ
    pub should_quit: bool,
    /// ステータスバーメッセージ
    pub status_message: Option<String>,
    /// 最後に集計した時刻
    pub last_polled: Option<NaiveDateTime>,
    /// 最後に集計した採取日
    pub logical_day: Option<NaiveDate>,
    /// 最後の集計で読んだ量
    pub last_report: Option<ScanReport>,
    /// ユーザ定義アイテムを編集したか
    dirty: bool,
}

impl AppState {
    /// 新規状態を作成
    pub fn new(items: Vec<WatchedItem>) -> Self {
        Self {
            items: items.into_iter().map(ItemRow::new).collect(),
            selected_index: 0,
            view_mode: ViewMode::List,
            input_dialog: None,
            should_quit: false,
            status_message: None,
            last_polled: None,
            logical_day: None,
            last_report: None,
            dirty: false,
        }
    }

    /// 表示行数（末尾の空行を含む）
    pub fn row_count(&self) -> usize {
        self.items.len() + 1
    }

    /// 集計対象のアイテム名
    pub fn watched_names(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|row| !row.item.is_blank())
            .map(|row| row.item.name.clone())
            .collect()
    }

    /// 保存対象を含むアイテム一覧
    pub fn watched_items(&self) -> Vec<WatchedItem> {
        self.items.iter().map(|row| row.item.clone()).collect()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// 集計結果を反映し、ノルマ達成を判定し直す
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        for row in &mut self.items {
            let count = snapshot.counts.get(&row.item.name);
            row.progress = Progress::of(count, row.item.quota);
        }
        self.last_polled = Some(snapshot.calendar_now);
        self.logical_day = Some(snapshot.logical_day);
        self.last_report = Some(snapshot.report);
    }

    /// ノルマ達成済みのアイテム数
    pub fn completed_count(&self) -> usize {
        self.items.iter().filter(|row| row.progress.completed).count()
    }

    /// 選択中のアイテム（空行なら None）
    pub fn selected_row(&self) -> Option<&ItemRow> {
        self.items.get(self.selected_index)
    }

    /// 上に移動
    pub fn move_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
        }
    }

    /// 下に移動
    pub fn move_down(&mut self) {
        if self.selected_index + 1 < self.row_count() {
            self.selected_index += 1;
        }
    }

    /// ヘルプ表示切替
    pub fn toggle_help(&mut self) {
        self.view_mode = if self.view_mode == ViewMode::Help {
            ViewMode::List
        } else {
            ViewMode::Help
        };
    }

    /// アイテム追加ダイアログを開く
    pub fn open_add_dialog(&mut self) {
        self.input_dialog = Some(InputDialog::new_add_item());
        self.view_mode = ViewMode::Input;
    }

    /// 削除確認ダイアログを開く（固定アイテム・空行は削除できない）
    pub fn open_delete_dialog(&mut self) {
        let Some(row) = self.selected_row() else {
            return;
        };
        if row.item.read_only {
            self.status_message = Some(format!("{} は固定アイテムのため削除できません", row.item.name));
            return;
        }
        let dialog = InputDialog::new_delete_item(self.selected_index, row.item.name.clone());
        self.input_dialog = Some(dialog);
        self.view_mode = ViewMode::Input;
    }

    /// ダイアログを閉じる
    pub fn close_input_dialog(&mut self) {
        self.input_dialog = None;
        self.view_mode = ViewMode::List;
    }

    /// 追加ダイアログの入力を確定する。成功したら true
    pub fn submit_add_dialog(&mut self) -> bool {
        let Some(dialog) = self.input_dialog.as_mut() else {
            return false;
        };
        if dialog.kind != InputDialogKind::AddItem {
            return false;
        }

        let item = match parse_item_input(&dialog.input) {
            Ok(item) => item,
            Err(message) => {
                dialog.set_error(message);
                return false;
            }
        };

        let name = item.name.clone();
        match self.add_item(item) {
            Ok(()) => {
                self.status_message = Some(format!("Added {}", name));
                self.close_input_dialog();
                true
            }
            Err(e) => {
                if let Some(dialog) = self.input_dialog.as_mut() {
                    dialog.set_error(e.to_string());
                }
                false
            }
        }
    }

    /// 削除ダイアログを確定する。成功したら true
    pub fn confirm_delete_dialog(&mut self) -> bool {
        let target = match self.input_dialog.as_ref().map(|d| &d.kind) {
            Some(InputDialogKind::DeleteItem { index, name }) => Some((*index, name.clone())),
            _ => None,
        };
        self.close_input_dialog();

        let Some((index, name)) = target else {
            return false;
        };
        match self.items.get(index) {
            Some(row) if row.item.name == name && !row.item.read_only => {
                self.items.remove(index);
                self.dirty = true;
                if self.selected_index >= self.row_count() {
                    self.selected_index = self.row_count() - 1;
                }
                self.status_message = Some(format!("Deleted {}", name));
                true
            }
            _ => false,
        }
    }

    /// アイテムを追加（同名のユーザ定義アイテムはノルマを更新）
    pub fn add_item(&mut self, item: WatchedItem) -> Result<(), ItemError> {
        let mut items = self.watched_items();
        upsert_item(&mut items, item)?;
        self.replace_items(items);
        self.dirty = true;
        Ok(())
    }

    /// 取得数を保ったまま一覧を置き換える
    fn replace_items(&mut self, items: Vec<WatchedItem>) {
        let previous = std::mem::take(&mut self.items);
        self.items = items
            .into_iter()
            .map(|item| {
                let count = previous
                    .iter()
                    .find(|row| row.item.name == item.name)
                    .map(|row| row.progress.count)
                    .unwrap_or(0);
                let progress = Progress::of(count, item.quota);
                ItemRow { item, progress }
            })
            .collect();
        if self.selected_index >= self.row_count() {
            self.selected_index = self.row_count() - 1;
        }
    }
}

/// `アイテム名,ノルマ数` の入力をアイテムにする
fn parse_item_input(input: &str) -> Result<WatchedItem, String> {
    let Some((name, quota)) = input.split_once(',') else {
        return Err("アイテム名,ノルマ数 の形式で入力してください".to_string());
    };
    let quota = quota
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("ノルマ数が不正です: {}", quota.trim()))?;
    WatchedItem::user(name.trim(), quota).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actionlog::CountSet;

    fn snapshot(counts: &[(&str, u64)]) -> Snapshot {
        let mut set = CountSet::new();
        for (name, count) in counts {
            set.add(name, *count);
        }
        let now = NaiveDateTime::parse_from_str("2022-05-05T03:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
        Snapshot {
            calendar_now: now,
            logical_day: NaiveDate::from_ymd_opt(2022, 5, 4).unwrap(),
            counts: set,
            files: Vec::new(),
            report: ScanReport::default(),
        }
    }

    fn state() -> AppState {
        AppState::new(vec![
            WatchedItem::builtin("Fixed", 2),
            WatchedItem::user("A", 3).unwrap(),
            WatchedItem::user("B", 0).unwrap(),
        ])
    }

    #[test]
    fn test_apply_snapshot_sets_counts_and_completion() {
        let mut state = state();
        state.apply_snapshot(&snapshot(&[("Fixed", 2), ("A", 1)]));

        assert_eq!(state.items[0].progress, Progress::of(2, 2));
        assert!(state.items[0].progress.completed);
        assert_eq!(state.items[1].progress.count, 1);
        assert!(!state.items[1].progress.completed);
        // ノルマ0は取得0でも達成
        assert!(state.items[2].progress.completed);
        assert_eq!(state.completed_count(), 2);
        assert_eq!(state.logical_day, NaiveDate::from_ymd_opt(2022, 5, 4));
    }

    #[test]
    fn test_absent_counts_reset_to_zero() {
        let mut state = state();
        state.apply_snapshot(&snapshot(&[("A", 5)]));
        assert!(state.items[1].progress.completed);

        // 日付が変わって集計から消えたら0に戻る
        state.apply_snapshot(&snapshot(&[]));
        assert_eq!(state.items[1].progress.count, 0);
        assert!(!state.items[1].progress.completed);
    }

    #[test]
    fn test_placeholder_row_is_selectable_but_not_watched() {
        let mut state = state();
        for _ in 0..10 {
            state.move_down();
        }
        assert_eq!(state.selected_index, 3);
        assert!(state.selected_row().is_none());
        assert_eq!(state.watched_names(), vec!["Fixed", "A", "B"]);
    }

    #[test]
    fn test_add_item_via_dialog() {
        let mut state = state();
        state.open_add_dialog();
        for c in " アルファリアクター , 30".chars() {
            state.input_dialog.as_mut().unwrap().insert_char(c);
        }
        assert!(state.submit_add_dialog());
        assert_eq!(state.view_mode, ViewMode::List);
        assert!(state.is_dirty());
        let added = state.items.last().unwrap();
        assert_eq!(added.item, WatchedItem::user("アルファリアクター", 30).unwrap());
    }

    #[test]
    fn test_add_dialog_reports_errors() {
        let mut state = state();
        state.open_add_dialog();
        for c in "no-quota".chars() {
            state.input_dialog.as_mut().unwrap().insert_char(c);
        }
        assert!(!state.submit_add_dialog());
        assert!(state.input_dialog.as_ref().unwrap().error_message.is_some());

        state.close_input_dialog();
        state.open_add_dialog();
        for c in "Fixed,9".chars() {
            state.input_dialog.as_mut().unwrap().insert_char(c);
        }
        assert!(!state.submit_add_dialog());
        assert_eq!(state.items[0].item.quota, 2);
        assert!(!state.is_dirty());
    }

    #[test]
    fn test_add_keeps_existing_counts() {
        let mut state = state();
        state.apply_snapshot(&snapshot(&[("A", 2)]));
        state.add_item(WatchedItem::user("A", 2).unwrap()).unwrap();
        assert_eq!(state.items[1].progress, Progress::of(2, 2));
    }

    #[test]
    fn test_delete_selected_item() {
        let mut state = state();
        state.selected_index = 1;
        state.open_delete_dialog();
        assert_eq!(state.view_mode, ViewMode::Input);
        assert!(state.confirm_delete_dialog());
        assert_eq!(state.watched_names(), vec!["Fixed", "B"]);
        assert!(state.is_dirty());
    }

    #[test]
    fn test_builtin_and_placeholder_cannot_be_deleted() {
        let mut state = state();
        state.selected_index = 0;
        state.open_delete_dialog();
        assert!(state.input_dialog.is_none());
        assert!(state.status_message.is_some());

        state.selected_index = 3;
        state.open_delete_dialog();
        assert!(state.input_dialog.is_none());
        assert_eq!(state.items.len(), 3);
    }

    #[test]
    fn test_delete_last_item_keeps_selection_on_screen() {
        let mut state = state();
        state.selected_index = 2;
        state.open_delete_dialog();
        assert!(state.confirm_delete_dialog());
        // 削除後は末尾の空行を指す
        assert_eq!(state.selected_index, 2);
        assert!(state.selected_row().is_none());
    }
}
