use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use std::time::Duration;

use crate::actionlog::Snapshot;

/// アプリケーション内部イベント
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// キー入力
    Key(KeyEvent),
    /// ターミナルリサイズ
    Resize(u16, u16),
    /// 集計結果（ポーリングタスクから）
    CountsUpdated(Snapshot),
}

/// ユーザーアクション（キー入力から変換）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// 上に移動
    MoveUp,
    /// 下に移動
    MoveDown,
    /// ヘルプ表示切替
    ToggleHelp,
    /// すぐに読み直す
    Refresh,
    /// アイテム追加
    AddItem,
    /// 選択中のアイテムを削除
    DeleteItem,
    /// オーバーレイを閉じる
    Back,
    /// 終了
    Quit,
    /// 何もしない
    None,
}

impl From<KeyEvent> for Action {
    fn from(key: KeyEvent) -> Self {
        match (key.code, key.modifiers) {
            // 移動
            (KeyCode::Up | KeyCode::Char('k'), _) => Action::MoveUp,
            (KeyCode::Down | KeyCode::Char('j'), _) => Action::MoveDown,
            // ヘルプ
            (KeyCode::Char('?'), _) => Action::ToggleHelp,
            (KeyCode::Esc, _) => Action::Back,
            // リフレッシュ
            (KeyCode::Char('r'), _) => Action::Refresh,
            // 編集
            (KeyCode::Char('a'), _) => Action::AddItem,
            (KeyCode::Char('d') | KeyCode::Delete, _) => Action::DeleteItem,
            // 終了（Ctrl-C は 'c' より先に判定する）
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Action::Quit,
            (KeyCode::Char('q'), _) => Action::Quit,
            // その他
            _ => Action::None,
        }
    }
}

/// イベントポーリング
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<AppEvent>> {
    if event::poll(timeout)? {
        match event::read()? {
            Event::Key(key) => Ok(Some(AppEvent::Key(key))),
            Event::Resize(w, h) => Ok(Some(AppEvent::Resize(w, h))),
            _ => Ok(None),
        }
    } else {
        Ok(None)
    }
}
