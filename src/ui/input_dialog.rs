use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::centered_rect;

/// 入力ダイアログの種類
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputDialogKind {
    /// アイテム追加（`アイテム名,ノルマ数` を入力）
    AddItem,
    /// アイテム削除確認
    DeleteItem { index: usize, name: String },
}

/// 入力ダイアログの状態
#[derive(Debug, Clone)]
pub struct InputDialog {
    pub kind: InputDialogKind,
    pub input: String,
    /// カーソル位置（文字単位）
    pub cursor_position: usize,
    pub error_message: Option<String>,
}

impl InputDialog {
    pub fn new_add_item() -> Self {
        Self {
            kind: InputDialogKind::AddItem,
            input: String::new(),
            cursor_position: 0,
            error_message: None,
        }
    }

    pub fn new_delete_item(index: usize, name: String) -> Self {
        Self {
            kind: InputDialogKind::DeleteItem { index, name },
            input: String::new(),
            cursor_position: 0,
            error_message: None,
        }
    }

    /// 確認のみのダイアログか（文字入力を受け付けない）
    pub fn is_confirmation(&self) -> bool {
        matches!(self.kind, InputDialogKind::DeleteItem { .. })
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.input.len())
    }

    fn char_len(&self) -> usize {
        self.input.chars().count()
    }

    /// 文字を入力
    pub fn insert_char(&mut self, c: char) {
        let offset = self.byte_offset(self.cursor_position);
        self.input.insert(offset, c);
        self.cursor_position += 1;
        self.error_message = None;
    }

    /// バックスペース
    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let offset = self.byte_offset(self.cursor_position);
            self.input.remove(offset);
            self.error_message = None;
        }
    }

    /// Delete
    pub fn delete(&mut self) {
        if self.cursor_position < self.char_len() {
            let offset = self.byte_offset(self.cursor_position);
            self.input.remove(offset);
            self.error_message = None;
        }
    }

    /// カーソルを左に移動
    pub fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    /// カーソルを右に移動
    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.char_len() {
            self.cursor_position += 1;
        }
    }

    /// エラーメッセージを設定
    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }

    /// カーソルの表示列（全角文字は2列）
    pub fn cursor_column(&self) -> u16 {
        let before = &self.input[..self.byte_offset(self.cursor_position)];
        before.width() as u16
    }
}

/// 入力ダイアログを描画
pub fn render(frame: &mut Frame, area: Rect, dialog: &InputDialog) {
    let popup_area = centered_rect(60, 30, area);
    frame.render_widget(Clear, popup_area);

    let (title, prompt, hint) = match &dialog.kind {
        InputDialogKind::AddItem => (
            " Add Item ".to_string(),
            "アイテム名,ノルマ数:".to_string(),
            "Enter: add | Esc: cancel".to_string(),
        ),
        InputDialogKind::DeleteItem { name, .. } => (
            " Delete Item ".to_string(),
            format!("{} を削除しますか？", name),
            "y: confirm | n/Esc: cancel".to_string(),
        ),
    };

    let inner_area = popup_area.inner(ratatui::layout::Margin {
        vertical: 1,
        horizontal: 1,
    });

    let chunks = Layout::vertical([
        Constraint::Length(2), // Prompt
        Constraint::Length(3), // Input
        Constraint::Length(1), // Error
        Constraint::Length(1), // Hint
    ])
    .split(inner_area);

    // プロンプト
    let prompt_widget = Paragraph::new(prompt.as_str())
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(prompt_widget, chunks[0]);

    // 入力フィールド（確認ダイアログでは表示しない）
    if !dialog.is_confirmation() {
        let input_style = if dialog.error_message.is_some() {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::White)
        };

        let input_widget = Paragraph::new(dialog.input.as_str())
            .style(input_style)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(input_widget, chunks[1]);

        frame.set_cursor_position((
            chunks[1].x + dialog.cursor_column() + 1,
            chunks[1].y + 1,
        ));
    }

    // エラーメッセージ
    if let Some(ref error) = dialog.error_message {
        let error_widget = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red));
        frame.render_widget(error_widget, chunks[2]);
    }

    // ヒント
    let hint_widget = Paragraph::new(hint.as_str())
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center);
    frame.render_widget(hint_widget, chunks[3]);

    // 外枠
    let block = Block::default()
        .title(title.as_str())
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(block, popup_area);
}
