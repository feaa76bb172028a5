//! 日付の切り替え時刻を考慮した「今日」の計算
//!
//! ゲーム内の1日は午前0時ではなく切り替え時刻（デフォルト4時）で区切られる。
//! ファイル選択（切り替え0時 = 暦どおり）と取得ログの集計対象判定
//! （切り替え4時）の両方で同じ関数を使う。

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

/// 暦どおりの日付（切り替え0時）
pub const CALENDAR_CUTOVER_HOUR: u32 = 0;

/// 採取の日付切り替え時刻のデフォルト
pub const DEFAULT_CUTOVER_HOUR: u32 = 4;

/// 切り替え時刻に達していなければ前日の同時刻を返す
///
/// 例: 4/2 0時 → cutover 0 なら 4/2 0時、cutover 1 なら 4/1 0時
pub fn logical_now(reference: NaiveDateTime, cutover_hour: u32) -> NaiveDateTime {
    if reference.hour() < cutover_hour {
        reference - Duration::days(1)
    } else {
        reference
    }
}

/// 基準時刻が属する論理日
pub fn logical_day(reference: NaiveDateTime, cutover_hour: u32) -> NaiveDate {
    logical_now(reference, cutover_hour).date()
}
