//! ActionLog の1行をパースする
//!
//! 行はタブ区切りで、少なくとも次の列を持つ:
//!
//! ```text
//! 0: 2022-05-05T16:14:47   タイムスタンプ（ロケール非依存の固定書式）
//! 2: [Pickup]              アクション種別
//! 5: アルファリアクター     アイテム名
//! 6: Num(1)                数量（Num(n) または CurrentNum(n)）
//! ```

use chrono::NaiveDateTime;
use thiserror::Error;

/// タイムスタンプの書式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// 取得ログの種別タグ
pub const PICKUP_TAG: &str = "[Pickup]";

const COL_TIMESTAMP: usize = 0;
const COL_KIND: usize = 2;
const COL_ITEM_NAME: usize = 5;
const COL_QUANTITY: usize = 6;
const MIN_COLUMNS: usize = COL_QUANTITY + 1;

/// 行として読めなかった理由
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
    #[error("expected at least 7 tab-separated columns, found {found}")]
    TooFewColumns { found: usize },

    #[error("invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("quantity out of range: {0:?}")]
    InvalidQuantity(String),
}

/// アクション種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind<'a> {
    Pickup,
    Other(&'a str),
}

impl<'a> ActionKind<'a> {
    fn from_tag(tag: &'a str) -> Self {
        if tag == PICKUP_TAG {
            ActionKind::Pickup
        } else {
            ActionKind::Other(tag)
        }
    }
}

/// パース済みの1行（元の行を借用する）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRecord<'a> {
    pub timestamp: NaiveDateTime,
    pub kind: ActionKind<'a>,
    pub item_name: &'a str,
    pub quantity: u32,
}

/// アイテム取得イベント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupEvent<'a> {
    pub timestamp: NaiveDateTime,
    pub item_name: &'a str,
    pub quantity: u32,
}

impl<'a> ActionRecord<'a> {
    /// 取得ログならイベントに変換
    pub fn into_pickup(self) -> Option<PickupEvent<'a>> {
        match self.kind {
            ActionKind::Pickup => Some(PickupEvent {
                timestamp: self.timestamp,
                item_name: self.item_name,
                quantity: self.quantity,
            }),
            ActionKind::Other(_) => None,
        }
    }
}

/// 1行を種別を問わずパースする
pub fn parse_record(raw: &str) -> Result<ActionRecord<'_>, LineError> {
    let columns: Vec<&str> = raw.split('\t').collect();
    if columns.len() < MIN_COLUMNS {
        return Err(LineError::TooFewColumns {
            found: columns.len(),
        });
    }

    let timestamp_str = columns[COL_TIMESTAMP].trim();
    let timestamp = NaiveDateTime::parse_from_str(timestamp_str, TIMESTAMP_FORMAT)
        .map_err(|_| LineError::InvalidTimestamp(timestamp_str.to_string()))?;

    Ok(ActionRecord {
        timestamp,
        kind: ActionKind::from_tag(columns[COL_KIND]),
        item_name: columns[COL_ITEM_NAME],
        quantity: parse_quantity(columns[COL_QUANTITY])?,
    })
}

/// 1行をパースし、取得ログのときだけイベントを返す
///
/// `Ok(None)` は正しい形式の取得以外のログ、`Err` は壊れた行。
pub fn parse_line(raw: &str) -> Result<Option<PickupEvent<'_>>, LineError> {
    parse_record(raw).map(ActionRecord::into_pickup)
}

/// 数量列から最初の数字の並びを取り出す（数字がなければ0）
pub fn parse_quantity(descriptor: &str) -> Result<u32, LineError> {
    let digits: &str = match descriptor.find(|c: char| c.is_ascii_digit()) {
        Some(start) => {
            let rest = &descriptor[start..];
            let len = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            &rest[..len]
        }
        None => return Ok(0),
    };

    digits
        .parse::<u32>()
        .map_err(|_| LineError::InvalidQuantity(descriptor.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str =
        "2022-05-05T16:14:47\t3\t[Pickup]\tpid\tchar\tアルファリアクター\tNum(1)";

    #[test]
    fn test_parse_pickup_line() {
        let event = parse_line(SAMPLE).unwrap().unwrap();
        assert_eq!(event.item_name, "アルファリアクター");
        assert_eq!(event.quantity, 1);
        assert_eq!(
            event.timestamp,
            NaiveDateTime::parse_from_str("2022-05-05T16:14:47", TIMESTAMP_FORMAT).unwrap()
        );
    }

    #[test]
    fn test_other_kind_is_not_pickup() {
        let line = SAMPLE.replace("[Pickup]", "[Drop]");
        assert_eq!(parse_line(&line).unwrap(), None);

        let record = parse_record(&line).unwrap();
        assert_eq!(record.kind, ActionKind::Other("[Drop]"));
        assert_eq!(record.item_name, "アルファリアクター");
    }

    #[test]
    fn test_kind_tag_is_case_sensitive() {
        let line = SAMPLE.replace("[Pickup]", "[pickup]");
        assert_eq!(parse_line(&line).unwrap(), None);
    }

    #[test]
    fn test_extra_columns_are_ignored() {
        let line = format!("{}\tMeseta(0)\textra\r", SAMPLE);
        let event = parse_line(&line).unwrap().unwrap();
        assert_eq!(event.quantity, 1);
    }

    #[test]
    fn test_current_num_descriptor() {
        assert_eq!(parse_quantity("CurrentNum(9)").unwrap(), 9);
        assert_eq!(parse_quantity("Num(120)").unwrap(), 120);
    }

    #[test]
    fn test_quantity_uses_first_digit_run() {
        assert_eq!(parse_quantity("Num(12)x(34)").unwrap(), 12);
        assert_eq!(parse_quantity("007").unwrap(), 7);
    }

    #[test]
    fn test_quantity_without_digits_is_zero() {
        assert_eq!(parse_quantity("Num()").unwrap(), 0);
        assert_eq!(parse_quantity("").unwrap(), 0);
        // 全角数字は数えない
        assert_eq!(parse_quantity("Num(１２)").unwrap(), 0);
    }

    #[test]
    fn test_quantity_overflow_is_error() {
        assert!(matches!(
            parse_quantity("Num(99999999999999999999)"),
            Err(LineError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn test_too_few_columns() {
        let line = "2022-05-05T16:14:47\t3\t[Pickup]\tpid\tchar\tアルファリアクター";
        assert_eq!(
            parse_line(line),
            Err(LineError::TooFewColumns { found: 6 })
        );
        assert_eq!(parse_line(""), Err(LineError::TooFewColumns { found: 1 }));
    }

    #[test]
    fn test_invalid_timestamp() {
        let slashed = SAMPLE.replace("2022-05-05T16:14:47", "2022/05/05 16:14:47");
        assert!(matches!(
            parse_line(&slashed),
            Err(LineError::InvalidTimestamp(_))
        ));

        let impossible = SAMPLE.replace("2022-05-05T16:14:47", "2022-02-30T16:14:47");
        assert!(matches!(
            parse_line(&impossible),
            Err(LineError::InvalidTimestamp(_))
        ));
    }
}
