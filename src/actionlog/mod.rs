//! PSO2 NGS の ActionLog から採取アイテムの取得数を数える
//!
//! ログは `<ドキュメント>/SEGA/PHANTASYSTARONLINE2/log_ngs/ActionLog<YYYYMMDD>_*.txt`
//! にゲームが書き込む。毎回ファイル全体を読み直して今日の分を数える。

pub mod aggregator;
pub mod day;
pub mod engine;
pub mod locator;
pub mod parser;
pub mod reader;

pub use aggregator::{aggregate, CountSet, Progress, ScanReport};
pub use day::{logical_day, logical_now, CALENDAR_CUTOVER_HOUR, DEFAULT_CUTOVER_HOUR};
pub use engine::{Counter, EngineConfig, PollError, Snapshot, WatchList};
pub use locator::candidate_files;
pub use parser::{parse_line, LineError, PickupEvent};
pub use reader::read_all_lines;
