//! 取得ログの集計
//!
//! 差分を追わず、毎回ファイル全体からゼロから数え直す。
//! 1パスでアイテム名ごとの合計を作り、監視対象の名前だけを残す。

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::warn;

use super::day::logical_day;
use super::parser::{parse_line, PICKUP_TAG};
use super::reader::read_all_lines;

/// アイテム名ごとの取得数
///
/// 1度も取得していないアイテムは含まれないが、`get` は 0 を返すので
/// 「無い」と「0」を区別する必要はない。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CountSet(HashMap<String, u64>);

impl CountSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得数（無ければ0）
    pub fn get(&self, name: &str) -> u64 {
        self.0.get(name).copied().unwrap_or(0)
    }

    pub fn add(&mut self, name: &str, quantity: u64) {
        *self.0.entry(name.to_string()).or_insert(0) += quantity;
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// ノルマに対する進捗
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub count: u64,
    pub quota: u32,
    pub completed: bool,
}

impl Progress {
    /// 取得数がノルマ数以上なら完了
    pub fn of(count: u64, quota: u32) -> Self {
        Self {
            count,
            quota,
            completed: count >= u64::from(quota),
        }
    }
}

/// 1回の集計で読んだ量（デバッグログ用）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// 候補ファイル数
    pub files: usize,
    /// 読めなかったファイル数
    pub unreadable_files: usize,
    /// 読んだ行数
    pub lines: usize,
    /// 取得ログの行数（日付・アイテム名での絞り込み前）
    pub pickups: usize,
    /// 集計に数えた行数
    pub counted: usize,
}

/// 集計の途中状態
pub struct Tally {
    names: HashSet<String>,
    cutover_hour: u32,
    today: NaiveDate,
    counts: CountSet,
    report: ScanReport,
}

impl Tally {
    /// `now` の論理日に属する取得だけを数える集計を開始する
    ///
    /// 空白のみの名前（新規追加用の空行など）は対象にしない。
    pub fn new<I, S>(names: I, cutover_hour: u32, now: NaiveDateTime) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|n| n.as_ref().to_string())
            .filter(|n| !n.trim().is_empty())
            .collect();

        Self {
            names,
            cutover_hour,
            today: logical_day(now, cutover_hour),
            counts: CountSet::new(),
            report: ScanReport::default(),
        }
    }

    /// 行を集計に加える（壊れた行・対象外の行は黙って読み飛ばす）
    pub fn add_lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for line in lines {
            self.add_line(line.as_ref());
        }
    }

    fn add_line(&mut self, line: &str) {
        self.report.lines += 1;

        // 大まかな絞り込み
        if !line.contains(PICKUP_TAG) {
            return;
        }
        let event = match parse_line(line) {
            Ok(Some(event)) => event,
            Ok(None) | Err(_) => return,
        };
        self.report.pickups += 1;

        if logical_day(event.timestamp, self.cutover_hour) != self.today {
            return;
        }
        if !self.names.contains(event.item_name) {
            return;
        }

        self.counts.add(event.item_name, u64::from(event.quantity));
        self.report.counted += 1;
    }

    /// ファイルを読んで集計に加える
    ///
    /// 読めないファイルは警告を出して0件として扱い、他のファイルの集計は続ける。
    pub fn add_file(&mut self, path: &Path) {
        self.report.files += 1;
        match read_all_lines(path) {
            Ok(lines) => self.add_lines(lines),
            Err(e) => {
                self.report.unreadable_files += 1;
                warn!("Failed to read log file {}: {}", path.display(), e);
            }
        }
    }

    pub fn finish(self) -> (CountSet, ScanReport) {
        (self.counts, self.report)
    }
}

/// 候補ファイルすべてから、監視対象アイテムの今日の取得数を数える
pub fn aggregate<I, S>(
    names: I,
    files: &[PathBuf],
    cutover_hour: u32,
    now: NaiveDateTime,
) -> (CountSet, ScanReport)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tally = Tally::new(names, cutover_hour, now);
    for file in files {
        tally.add_file(file);
    }
    tally.finish()
}
