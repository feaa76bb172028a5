//! 集計エンジン
//!
//! 1回のポーリング = 候補ファイルの列挙 → 全行の読み直し → 今日の分だけ集計。
//! 前回の結果は持たない。同時に2つのポーリングが走らないよう busy フラグで守る。

use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::aggregator::{aggregate, CountSet, ScanReport};
use super::day::{logical_now, CALENDAR_CUTOVER_HOUR, DEFAULT_CUTOVER_HOUR};
use super::locator::candidate_files;
use crate::items::{merge_user_items, store, SaveOutcome, WatchedItem};

/// エンジンの設定
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// ActionLog のディレクトリ
    pub log_dir: PathBuf,
    /// 採取日の切り替え時刻
    pub cutover_hour: u32,
    /// ポーリング間隔
    pub poll_interval: Duration,
    /// ユーザ定義アイテムのファイル
    pub items_file: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::new(),
            cutover_hour: DEFAULT_CUTOVER_HOUR,
            poll_interval: Duration::from_secs(1),
            items_file: store::default_items_path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    #[error("another poll cycle is still running")]
    Busy,
}

/// 1回のポーリング結果
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// 集計した時刻
    pub calendar_now: NaiveDateTime,
    /// 集計対象の採取日
    pub logical_day: NaiveDate,
    /// アイテムごとの取得数
    pub counts: CountSet,
    /// 読んだファイル
    pub files: Vec<PathBuf>,
    pub report: ScanReport,
}

/// 監視リストの読み込み結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchList {
    pub items: Vec<WatchedItem>,
    /// items.csv を読めたか
    pub user_items_loaded: bool,
}

/// busy フラグを立てている間だけ生きるガード
struct PollGuard<'a> {
    busy: &'a AtomicBool,
}

impl<'a> PollGuard<'a> {
    fn acquire(busy: &'a AtomicBool) -> Option<Self> {
        busy.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self { busy })
    }
}

impl Drop for PollGuard<'_> {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// 取得数カウンター
pub struct Counter {
    config: EngineConfig,
    busy: AtomicBool,
}

impl Counter {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            busy: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 切り替え時刻を考慮した現在日時（cutover 0 で暦どおり）
    pub fn today(&self, cutover_hour: u32) -> NaiveDateTime {
        Self::today_at(Local::now().naive_local(), cutover_hour)
    }

    /// `now` を基準にした「今日」。日付部分がその時点の論理日になる
    pub fn today_at(now: NaiveDateTime, cutover_hour: u32) -> NaiveDateTime {
        logical_now(now, cutover_hour)
    }

    /// 現在時刻で集計する
    pub fn counts<S: AsRef<str>>(&self, names: &[S]) -> Result<Snapshot, PollError> {
        self.counts_at(names, Local::now().naive_local())
    }

    /// 指定時刻を「今」として集計する
    pub fn counts_at<S: AsRef<str>>(
        &self,
        names: &[S],
        now: NaiveDateTime,
    ) -> Result<Snapshot, PollError> {
        let _guard = PollGuard::acquire(&self.busy).ok_or(PollError::Busy)?;

        let files = match candidate_files(&self.config.log_dir, now) {
            Ok(files) => files,
            Err(e) => {
                warn!(
                    "Failed to list log directory {}: {}",
                    self.config.log_dir.display(),
                    e
                );
                Vec::new()
            }
        };

        let names = names.iter().map(|n| n.as_ref());
        let (counts, report) = aggregate(names, &files, self.config.cutover_hour, now);

        debug!(
            "Poll: {} files ({} unreadable), {} lines, {} pickups, {} counted",
            report.files, report.unreadable_files, report.lines, report.pickups, report.counted
        );

        Ok(Snapshot {
            calendar_now: Self::today_at(now, CALENDAR_CUTOVER_HOUR),
            logical_day: Self::today_at(now, self.config.cutover_hour).date(),
            counts,
            files,
            report,
        })
    }

    /// ユーザ定義アイテムを読む
    pub fn load_user_items(&self) -> Result<Vec<WatchedItem>> {
        store::load(&self.config.items_file)
    }

    /// 固定アイテムにユーザ定義アイテムを続けた監視リストを作る
    ///
    /// items.csv が読めなくても集計は続けられるよう、警告を出して固定アイテムだけを返す。
    /// このときは `user_items_loaded` が false になり、呼び出し側は保存してはいけない。
    pub fn load_watch_list(&self, builtins: Vec<WatchedItem>) -> WatchList {
        let mut items = builtins;
        match self.load_user_items() {
            Ok(user_items) => {
                merge_user_items(&mut items, user_items);
                WatchList {
                    items,
                    user_items_loaded: true,
                }
            }
            Err(e) => {
                warn!("Failed to load watch list, using built-in items only: {:#}", e);
                WatchList {
                    items,
                    user_items_loaded: false,
                }
            }
        }
    }

    /// ユーザ定義アイテムを保存する
    pub fn save_user_items(&self, items: &[WatchedItem]) -> Result<SaveOutcome> {
        store::save(&self.config.items_file, items)
    }
}
