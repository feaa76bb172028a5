use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::events::AppEvent;
use crate::actionlog::{Counter, PollError};

/// 定期的にログを集計し、結果を `AppEvent::CountsUpdated` で送る
///
/// - 集計対象の名前は `names_rx` の最新値を毎回読む
/// - `refresh_rx` を受けると周期を待たずに集計する
/// - 集計が遅れた周期は捨てる（重ねて実行しない）
///
/// `tx` の受信側が閉じると終了する。
pub fn spawn_poller(
    counter: Arc<Counter>,
    mut names_rx: watch::Receiver<Vec<String>>,
    mut refresh_rx: mpsc::Receiver<()>,
    tx: mpsc::Sender<AppEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let poll_interval = counter.config().poll_interval;
        tracing::info!(
            "Poller started (interval: {}s, dir: {:?})",
            poll_interval.as_secs(),
            counter.config().log_dir
        );

        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut refresh_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                received = refresh_rx.recv(), if refresh_open => {
                    if received.is_none() {
                        refresh_open = false;
                        continue;
                    }
                }
            }

            let names = names_rx.borrow_and_update().clone();
            let worker = Arc::clone(&counter);
            let result = tokio::task::spawn_blocking(move || worker.counts(&names)).await;

            let snapshot = match result {
                Ok(Ok(snapshot)) => snapshot,
                Ok(Err(PollError::Busy)) => {
                    tracing::debug!("Previous poll still running, skipped");
                    continue;
                }
                Err(e) => {
                    tracing::error!("Poll task failed: {}", e);
                    continue;
                }
            };

            if tx.send(AppEvent::CountsUpdated(snapshot)).await.is_err() {
                break;
            }
        }

        tracing::info!("Poller stopped");
    })
}
