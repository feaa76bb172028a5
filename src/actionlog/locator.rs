//! 集計対象のログファイルを探す
//!
//! PSO2 は日付が変わってからもしばらく前日付のファイルに追記し続けることがあるため、
//! 暦の「今日」と「昨日」の両方のファイルを候補にする。どの日の取得として
//! 数えるかはファイル単位ではなく、行ごとのタイムスタンプで判定する。

use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::day::{logical_day, CALENDAR_CUTOVER_HOUR};

const FILE_PREFIX: &str = "ActionLog";
const FILE_EXTENSION: &str = ".txt";

/// `ActionLog<YYYYMMDD>_` の部分
pub fn file_prefix_for(date: NaiveDate) -> String {
    format!("{}{}_", FILE_PREFIX, date.format("%Y%m%d"))
}

/// ファイル名が `ActionLog<YYYYMMDD>_*.txt` に一致するか
pub fn matches_date(file_name: &str, date: NaiveDate) -> bool {
    file_name.starts_with(&file_prefix_for(date)) && file_name.ends_with(FILE_EXTENSION)
}

/// 今日と昨日（暦どおり）のログファイル一覧
///
/// ディレクトリが存在しない場合は空を返す（ゲーム未起動などで普通に起こる）。
pub fn candidate_files(log_dir: &Path, now: NaiveDateTime) -> io::Result<Vec<PathBuf>> {
    let today = logical_day(now, CALENDAR_CUTOVER_HOUR);
    let yesterday = today - Duration::days(1);

    let names = match list_file_names(log_dir) {
        Ok(names) => names,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("Log directory does not exist: {}", log_dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    for date in [today, yesterday] {
        let mut matched: Vec<&String> = names
            .iter()
            .filter(|name| matches_date(name, date))
            .collect();
        matched.sort();
        files.extend(matched.into_iter().map(|name| log_dir.join(name)));
    }

    Ok(files)
}

fn list_file_names(dir: &Path) -> io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };
        if !is_file(&entry) {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            names.push(name.to_string());
        }
    }
    Ok(names)
}

/// 種別を取得できないエントリはファイルとして扱わない
fn is_file(entry: &std::fs::DirEntry) -> bool {
    match entry.file_type() {
        Ok(file_type) => file_type.is_file(),
        Err(e) => {
            debug!("Skipping {}: {}", entry.path().display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn now(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap()
    }

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), b"").unwrap();
    }

    fn file_names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn test_matches_date() {
        let date = NaiveDate::from_ymd_opt(2022, 5, 5).unwrap();
        assert!(matches_date("ActionLog20220505_00.txt", date));
        assert!(!matches_date("ActionLog20220505.txt", date));
        assert!(!matches_date("ActionLog20220505_00.log", date));
        assert!(!matches_date("ChatLog20220505_00.txt", date));
        assert!(!matches_date("ActionLog20220504_00.txt", date));
    }

    #[test]
    fn test_today_then_yesterday() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "ActionLog20220504_00.txt");
        touch(dir.path(), "ActionLog20220505_01.txt");
        touch(dir.path(), "ActionLog20220505_00.txt");
        touch(dir.path(), "ActionLog20220503_00.txt");
        touch(dir.path(), "ChatLog20220505_00.txt");

        let files = candidate_files(dir.path(), now("2022-05-05T16:14:47")).unwrap();
        assert_eq!(
            file_names(&files),
            vec![
                "ActionLog20220505_00.txt",
                "ActionLog20220505_01.txt",
                "ActionLog20220504_00.txt",
            ]
        );
    }

    #[test]
    fn test_window_uses_calendar_date_not_cutover() {
        // 2時は採取日としては前日だが、ファイル選択は暦どおり
        let dir = tempdir().unwrap();
        touch(dir.path(), "ActionLog20220503_00.txt");
        touch(dir.path(), "ActionLog20220504_00.txt");
        touch(dir.path(), "ActionLog20220505_00.txt");

        let files = candidate_files(dir.path(), now("2022-05-05T02:00:00")).unwrap();
        assert_eq!(
            file_names(&files),
            vec!["ActionLog20220505_00.txt", "ActionLog20220504_00.txt"]
        );
    }

    #[test]
    fn test_directories_are_ignored() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("ActionLog20220505_dir.txt")).unwrap();

        let files = candidate_files(dir.path(), now("2022-05-05T12:00:00")).unwrap();
        assert!(files.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_odd_entries_do_not_hide_other_files() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "ActionLog20220505_00.txt");
        std::os::unix::fs::symlink(
            dir.path().join("gone.txt"),
            dir.path().join("ActionLog20220505_01.txt"),
        )
        .unwrap();

        let files = candidate_files(dir.path(), now("2022-05-05T16:14:47")).unwrap();
        assert_eq!(file_names(&files), vec!["ActionLog20220505_00.txt"]);
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let files =
            candidate_files(&dir.path().join("log_ngs"), now("2022-05-05T12:00:00")).unwrap();
        assert!(files.is_empty());
    }
}
