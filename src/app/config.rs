use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::actionlog::{EngineConfig, DEFAULT_CUTOVER_HOUR};
use crate::items::{store::DEFAULT_ITEMS_FILE, WatchedItem};

/// PSO2 NGS のログディレクトリ（ドキュメントフォルダからの相対パス）
const NGS_LOG_SUBDIR: &str = "SEGA/PHANTASYSTARONLINE2/log_ngs";

/// 固定アイテム（読み取り専用、items.csv には保存しない）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinItem {
    pub name: String,
    #[serde(default)]
    pub quota: u32,
}

/// アプリケーション設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// ActionLog のディレクトリ
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    /// 採取日の切り替え時刻（0-23）
    #[serde(default = "default_cutover_hour")]
    pub cutover_hour: u32,
    /// ログを読み直す間隔（秒）
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// ユーザ定義アイテムのファイル
    #[serde(default = "default_items_file")]
    pub items_file: PathBuf,
    /// ログ読み込みエラーを追記するファイル
    #[serde(default = "default_error_log_file")]
    pub error_log_file: PathBuf,
    /// ログレベル
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 固定アイテム
    #[serde(default)]
    pub builtin_items: Vec<BuiltinItem>,
}

fn default_log_dir() -> PathBuf {
    let documents = directories::UserDirs::new()
        .and_then(|d| d.document_dir().map(|p| p.to_path_buf()))
        .or_else(|| directories::BaseDirs::new().map(|d| d.home_dir().join("Documents")))
        .unwrap_or_else(|| PathBuf::from("Documents"));
    documents.join(NGS_LOG_SUBDIR)
}

fn default_cutover_hour() -> u32 {
    DEFAULT_CUTOVER_HOUR
}

fn default_poll_interval() -> u64 {
    1
}

fn default_items_file() -> PathBuf {
    PathBuf::from(DEFAULT_ITEMS_FILE)
}

fn default_error_log_file() -> PathBuf {
    PathBuf::from("error.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            cutover_hour: default_cutover_hour(),
            poll_interval_secs: default_poll_interval(),
            items_file: default_items_file(),
            error_log_file: default_error_log_file(),
            log_level: default_log_level(),
            builtin_items: Vec::new(),
        }
    }
}

impl Config {
    /// 設定ファイルから読み込み（存在しない場合はデフォルトを作成して保存）
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            Self::from_toml(&content)
        } else {
            // 初回起動時はデフォルト設定をファイルに保存
            let config = Self::default();
            if let Err(e) = config.save() {
                tracing::warn!("Failed to save default config: {}", e);
            }
            Ok(config)
        }
    }

    /// TOML 文字列から読み込んで検証する
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// 設定ファイルパスを取得
    pub fn config_path() -> Result<PathBuf> {
        // ~/.config/gathering-counter/config.toml を使用
        let base_dirs = directories::BaseDirs::new()
            .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))?;
        Ok(base_dirs.home_dir().join(".config/gathering-counter/config.toml"))
    }

    /// 現在の設定をファイルに保存
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.cutover_hour > 23 {
            bail!("cutover_hour must be between 0 and 23, got {}", self.cutover_hour);
        }
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be at least 1");
        }
        Ok(())
    }

    /// 集計エンジン用の設定
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            log_dir: self.log_dir.clone(),
            cutover_hour: self.cutover_hour,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            items_file: self.items_file.clone(),
        }
    }

    /// 固定アイテムを WatchedItem として返す
    pub fn builtin_watched_items(&self) -> Vec<WatchedItem> {
        self.builtin_items
            .iter()
            .filter(|item| !item.name.trim().is_empty())
            .map(|item| WatchedItem::builtin(item.name.clone(), item.quota))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.cutover_hour, 4);
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.items_file, PathBuf::from("items.csv"));
        assert_eq!(config.error_log_file, PathBuf::from("error.log"));
        assert!(config.log_dir.ends_with("SEGA/PHANTASYSTARONLINE2/log_ngs"));
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.cutover_hour, 4);
        assert!(config.builtin_items.is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let config = Config::from_toml(
            r#"
            log_dir = "/tmp/log_ngs"
            cutover_hour = 5
            poll_interval_secs = 3

            [[builtin_items]]
            name = "アルファリアクター"
            quota = 30

            [[builtin_items]]
            name = "  "
            "#,
        )
        .unwrap();

        assert_eq!(config.log_dir, PathBuf::from("/tmp/log_ngs"));
        let engine = config.engine_config();
        assert_eq!(engine.cutover_hour, 5);
        assert_eq!(engine.poll_interval, Duration::from_secs(3));

        let builtins = config.builtin_watched_items();
        assert_eq!(builtins, vec![WatchedItem::builtin("アルファリアクター", 30)]);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_toml("cutover_hour = 24").is_err());
        assert!(Config::from_toml("poll_interval_secs = 0").is_err());
        assert!(Config::from_toml("cutover_hour = \"four\"").is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.builtin_items.push(BuiltinItem {
            name: "X".to_string(),
            quota: 2,
        });
        let content = toml::to_string_pretty(&config).unwrap();
        let parsed = Config::from_toml(&content).unwrap();
        assert_eq!(parsed.builtin_items, config.builtin_items);
        assert_eq!(parsed.log_dir, config.log_dir);
    }
}
