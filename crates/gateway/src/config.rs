//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use trustscan_core::{ScanStore, Scanner};

/// デフォルトの待ち受けアドレス。
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
/// デフォルトのsledデータベースディレクトリ。
pub const DEFAULT_SLED_PATH: &str = "./data/trustscan";
/// デフォルトのアップロード最大サイズ（5 MiB、デコード後）。
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 5 * 1024 * 1024;

/// ストレージバックエンドの種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    /// プロセス内マップ（再起動で消える）
    Memory,
    /// sled組み込みDB
    Sled,
}

impl StorageBackendKind {
    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackendKind::Memory),
            "sled" => Ok(StorageBackendKind::Sled),
            other => anyhow::bail!("未知のSTORAGE_BACKENDです: {other}（memory または sled）"),
        }
    }

    /// フィーチャ構成に応じたデフォルト。
    fn default_kind() -> Self {
        if cfg!(feature = "backend-sled") {
            StorageBackendKind::Sled
        } else {
            StorageBackendKind::Memory
        }
    }
}

/// 起動時に読み込むGateway設定。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// 待ち受けアドレス（`BIND_ADDR`）
    pub bind_addr: String,
    /// ストレージバックエンド（`STORAGE_BACKEND`）
    pub storage_backend: StorageBackendKind,
    /// sledデータベースのディレクトリ（`SLED_PATH`）
    pub sled_path: PathBuf,
    /// アップロード画像の保存先（`UPLOAD_DIR`）。未設定なら保存しない。
    pub upload_dir: Option<PathBuf>,
    /// アップロード最大サイズ（`MAX_UPLOAD_SIZE`、バイト）
    pub max_upload_size: usize,
}

impl GatewayConfig {
    /// 環境変数から構築する。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー検索関数から構築する。
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => StorageBackendKind::parse(&value)?,
            None => StorageBackendKind::default_kind(),
        };

        let sled_path = lookup("SLED_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SLED_PATH));

        let upload_dir = lookup("UPLOAD_DIR")
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        let max_upload_size = match lookup("MAX_UPLOAD_SIZE") {
            Some(value) => value
                .trim()
                .parse::<usize>()
                .with_context(|| format!("MAX_UPLOAD_SIZEが数値ではありません: {value}"))?,
            None => DEFAULT_MAX_UPLOAD_SIZE,
        };
        if max_upload_size == 0 {
            anyhow::bail!("MAX_UPLOAD_SIZEは1以上である必要があります");
        }

        Ok(Self {
            bind_addr,
            storage_backend,
            sled_path,
            upload_dir,
            max_upload_size,
        })
    }
}

/// Gatewayの共有状態。
pub struct GatewayState {
    /// スキャンパイプライン（ストアとスコアリング戦略を保持）
    pub scanner: Scanner,
    /// アップロード画像の保存先
    pub upload_dir: Option<PathBuf>,
    /// アップロード最大サイズ（バイト、デコード後）
    pub max_upload_size: usize,
}

impl GatewayState {
    pub fn new(scanner: Scanner, config: &GatewayConfig) -> Self {
        Self {
            scanner,
            upload_dir: config.upload_dir.clone(),
            max_upload_size: config.max_upload_size,
        }
    }

    /// 製品レジストリとスキャン履歴のストア。
    pub fn store(&self) -> &Arc<dyn ScanStore> {
        self.scanner.store()
    }

    /// JSONリクエストボディの上限。Base64による膨張（4/3倍）と他フィールドの余裕を含める。
    pub fn request_body_limit(&self) -> usize {
        self.max_upload_size / 3 * 4 + 64 * 1024
    }
}
