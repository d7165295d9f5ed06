//! # ストレージバックエンド
//!
//! 起動時の設定に従って [`ScanStore`] の実装を選択する。
//! sled実装は `sled_store` サブモジュールを参照。

#[cfg(feature = "backend-sled")]
pub mod sled_store;

#[cfg(feature = "backend-sled")]
pub use sled_store::SledStore;

use std::sync::Arc;

use trustscan_core::{MemoryStore, ScanStore};

use crate::config::{GatewayConfig, StorageBackendKind};

/// 設定に従ってストアを開く。
pub fn open_store(config: &GatewayConfig) -> anyhow::Result<Arc<dyn ScanStore>> {
    match config.storage_backend {
        StorageBackendKind::Memory => {
            tracing::warn!("インメモリストアで起動します。再起動するとデータは失われます");
            Ok(Arc::new(MemoryStore::new()))
        }
        #[cfg(feature = "backend-sled")]
        StorageBackendKind::Sled => {
            tracing::info!(path = %config.sled_path.display(), "sledストアを開きます");
            Ok(Arc::new(SledStore::open(&config.sled_path)?))
        }
        #[cfg(not(feature = "backend-sled"))]
        StorageBackendKind::Sled => {
            anyhow::bail!("sledバックエンドは無効です（backend-sledフィーチャを有効にしてビルドしてください）")
        }
    }
}
