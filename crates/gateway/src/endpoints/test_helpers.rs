//! エンドポイントテスト用のヘルパー。

use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine;
use trustscan_core::{FixedScorer, MemoryStore, Scanner, SubScores};

use crate::config::{GatewayConfig, GatewayState};

/// 固定サブスコア（logo 90, texture 84, barcode 78 → Trust Score 84）
pub(crate) const FIXED_SUB_SCORES: SubScores = SubScores {
    logo: 90,
    texture: 84,
    barcode: 78,
};

/// インメモリストアと固定スコアのGatewayStateを構築する。
pub(crate) fn test_state() -> Arc<GatewayState> {
    test_state_with(None, 1024 * 1024)
}

/// 保存先と上限サイズを指定してGatewayStateを構築する。
pub(crate) fn test_state_with(upload_dir: Option<PathBuf>, max_upload_size: usize) -> Arc<GatewayState> {
    let store = Arc::new(MemoryStore::new());
    let scanner = Scanner::new(store, Arc::new(FixedScorer::new(FIXED_SUB_SCORES)));
    let mut config = GatewayConfig::from_lookup(|key| {
        (key == "STORAGE_BACKEND").then(|| "memory".to_string())
    })
    .unwrap();
    config.upload_dir = upload_dir;
    config.max_upload_size = max_upload_size;
    Arc::new(GatewayState::new(scanner, &config))
}

/// バイト列をBase64（Standard）でエンコードする。
pub(crate) fn b64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// 内容の異なるPNGシグネチャ付きバイト列を作る。
pub(crate) fn png_bytes(seed: u8) -> Vec<u8> {
    let mut bytes = crate::uploads::tests::PNG_BYTES.to_vec();
    bytes.extend_from_slice(&[seed; 16]);
    bytes
}
