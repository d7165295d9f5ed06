//! # スキャンストア
//!
//! 製品レジストリとスキャン履歴の永続化を抽象化するインターフェース。
//! バックエンドは起動時に選択する。
//!
//! 現在のバックエンド実装:
//! - `memory` — テスト・開発用（プロセス内のマップ）
//! - `sled` — 本番用の組み込みDB（`trustscan-gateway` の `backend-sled` フィーチャ）

pub mod memory;

pub use memory::MemoryStore;

use std::time::{SystemTime, UNIX_EPOCH};

use trustscan_types::{Fingerprint, NewProduct, NewScan, Product, RequesterId, Scan};

/// ストア操作のエラー型。
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// バックエンドの読み書きに失敗
    #[error("ストレージバックエンドのエラー: {0}")]
    Backend(String),
    /// レコードのシリアライズ/デシリアライズに失敗
    #[error("レコードの変換に失敗: {0}")]
    Serialization(String),
}

/// 製品レジストリとスキャン履歴のストア。
///
/// スコアリングパイプラインは `find_product_by_fingerprint` と
/// `find_scans_by_fingerprint` のみを読み、結果の記録は呼び出し側が
/// `create_scan` で行う。
#[async_trait::async_trait]
pub trait ScanStore: Send + Sync {
    /// バックエンド名（ログ・ヘルスチェック用）。
    fn backend_name(&self) -> &str;

    /// フィンガープリントに一致する製品を返す。
    /// 複数存在する場合は最初に登録された（IDが最小の）製品を返す。
    async fn find_product_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Option<Product>, StoreError>;

    /// フィンガープリントに一致する全スキャンを返す。順序は規定しない。
    async fn find_scans_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
    ) -> Result<Vec<Scan>, StoreError>;

    /// スキャンを記録する。IDと作成時刻はストアが割り当てる。
    async fn create_scan(&self, scan: NewScan) -> Result<Scan, StoreError>;

    /// IDでスキャンを取得する。
    async fn get_scan(&self, id: u64) -> Result<Option<Scan>, StoreError>;

    /// ユーザーのスキャン履歴を作成順に返す。
    async fn scans_by_requester(&self, requester: RequesterId) -> Result<Vec<Scan>, StoreError>;

    /// 製品を登録する。IDと登録時刻はストアが割り当てる。
    async fn create_product(&self, product: NewProduct) -> Result<Product, StoreError>;

    /// 事業者が登録した製品を登録順に返す。
    async fn products_by_business(
        &self,
        business: RequesterId,
    ) -> Result<Vec<Product>, StoreError>;
}

/// 現在時刻のUNIX秒。
pub fn now_unix_secs() -> Result<u64, StoreError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| StoreError::Backend(format!("時刻取得失敗: {e}")))
}
