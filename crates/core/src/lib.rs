//! # TrustScan Core
//!
//! スキャンのスコアリングと重複検知のパイプラインを実装する。
//!
//! ## 処理フロー
//! 1. スキャン対象（画像バイト列またはトークン）からフィンガープリントを計算する
//! 2. 製品レジストリとスキャン履歴を並行に検索する
//! 3. 別ユーザーによる過去スキャンの有無から重複を判定する
//! 4. スコアリング戦略でサブスコアとTrust Scoreを合成する（重複時は減点）
//! 5. 判定ポリシーで真贋と解析コメントを決定する
//!
//! パイプライン自体は読み取りのみを行い、結果の永続化は呼び出し側が
//! [`ScanStore::create_scan`] で行う。

pub mod duplicate;
pub mod fingerprint;
pub mod scanner;
pub mod scoring;
pub mod store;
pub mod verdict;

pub use duplicate::is_duplicate;
pub use fingerprint::{fingerprint_bytes, fingerprint_token};
pub use scanner::{ImageScanOutcome, Scanner, TokenScanOutcome};
pub use scoring::{FixedScorer, RandomScorer, ScoringStrategy, SubScores, TokenBand};
pub use store::{MemoryStore, ScanStore, StoreError};

/// 製品名が不明な場合の表示名。
pub const UNKNOWN_PRODUCT_NAME: &str = "Unknown Product";

/// Coreモジュールのエラー型
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// 入力検証エラー（スキャン対象やトークンが空など）。スコアリング前に拒否される。
    #[error("入力が不正です: {0}")]
    InvalidInput(String),
    /// スコアリング中の想定外の失敗
    #[error("スキャン処理に失敗しました: {0}")]
    Processing(String),
    /// レジストリ・履歴の検索失敗
    #[error("ストア操作に失敗しました: {0}")]
    Store(#[from] StoreError),
}
