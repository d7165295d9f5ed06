//! # POST /api/verify/blockchain
//!
//! 製品ハッシュの照会。ハッシュらしい入力か登録済み製品の場合のみスキャンを記録する。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use trustscan_types::{BlockchainVerifyRequest, BlockchainVerifyResponse};

use crate::auth::Requester;
use crate::config::GatewayState;
use crate::error::GatewayError;

/// POST /api/verify/blockchain — ハッシュ照会。
pub async fn handle_verify_blockchain(
    State(state): State<Arc<GatewayState>>,
    requester: Requester,
    Json(body): Json<BlockchainVerifyRequest>,
) -> Result<Json<BlockchainVerifyResponse>, GatewayError> {
    let hash = body
        .hash
        .as_deref()
        .map(str::trim)
        .filter(|hash| !hash.is_empty())
        .ok_or_else(|| GatewayError::BadRequest("ハッシュが指定されていません".to_string()))?;

    let outcome = state
        .scanner
        .lookup_blockchain_hash(hash, requester.id)
        .await
        .map_err(|e| GatewayError::from_core("ハッシュ照会に失敗しました", e))?;

    if outcome.should_record() {
        state
            .store()
            .create_scan(outcome.into_new_scan(requester.id))
            .await
            .map_err(|e| GatewayError::from_store("スキャンの記録に失敗しました", e))?;
    } else {
        tracing::debug!(hash_len = hash.len(), "ハッシュ形式でない未登録の入力のため記録しません");
    }

    Ok(Json(BlockchainVerifyResponse {
        verified: outcome.is_authentic,
        is_duplicate: outcome.duplicate,
        duplicate_scans: outcome.duplicate_scans(),
        product: outcome.product,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::test_helpers::test_state;
    use trustscan_types::{Fingerprint, NewProduct, RequesterId, ScanChannel};

    fn request(hash: &str) -> Json<BlockchainVerifyRequest> {
        Json(BlockchainVerifyRequest {
            hash: Some(hash.to_string()),
        })
    }

    fn long_hash() -> String {
        trustscan_crypto::sha256_hex(b"blockchain entry")
    }

    /// 短い未登録ハッシュは記録しない
    #[tokio::test]
    async fn test_short_unknown_hash_not_recorded() {
        let state = test_state();
        let response = handle_verify_blockchain(State(state.clone()), Requester::consumer(1), request("abc"))
            .await
            .unwrap()
            .0;
        assert!(!response.verified);
        assert!(response.product.is_none());
        assert_eq!(response.duplicate_scans, 0);
        assert!(state
            .store()
            .scans_by_requester(RequesterId(1))
            .await
            .unwrap()
            .is_empty());
    }

    /// 32文字以上の未登録ハッシュは記録する
    #[tokio::test]
    async fn test_long_unknown_hash_recorded() {
        let state = test_state();
        let response =
            handle_verify_blockchain(State(state.clone()), Requester::consumer(1), request(&long_hash()))
                .await
                .unwrap()
                .0;
        assert!(!response.verified);
        let scans = state.store().scans_by_requester(RequesterId(1)).await.unwrap();
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].channel, ScanChannel::Blockchain);
        assert_eq!(scans[0].trust_score, 30);
        assert_eq!(scans[0].barcode_score, 0);
    }

    /// 登録済みの短いハッシュは記録され、重複時は過去件数を返す
    #[tokio::test]
    async fn test_registered_hash_and_duplicate_count() {
        let state = test_state();
        state
            .store()
            .create_product(NewProduct {
                business_id: RequesterId(100),
                name: "Perfume".into(),
                description: None,
                fingerprint: Some(Fingerprint::new("short-hash")),
            })
            .await
            .unwrap();

        let first = handle_verify_blockchain(State(state.clone()), Requester::consumer(1), request("short-hash"))
            .await
            .unwrap()
            .0;
        assert!(first.verified);
        assert!(!first.is_duplicate);
        assert_eq!(first.duplicate_scans, 0);

        let second = handle_verify_blockchain(State(state.clone()), Requester::consumer(2), request("short-hash"))
            .await
            .unwrap()
            .0;
        assert!(!second.verified);
        assert!(second.is_duplicate);
        assert_eq!(second.duplicate_scans, 1);

        let recorded = state.store().scans_by_requester(RequesterId(2)).await.unwrap();
        assert_eq!(recorded[0].trust_score, 45);
    }

    #[tokio::test]
    async fn test_missing_hash_is_bad_request() {
        let state = test_state();
        let err = handle_verify_blockchain(
            State(state),
            Requester::consumer(1),
            Json(BlockchainVerifyRequest { hash: None }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, GatewayError::BadRequest(_)));
    }
}
