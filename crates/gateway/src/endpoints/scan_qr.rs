//! # POST /api/scan/qr
//!
//! QRスキャン。デコード済みのQR文字列をそのままフィンガープリントとして照合する。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use trustscan_types::{QrScanRequest, QrScanResponse};

use crate::auth::Requester;
use crate::config::GatewayState;
use crate::error::GatewayError;

/// POST /api/scan/qr — QRスキャン。QRスキャンは常に記録する。
pub async fn handle_scan_qr(
    State(state): State<Arc<GatewayState>>,
    requester: Requester,
    Json(body): Json<QrScanRequest>,
) -> Result<Json<QrScanResponse>, GatewayError> {
    let qr_data = body
        .qr_data
        .as_deref()
        .map(str::trim)
        .filter(|data| !data.is_empty())
        .ok_or_else(|| GatewayError::BadRequest("QRデータが指定されていません".to_string()))?;

    let outcome = state
        .scanner
        .score_token_scan(qr_data, requester.id)
        .await
        .map_err(|e| GatewayError::from_core("QRスキャンの処理に失敗しました", e))?;

    let scan = state
        .store()
        .create_scan(outcome.into_new_scan(requester.id))
        .await
        .map_err(|e| GatewayError::from_store("スキャンの記録に失敗しました", e))?;

    Ok(Json(QrScanResponse {
        scan,
        verified: outcome.is_authentic,
        is_duplicate: outcome.duplicate,
        product: outcome.product,
    }))
}
