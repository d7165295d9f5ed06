//! # スキャン履歴
//!
//! - `GET /api/scans` — リクエスト元のスキャン一覧
//! - `GET /api/scan/{id}` — スキャン1件（本人のもののみ）

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use trustscan_types::Scan;

use crate::auth::Requester;
use crate::config::GatewayState;
use crate::error::GatewayError;

/// GET /api/scans — 作成順のスキャン一覧。
pub async fn handle_list_scans(
    State(state): State<Arc<GatewayState>>,
    requester: Requester,
) -> Result<Json<Vec<Scan>>, GatewayError> {
    let scans = state
        .store()
        .scans_by_requester(requester.id)
        .await
        .map_err(|e| GatewayError::from_store("スキャン履歴の取得に失敗しました", e))?;
    Ok(Json(scans))
}

/// GET /api/scan/{id} — スキャン1件。他ユーザーのスキャンは403。
pub async fn handle_get_scan(
    State(state): State<Arc<GatewayState>>,
    requester: Requester,
    Path(raw_id): Path<String>,
) -> Result<Json<Scan>, GatewayError> {
    let id = raw_id
        .parse::<u64>()
        .map_err(|_| GatewayError::BadRequest(format!("スキャンIDが不正です: {raw_id}")))?;

    let scan = state
        .store()
        .get_scan(id)
        .await
        .map_err(|e| GatewayError::from_store("スキャンの取得に失敗しました", e))?
        .ok_or_else(|| GatewayError::NotFound("スキャンが見つかりません".to_string()))?;

    if scan.requester_id != requester.id {
        tracing::warn!(scan_id = id, requester = %requester.id, "他ユーザーのスキャンへのアクセスを拒否");
        return Err(GatewayError::Forbidden("アクセス権がありません".to_string()));
    }
    Ok(Json(scan))
}
