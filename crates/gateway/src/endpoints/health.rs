//! # GET /healthz
//!
//! ヘルスチェック。使用中のストレージバックエンド名を返す。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use trustscan_types::HealthResponse;

use crate::config::GatewayState;

/// GET /healthz — ヘルスチェック。
pub async fn handle_health(State(state): State<Arc<GatewayState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        backend: state.store().backend_name().to_string(),
    })
}
