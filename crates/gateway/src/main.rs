//! # TrustScan Gateway
//!
//! スキャンパイプラインをHTTP APIとして公開するGateway。
//!
//! ## 役割
//! - 上流の認証レイヤが付与したヘッダからリクエスト元を特定
//! - アップロード画像の検証（Base64・サイズ・形式）と保存
//! - スキャンの採点と記録
//! - 事業者向けの製品登録
//!
//! ## API エンドポイント
//! - `POST /api/scan/upload` — 画像スキャン
//! - `POST /api/scan/qr` — QRスキャン
//! - `POST /api/verify/blockchain` — ブロックチェーンハッシュ照会
//! - `GET /api/scans` — スキャン履歴
//! - `GET /api/scan/{id}` — スキャン1件
//! - `POST /api/product/register` — 製品登録（事業者のみ）
//! - `GET /api/products` — 登録製品一覧（事業者のみ）
//! - `GET /healthz` — ヘルスチェック

mod auth;
mod config;
mod endpoints;
mod error;
mod storage;
mod uploads;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use trustscan_core::{RandomScorer, Scanner};

use config::{GatewayConfig, GatewayState};
use endpoints::*;

/// ルーティングを構築する。
pub fn build_router(state: Arc<GatewayState>) -> axum::Router {
    let body_limit = state.request_body_limit();
    axum::Router::new()
        .route("/api/scan/upload", post(handle_scan_upload))
        .route("/api/scan/qr", post(handle_scan_qr))
        .route("/api/verify/blockchain", post(handle_verify_blockchain))
        .route("/api/scans", get(handle_list_scans))
        .route("/api/scan/{id}", get(handle_get_scan))
        .route("/api/product/register", post(handle_register_product))
        .route("/api/products", get(handle_list_products))
        .route("/healthz", get(handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::from_env()?;
    let store = storage::open_store(&config)?;
    let scanner = Scanner::new(store, Arc::new(RandomScorer::new()));

    tracing::info!(
        backend = scanner.store().backend_name(),
        strategy = scanner.strategy_name(),
        max_upload_size = config.max_upload_size,
        upload_dir = ?config.upload_dir,
        "Gatewayを初期化しました"
    );

    let state = Arc::new(GatewayState::new(scanner, &config));
    let app = build_router(state);

    tracing::info!("Gatewayを {} で起動します", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------
