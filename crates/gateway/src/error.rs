//! # Gateway エラー型
//!
//! 全エンドポイントで共通のエラー型。
//! 処理失敗の詳細はログにのみ出力し、クライアントには不透明なメッセージを返す。

use std::fmt::Display;

use axum::http::StatusCode;
use trustscan_core::{CoreError, StoreError};

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 不正なリクエスト（必須項目の欠落、Base64デコード失敗等）
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
    /// リクエスト元ユーザーを特定できない
    #[error("認証されていません: {0}")]
    Unauthorized(String),
    /// 権限がない
    #[error("{0}")]
    Forbidden(String),
    /// 対象が存在しない
    #[error("{0}")]
    NotFound(String),
    /// アップロードサイズ超過
    #[error("アップロードサイズが上限を超えています: {0}")]
    PayloadTooLarge(String),
    /// 画像以外のファイル
    #[error("画像ファイルのみ受け付けます: {0}")]
    UnsupportedMedia(String),
    /// スキャン・検索・記録の失敗（詳細はログのみ）
    #[error("{0}")]
    Processing(String),
    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
}

impl GatewayError {
    /// 処理失敗をログに記録し、クライアント向けには `context` のみを返すエラーにする。
    pub fn processing(context: &str, err: impl Display) -> Self {
        tracing::error!(error = %err, "{context}");
        GatewayError::Processing(context.to_string())
    }

    /// Coreのエラーを変換する。入力検証エラーは400、それ以外は不透明な処理失敗。
    pub fn from_core(context: &str, err: CoreError) -> Self {
        match err {
            CoreError::InvalidInput(msg) => GatewayError::BadRequest(msg),
            other => Self::processing(context, other),
        }
    }

    /// ストアのエラーを不透明な処理失敗に変換する。
    pub fn from_store(context: &str, err: StoreError) -> Self {
        Self::processing(context, err)
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            GatewayError::Forbidden(_) => StatusCode::FORBIDDEN,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::UnsupportedMedia(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            GatewayError::Processing(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, self.to_string()).into_response()
    }
}
