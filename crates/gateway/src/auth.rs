//! # リクエスト元ユーザーの特定
//!
//! セッション管理・パスワード認証は上流の認証レイヤが担い、Gatewayは
//! 認証レイヤが付与したヘッダからリクエスト元を読み取る。
//!
//! - `x-requester-id`: ユーザーID（必須、10進数）
//! - `x-requester-role`: `consumer`（省略時）または `business`

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
pub use trustscan_types::{REQUESTER_ID_HEADER, REQUESTER_ROLE_HEADER};
use trustscan_types::{RequesterId, RequesterRole};

use crate::error::GatewayError;

/// 認証済みのリクエスト元。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Requester {
    pub id: RequesterId,
    pub role: RequesterRole,
}

#[cfg(test)]
impl Requester {
    pub fn consumer(id: u64) -> Self {
        Self {
            id: RequesterId(id),
            role: RequesterRole::Consumer,
        }
    }

    pub fn business(id: u64) -> Self {
        Self {
            id: RequesterId(id),
            role: RequesterRole::Business,
        }
    }
}

impl Requester {
    pub fn is_business(&self) -> bool {
        self.role == RequesterRole::Business
    }

    /// ヘッダからリクエスト元を読み取る。
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, GatewayError> {
        let raw_id = headers
            .get(REQUESTER_ID_HEADER)
            .ok_or_else(|| GatewayError::Unauthorized(format!("{REQUESTER_ID_HEADER}がありません")))?
            .to_str()
            .map_err(|_| GatewayError::Unauthorized(format!("{REQUESTER_ID_HEADER}が不正です")))?;
        let id = raw_id
            .trim()
            .parse::<u64>()
            .map_err(|_| GatewayError::Unauthorized(format!("{REQUESTER_ID_HEADER}が不正です: {raw_id}")))?;

        let role = match headers.get(REQUESTER_ROLE_HEADER) {
            None => RequesterRole::default(),
            Some(value) => value
                .to_str()
                .ok()
                .and_then(RequesterRole::parse)
                .ok_or_else(|| {
                    GatewayError::Unauthorized(format!("{REQUESTER_ROLE_HEADER}が不正です"))
                })?,
        };

        Ok(Self {
            id: RequesterId(id),
            role,
        })
    }
}

impl<S> FromRequestParts<S> for Requester
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers)
    }
}
