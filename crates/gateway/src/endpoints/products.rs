//! # 製品レジストリ（事業者のみ）
//!
//! - `POST /api/product/register` — 製品登録
//! - `GET /api/products` — 自社の登録製品一覧

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use trustscan_types::{Fingerprint, NewProduct, Product, RegisterProductRequest};

use crate::auth::Requester;
use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::uploads::{decode_image, detect_image_format};

fn require_business(requester: &Requester) -> Result<(), GatewayError> {
    if requester.is_business() {
        Ok(())
    } else {
        Err(GatewayError::Forbidden("事業者アカウントのみ利用できます".to_string()))
    }
}

/// POST /api/product/register — 製品登録。
///
/// 画像があればその SHA-256 を、なければ製品名と登録時刻（ミリ秒）から
/// 生成したハッシュをフィンガープリントとする。
pub async fn handle_register_product(
    State(state): State<Arc<GatewayState>>,
    requester: Requester,
    Json(body): Json<RegisterProductRequest>,
) -> Result<(StatusCode, Json<Product>), GatewayError> {
    require_business(&requester)?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(GatewayError::BadRequest("製品名が指定されていません".to_string()));
    }

    let fingerprint = match body.image.as_deref().filter(|image| !image.trim().is_empty()) {
        Some(encoded) => {
            let image = decode_image(encoded, state.max_upload_size)?;
            detect_image_format(&image)?;
            trustscan_core::fingerprint_bytes(&image)
        }
        None => {
            let now_millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(|e| GatewayError::Internal(format!("時刻取得失敗: {e}")))?
                .as_millis();
            Fingerprint::new(trustscan_crypto::registration_hash(name, now_millis))
        }
    };

    let product = state
        .store()
        .create_product(NewProduct {
            business_id: requester.id,
            name: name.to_string(),
            description: body.description.filter(|d| !d.trim().is_empty()),
            fingerprint: Some(fingerprint),
        })
        .await
        .map_err(|e| GatewayError::from_store("製品の登録に失敗しました", e))?;

    tracing::info!(
        product_id = product.id,
        business = %requester.id,
        fingerprint = %product.fingerprint.as_ref().map(Fingerprint::short).unwrap_or_default(),
        "製品を登録"
    );
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/products — 自社の登録製品一覧。
pub async fn handle_list_products(
    State(state): State<Arc<GatewayState>>,
    requester: Requester,
) -> Result<Json<Vec<Product>>, GatewayError> {
    require_business(&requester)?;
    let products = state
        .store()
        .products_by_business(requester.id)
        .await
        .map_err(|e| GatewayError::from_store("製品一覧の取得に失敗しました", e))?;
    Ok(Json(products))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::test_helpers::{b64, png_bytes, test_state};
    use crate::endpoints::{handle_scan_qr, handle_scan_upload};
    use trustscan_types::{ImageScanRequest, QrScanRequest};

    fn request(name: &str, image: Option<&[u8]>) -> Json<RegisterProductRequest> {
        Json(RegisterProductRequest {
            name: name.to_string(),
            description: Some("spring collection".into()),
            image: image.map(b64),
        })
    }

    #[tokio::test]
    async fn test_consumer_cannot_register_or_list() {
        let state = test_state();
        let err = handle_register_product(State(state.clone()), Requester::consumer(1), request("X", None))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));

        let err = handle_list_products(State(state), Requester::consumer(1))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_empty_name_is_bad_request() {
        let state = test_state();
        let err = handle_register_product(State(state), Requester::business(9), request("  ", None))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::BadRequest(_)));
    }

    /// 画像なしの登録はハッシュを生成し、そのハッシュのQRで照合できる
    #[tokio::test]
    async fn test_register_without_image_then_scan_qr() {
        let state = test_state();
        let (status, Json(product)) =
            handle_register_product(State(state.clone()), Requester::business(9), request("Handbag", None))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(product.business_id.0, 9);
        let fingerprint = product.fingerprint.clone().unwrap();
        assert!(trustscan_crypto::is_sha256_hex(fingerprint.as_str()));

        let scan = handle_scan_qr(
            State(state),
            Requester::consumer(1),
            Json(QrScanRequest {
                qr_data: Some(fingerprint.as_str().to_string()),
            }),
        )
        .await
        .unwrap()
        .0;
        assert!(scan.verified);
        assert_eq!(scan.product, Some(product));
    }

    /// 画像付きの登録は画像のSHA-256を使い、同じ画像のスキャンで照合される
    #[tokio::test]
    async fn test_register_with_image_then_scan_image() {
        let state = test_state();
        let image = png_bytes(7);
        let (_, Json(product)) = handle_register_product(
            State(state.clone()),
            Requester::business(9),
            request("Sunglasses", Some(image.as_slice())),
        )
        .await
        .unwrap();
        assert_eq!(
            product.fingerprint.as_ref().map(Fingerprint::as_str),
            Some(trustscan_crypto::sha256_hex(&image).as_str())
        );

        let response = handle_scan_upload(
            State(state),
            Requester::consumer(1),
            Json(ImageScanRequest {
                image: b64(&image),
                product_name: None,
            }),
        )
        .await
        .unwrap()
        .0;
        assert!(response.scan.registry_verified);
        assert_eq!(response.scan.product_name.as_deref(), Some("Sunglasses"));
    }

    #[tokio::test]
    async fn test_list_own_products() {
        let state = test_state();
        for (business, name) in [(9, "A"), (8, "B"), (9, "C")] {
            handle_register_product(State(state.clone()), Requester::business(business), request(name, None))
                .await
                .unwrap();
        }
        let names: Vec<String> = handle_list_products(State(state), Requester::business(9))
            .await
            .unwrap()
            .0
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["A", "C"]);
    }
}
