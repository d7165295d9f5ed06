//! # POST /api/scan/upload
//!
//! 画像スキャン。アップロードされた画像を採点し、スキャンを記録する。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use trustscan_types::{ImageScanRequest, ImageScanResponse};

use crate::auth::Requester;
use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::uploads::{decode_image, detect_image_format, save_upload};

/// POST /api/scan/upload — 画像スキャン。
///
/// 画像の検証（Base64・サイズ・形式）はスコアリング前に行い、
/// 失敗した場合はスキャンを記録しない。
pub async fn handle_scan_upload(
    State(state): State<Arc<GatewayState>>,
    requester: Requester,
    Json(body): Json<ImageScanRequest>,
) -> Result<Json<ImageScanResponse>, GatewayError> {
    let image = decode_image(&body.image, state.max_upload_size)?;
    let format = detect_image_format(&image)?;

    let outcome = state
        .scanner
        .score_image_scan(&image, requester.id)
        .await
        .map_err(|e| GatewayError::from_core("画像スキャンの処理に失敗しました", e))?;

    let artifact_ref = match &state.upload_dir {
        Some(dir) => Some(save_upload(dir, &image, format).await?),
        None => None,
    };

    let scan = state
        .store()
        .create_scan(outcome.into_new_scan(requester.id, body.product_name, artifact_ref))
        .await
        .map_err(|e| GatewayError::from_store("スキャンの記録に失敗しました", e))?;

    tracing::info!(
        scan_id = scan.id,
        requester = %requester.id,
        trust_score = scan.trust_score,
        "画像スキャンを記録"
    );

    Ok(Json(ImageScanResponse {
        scan,
        analysis: outcome.analysis(),
        is_duplicate: outcome.duplicate,
        product: outcome.product,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::test_helpers::{b64, png_bytes, test_state, test_state_with};
    use trustscan_types::{NewProduct, RequesterId};

    fn request(image: &[u8], product_name: Option<&str>) -> Json<ImageScanRequest> {
        Json(ImageScanRequest {
            image: b64(image),
            product_name: product_name.map(str::to_string),
        })
    }

    /// 未登録・初回の画像スキャン
    #[tokio::test]
    async fn test_first_scan_is_authentic_and_recorded() {
        let state = test_state();
        let response = handle_scan_upload(
            State(state.clone()),
            Requester::consumer(1),
            request(&png_bytes(1), Some("Sneaker X")),
        )
        .await
        .unwrap()
        .0;

        assert!(!response.is_duplicate);
        assert!(response.product.is_none());
        assert_eq!(response.analysis.trust_score, 84);
        assert!(response.analysis.is_authentic);
        assert_eq!(response.analysis.detection_details.len(), 3);
        assert_eq!(response.scan.product_name.as_deref(), Some("Sneaker X"));
        assert!(!response.scan.registry_verified);
        assert!(response.scan.artifact_ref.is_none());

        let stored = state.store().get_scan(response.scan.id).await.unwrap();
        assert_eq!(stored, Some(response.scan));
    }

    /// 別ユーザーが同じ画像をスキャンすると重複として減点される
    #[tokio::test]
    async fn test_duplicate_by_other_requester_is_penalized() {
        let state = test_state();
        let image = png_bytes(2);
        handle_scan_upload(State(state.clone()), Requester::consumer(1), request(&image, None))
            .await
            .unwrap();

        let response =
            handle_scan_upload(State(state.clone()), Requester::consumer(2), request(&image, None))
                .await
                .unwrap()
                .0;

        assert!(response.is_duplicate);
        assert!(response.analysis.potential_duplicate);
        assert!(!response.analysis.is_authentic);
        assert_eq!(
            (response.scan.logo_score, response.scan.texture_score, response.scan.barcode_score),
            (60, 59, 38)
        );
        assert_eq!(response.analysis.trust_score, 52);
        assert_eq!(response.analysis.detection_details.len(), 5);
    }

    /// 同じユーザーの再スキャンは重複ではない
    #[tokio::test]
    async fn test_rescan_by_same_requester_is_not_duplicate() {
        let state = test_state();
        let image = png_bytes(3);
        for _ in 0..2 {
            let response =
                handle_scan_upload(State(state.clone()), Requester::consumer(5), request(&image, None))
                    .await
                    .unwrap()
                    .0;
            assert!(!response.is_duplicate);
            assert_eq!(response.scan.product_name.as_deref(), Some("Unknown Product"));
        }
    }

    /// 登録済み製品の画像は製品名を引き継ぎ、レジストリ照合済みになる
    #[tokio::test]
    async fn test_registered_product_image() {
        let state = test_state();
        let image = png_bytes(4);
        state
            .store()
            .create_product(NewProduct {
                business_id: RequesterId(100),
                name: "Registered Bag".into(),
                description: None,
                fingerprint: Some(trustscan_core::fingerprint_bytes(&image)),
            })
            .await
            .unwrap();

        let response =
            handle_scan_upload(State(state.clone()), Requester::consumer(1), request(&image, None))
                .await
                .unwrap()
                .0;
        assert_eq!(response.product.unwrap().name, "Registered Bag");
        assert_eq!(response.scan.product_name.as_deref(), Some("Registered Bag"));
        assert!(response.scan.registry_verified);
    }

    #[tokio::test]
    async fn test_rejects_invalid_uploads_without_recording() {
        let state = test_state_with(None, 64);

        let cases = [
            (Json(ImageScanRequest { image: "***".into(), product_name: None }), 400),
            (request(&[0u8; 65], None), 413),
            (request(b"plain text, not an image", None), 415),
        ];
        for (body, expected) in cases {
            let err = handle_scan_upload(State(state.clone()), Requester::consumer(1), body)
                .await
                .unwrap_err();
            let status = axum::response::IntoResponse::into_response(err).status();
            assert_eq!(status.as_u16(), expected);
        }
        assert!(state
            .store()
            .scans_by_requester(RequesterId(1))
            .await
            .unwrap()
            .is_empty());
    }

    /// UPLOAD_DIR設定時は画像を保存し、ファイル名をスキャンに記録する
    #[tokio::test]
    async fn test_saves_upload_when_dir_configured() {
        let dir = std::env::temp_dir().join(format!("trustscan-scan-{}", uuid::Uuid::new_v4()));
        let state = test_state_with(Some(dir.clone()), 1024);
        let image = png_bytes(6);

        let response =
            handle_scan_upload(State(state), Requester::consumer(1), request(&image, None))
                .await
                .unwrap()
                .0;
        let file_name = response.scan.artifact_ref.unwrap();
        assert_eq!(std::fs::read(dir.join(file_name)).unwrap(), image);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
