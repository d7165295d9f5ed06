//! # アップロード画像の検証と保存
//!
//! Base64で送られた画像をデコードし、サイズと形式を検証する。
//! `UPLOAD_DIR` が設定されていればUUIDのファイル名で保存する。

use std::path::Path;

use base64::Engine;
use image::ImageFormat;

use crate::error::GatewayError;

/// Base64エンジン（Standard）
fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::general_purpose::STANDARD
}

/// Base64画像をデコードする。`data:image/png;base64,` 形式のプレフィックスは取り除く。
pub fn decode_image(encoded: &str, max_size: usize) -> Result<Vec<u8>, GatewayError> {
    let payload = match encoded.split_once(";base64,") {
        Some((prefix, data)) if prefix.starts_with("data:") => data,
        _ => encoded,
    };
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(GatewayError::BadRequest("画像が指定されていません".to_string()));
    }

    let bytes = b64()
        .decode(payload)
        .map_err(|e| GatewayError::BadRequest(format!("画像のBase64デコードに失敗: {e}")))?;
    if bytes.is_empty() {
        return Err(GatewayError::BadRequest("画像が空です".to_string()));
    }
    if bytes.len() > max_size {
        return Err(GatewayError::PayloadTooLarge(format!(
            "{} bytes (上限: {} bytes)",
            bytes.len(),
            max_size
        )));
    }
    Ok(bytes)
}

/// マジックバイトから画像形式を判定する。画像でなければ415。
pub fn detect_image_format(bytes: &[u8]) -> Result<ImageFormat, GatewayError> {
    image::guess_format(bytes)
        .map_err(|_| GatewayError::UnsupportedMedia("画像形式を判別できません".to_string()))
}

/// 画像を保存し、保存先のファイル名を返す。
pub async fn save_upload(
    dir: &Path,
    bytes: &[u8],
    format: ImageFormat,
) -> Result<String, GatewayError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| GatewayError::processing("アップロード画像の保存に失敗しました", e))?;

    let extension = format.extensions_str().first().copied().unwrap_or("bin");
    let file_name = format!("{}.{extension}", uuid::Uuid::new_v4());
    tokio::fs::write(dir.join(&file_name), bytes)
        .await
        .map_err(|e| GatewayError::processing("アップロード画像の保存に失敗しました", e))?;

    tracing::debug!(file = %file_name, size = bytes.len(), "アップロード画像を保存");
    Ok(file_name)
}
