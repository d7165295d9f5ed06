//! # フィンガープリント計算
//!
//! 画像バイト列はSHA-256で、QR/ブロックチェーンのトークンはそのまま
//! フィンガープリントとして扱う。

use trustscan_types::Fingerprint;

use crate::CoreError;

/// バイト列からフィンガープリントを計算する。
///
/// 空のバイト列も受け付ける（空入力のSHA-256になる）。
pub fn fingerprint_bytes(bytes: &[u8]) -> Fingerprint {
    Fingerprint::new(trustscan_crypto::sha256_hex(bytes))
}

/// 外部から渡されたトークンをフィンガープリントとして受け取る。
///
/// 前後の空白は除去する。空のトークンは入力検証エラー。
pub fn fingerprint_token(token: &str) -> Result<Fingerprint, CoreError> {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidInput("トークンが空です".to_string()));
    }
    Ok(Fingerprint::new(trimmed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_bytes_deterministic() {
        let image = b"\x89PNG\r\n\x1a\nfake-image-body";
        let a = fingerprint_bytes(image);
        let b = fingerprint_bytes(image);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_fingerprint_bytes_distinguishes_content() {
        assert_ne!(fingerprint_bytes(b"one"), fingerprint_bytes(b"two"));
    }

    #[test]
    fn test_fingerprint_empty_bytes() {
        let fp = fingerprint_bytes(&[]);
        assert_eq!(
            fp.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_fingerprint_token_verbatim() {
        let fp = fingerprint_token("  PRODUCT-TOKEN-42\n").unwrap();
        assert_eq!(fp.as_str(), "PRODUCT-TOKEN-42");
    }

    #[test]
    fn test_fingerprint_token_empty_rejected() {
        for token in ["", "   ", "\n\t"] {
            match fingerprint_token(token) {
                Err(CoreError::InvalidInput(_)) => {} // 期待通り
                other => panic!("予期しない結果: {other:?}"),
            }
        }
    }
}
