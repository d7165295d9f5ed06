//! # TrustScan 共有型定義
//!
//! 真贋スキャンのデータモデルとHTTP APIのリクエスト/レスポンスを提供する。
//!
//! ## エンコーディング規則
//! - Fingerprint: 小文字hexのSHA-256、またはQR/ブロックチェーン経路で外部から渡されたトークン
//! - Base64 (Standard): 画像などのバイナリデータ
//! - タイムスタンプ: UNIX秒

use std::fmt;

use serde::{Deserialize, Serialize};

/// リクエスト元ユーザーIDのHTTPヘッダ名（上流の認証レイヤが付与する）。
pub const REQUESTER_ID_HEADER: &str = "x-requester-id";
/// リクエスト元ユーザー種別のHTTPヘッダ名。
pub const REQUESTER_ROLE_HEADER: &str = "x-requester-role";

// ---------------------------------------------------------------------------
// 識別子
// ---------------------------------------------------------------------------

/// スキャン対象を識別するフィンガープリント。
///
/// 画像の場合はSHA-256のhex文字列、QR/ブロックチェーンの場合は外部トークンそのもの。
/// 製品レジストリとスキャン履歴の検索キーとなる。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// 既に正規化済みの文字列からFingerprintを作る。
    /// 入力検証は `trustscan-core` 側で行う。
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// ログ出力用の短縮表記（先頭12文字）。
    pub fn short(&self) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(12)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// リクエスト元ユーザーのID。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequesterId(pub u64);

impl fmt::Display for RequesterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// リクエスト元ユーザーの種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequesterRole {
    /// 一般消費者（スキャンのみ）
    #[default]
    Consumer,
    /// 事業者（製品登録が可能）
    Business,
}

impl RequesterRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequesterRole::Consumer => "consumer",
            RequesterRole::Business => "business",
        }
    }

    /// ヘッダ値などの文字列表現からパースする。大文字小文字は区別しない。
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "consumer" => Some(RequesterRole::Consumer),
            "business" => Some(RequesterRole::Business),
            _ => None,
        }
    }
}

/// スキャン経路。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanChannel {
    /// 画像アップロード
    Image,
    /// QRコード/トークン
    Qr,
    /// ブロックチェーンハッシュの直接照会
    Blockchain,
}

impl ScanChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanChannel::Image => "image",
            ScanChannel::Qr => "qr",
            ScanChannel::Blockchain => "blockchain",
        }
    }
}

// ---------------------------------------------------------------------------
// 永続化レコード
// ---------------------------------------------------------------------------

/// 事業者が登録した製品。作成後は変更・削除されない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// 製品ID（ストアが採番）
    pub id: u64,
    /// 所有事業者のID
    pub business_id: RequesterId,
    /// 表示名
    pub name: String,
    /// 説明（任意）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// レジストリ上のフィンガープリント（一意であることが期待されるが強制しない）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    /// 登録時刻（UNIX秒）
    pub registered_at: u64,
}

/// 製品登録時にストアへ渡すフィールド。
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub business_id: RequesterId,
    pub name: String,
    pub description: Option<String>,
    pub fingerprint: Option<Fingerprint>,
}

/// 1回の検証試行の記録。作成後は変更・削除されない。
///
/// `is_authentic` は、このフィンガープリントで重複判定が成立した場合は必ず `false`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    /// スキャンID（ストアが採番）
    pub id: u64,
    /// リクエスト元ユーザー
    pub requester_id: RequesterId,
    /// 製品名（任意）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    /// 保存済みアップロードファイル名（任意）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_ref: Option<String>,
    /// スキャン経路
    pub channel: ScanChannel,
    /// 総合Trust Score (0-100)
    pub trust_score: u8,
    /// 真贋判定
    pub is_authentic: bool,
    /// ロゴ解析スコア
    pub logo_score: u8,
    /// テクスチャ解析スコア
    pub texture_score: u8,
    /// バーコード/QR検証スコア
    pub barcode_score: u8,
    /// レジストリ照合済みか（登録済みかつ重複なし）
    pub registry_verified: bool,
    /// フィンガープリント（任意）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<Fingerprint>,
    /// 作成時刻（UNIX秒）
    pub created_at: u64,
}

/// スキャン作成時にストアへ渡すフィールド。IDと作成時刻はストアが割り当てる。
#[derive(Debug, Clone, PartialEq)]
pub struct NewScan {
    pub requester_id: RequesterId,
    pub product_name: Option<String>,
    pub artifact_ref: Option<String>,
    pub channel: ScanChannel,
    pub trust_score: u8,
    pub is_authentic: bool,
    pub logo_score: u8,
    pub texture_score: u8,
    pub barcode_score: u8,
    pub registry_verified: bool,
    pub fingerprint: Option<Fingerprint>,
}

impl NewScan {
    /// 採番済みのIDと作成時刻を付与して `Scan` にする。ストア実装から使う。
    pub fn into_scan(self, id: u64, created_at: u64) -> Scan {
        Scan {
            id,
            requester_id: self.requester_id,
            product_name: self.product_name,
            artifact_ref: self.artifact_ref,
            channel: self.channel,
            trust_score: self.trust_score,
            is_authentic: self.is_authentic,
            logo_score: self.logo_score,
            texture_score: self.texture_score,
            barcode_score: self.barcode_score,
            registry_verified: self.registry_verified,
            fingerprint: self.fingerprint,
            created_at,
        }
    }
}

impl NewProduct {
    /// 採番済みのIDと登録時刻を付与して `Product` にする。
    pub fn into_product(self, id: u64, registered_at: u64) -> Product {
        Product {
            id,
            business_id: self.business_id,
            name: self.name,
            description: self.description,
            fingerprint: self.fingerprint,
            registered_at,
        }
    }
}

// ---------------------------------------------------------------------------
// POST /api/scan/upload
// ---------------------------------------------------------------------------

/// 画像スキャンリクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageScanRequest {
    /// Base64エンコードされた画像
    pub image: String,
    /// ユーザーが入力した製品名（任意）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
}

/// 画像解析の結果。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageAnalysis {
    pub trust_score: u8,
    pub is_authentic: bool,
    pub logo_score: u8,
    pub texture_score: u8,
    pub barcode_score: u8,
    /// 最小サブスコア / 100
    pub confidence_level: f64,
    /// 人間向けの解析コメント
    pub detection_details: Vec<String>,
    pub potential_duplicate: bool,
}

/// 画像スキャンレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageScanResponse {
    pub scan: Scan,
    pub analysis: ImageAnalysis,
    pub is_duplicate: bool,
    pub product: Option<Product>,
}

// ---------------------------------------------------------------------------
// POST /api/scan/qr
// ---------------------------------------------------------------------------

/// QRスキャンリクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrScanRequest {
    /// QRコードから読み取ったデータ
    #[serde(default)]
    pub qr_data: Option<String>,
}

/// QRスキャンレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrScanResponse {
    pub scan: Scan,
    pub product: Option<Product>,
    /// 登録済みかつ重複なし
    pub verified: bool,
    pub is_duplicate: bool,
}

// ---------------------------------------------------------------------------
// POST /api/verify/blockchain
// ---------------------------------------------------------------------------

/// ブロックチェーンハッシュ照会リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockchainVerifyRequest {
    #[serde(default)]
    pub hash: Option<String>,
}

/// ブロックチェーンハッシュ照会レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockchainVerifyResponse {
    pub verified: bool,
    pub product: Option<Product>,
    pub is_duplicate: bool,
    /// 重複時は過去のスキャン件数、それ以外は0
    pub duplicate_scans: usize,
}

// ---------------------------------------------------------------------------
// POST /api/product/register
// ---------------------------------------------------------------------------

/// 製品登録リクエスト。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterProductRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Base64エンコードされた製品画像（任意）。
    /// 指定時は画像のSHA-256をフィンガープリントとして登録する。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

// ---------------------------------------------------------------------------
// GET /healthz
// ---------------------------------------------------------------------------

/// ヘルスチェックレスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// 使用中のストレージバックエンド名
    pub backend: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_serializes_as_plain_string() {
        let fp = Fingerprint::new("abc123");
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, "\"abc123\"");

        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }

    #[test]
    fn test_fingerprint_short() {
        let fp = Fingerprint::new("0123456789abcdef");
        assert_eq!(fp.short(), "0123456789ab");

        let fp = Fingerprint::new("tiny");
        assert_eq!(fp.short(), "tiny");
    }

    #[test]
    fn test_channel_and_role_wire_names() {
        assert_eq!(serde_json::to_string(&ScanChannel::Blockchain).unwrap(), "\"blockchain\"");
        assert_eq!(serde_json::to_string(&RequesterRole::Business).unwrap(), "\"business\"");
        assert_eq!(RequesterRole::parse(" Business "), Some(RequesterRole::Business));
        assert_eq!(RequesterRole::parse("admin"), None);
    }

    /// 任意フィールドが省略されたリクエストもパースできることを確認
    #[test]
    fn test_optional_request_fields() {
        let req: ImageScanRequest = serde_json::from_str(r#"{"image":"AAAA"}"#).unwrap();
        assert!(req.product_name.is_none());

        let req: QrScanRequest = serde_json::from_str("{}").unwrap();
        assert!(req.qr_data.is_none());

        let req: RegisterProductRequest = serde_json::from_str(r#"{"name":"Bag"}"#).unwrap();
        assert!(req.image.is_none());
        assert!(req.description.is_none());
    }

    #[test]
    fn test_new_scan_into_scan_keeps_fields() {
        let new_scan = NewScan {
            requester_id: RequesterId(7),
            product_name: Some("Watch".into()),
            artifact_ref: None,
            channel: ScanChannel::Qr,
            trust_score: 90,
            is_authentic: true,
            logo_score: 0,
            texture_score: 0,
            barcode_score: 90,
            registry_verified: true,
            fingerprint: Some(Fingerprint::new("tok")),
        };
        let scan = new_scan.into_scan(3, 1_700_000_000);
        assert_eq!(scan.id, 3);
        assert_eq!(scan.created_at, 1_700_000_000);
        assert_eq!(scan.requester_id, RequesterId(7));
        assert_eq!(scan.barcode_score, 90);
    }
}
