//! # Gatewayエンドポイント
//!
//! - `POST /api/scan/upload` — 画像スキャン
//! - `POST /api/scan/qr` — QRスキャン
//! - `POST /api/verify/blockchain` — ブロックチェーンハッシュ照会
//! - `GET /api/scans`, `GET /api/scan/{id}` — スキャン履歴
//! - `POST /api/product/register`, `GET /api/products` — 製品レジストリ（事業者のみ）
//! - `GET /healthz` — ヘルスチェック

pub mod health;
pub mod products;
pub mod scan_qr;
pub mod scan_upload;
pub mod scans;
pub mod verify_blockchain;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use health::handle_health;
pub use products::{handle_list_products, handle_register_product};
pub use scan_qr::handle_scan_qr;
pub use scan_upload::handle_scan_upload;
pub use scans::{handle_get_scan, handle_list_scans};
pub use verify_blockchain::handle_verify_blockchain;
