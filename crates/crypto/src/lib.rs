//! # TrustScan ハッシュ処理
//!
//! スキャン対象のフィンガープリント計算に使うハッシュ関数を提供する。
//!
//! ## アルゴリズム
//! | 用途 | アルゴリズム |
//! |------|------------|
//! | 画像フィンガープリント | SHA-256（小文字hex） |
//! | 製品登録ハッシュ | SHA-256(製品名 ‖ 登録時刻ミリ秒) |
//!
//! ソルトや呼び出しごとの乱数は使わない。同じ入力からは常に同じ値が得られる。

use sha2::{Digest, Sha256};

/// SHA-256ハッシュのバイト長。
pub const SHA256_LEN: usize = 32;

/// SHA-256のhex表現の文字数。
pub const SHA256_HEX_LEN: usize = SHA256_LEN * 2;

/// SHA-256ハッシュ計算。
pub fn sha256(data: &[u8]) -> [u8; SHA256_LEN] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; SHA256_LEN];
    hash.copy_from_slice(&result);
    hash
}

/// SHA-256ハッシュを小文字hex文字列で返す。
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// 画像なしで製品を登録する際のレジストリハッシュを計算する。
///
/// `SHA-256(name ‖ nonce_millis)`。同名製品でも登録時刻が異なれば別のハッシュになる。
pub fn registration_hash(name: &str, nonce_millis: u128) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(nonce_millis.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// 文字列がSHA-256のhex表現（64文字の16進数）かどうか。
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == SHA256_HEX_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}
