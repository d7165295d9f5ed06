//! # 真贋判定ポリシー
//!
//! Trust Scoreと登録・重複フラグから真贋を決め、人間向けの解析コメントを生成する。

use crate::scoring::SubScores;

/// 画像経路で真正とみなすTrust Scoreの下限。
pub const AUTHENTIC_THRESHOLD: u8 = 80;

/// 重複時に解析コメントの末尾へ追加する警告。
pub const DUPLICATE_WARNINGS: [&str; 2] = [
    "WARNING: Product hash matches a previously scanned item",
    "This may indicate a counterfeit or unauthorized replica",
];

/// 画像経路の真贋判定。重複時はスコアに関わらず `false`。
pub fn image_verdict(trust_score: u8, duplicate: bool) -> bool {
    trust_score >= AUTHENTIC_THRESHOLD && !duplicate
}

/// QR/ブロックチェーン経路の真贋判定。
///
/// 数値のTrust Scoreは参照せず、登録済みかつ重複なしで真正とする。
pub fn token_verdict(registered: bool, duplicate: bool) -> bool {
    registered && !duplicate
}

/// レジストリ照合済みフラグ。全経路共通。
pub fn registry_verified(registered: bool, duplicate: bool) -> bool {
    registered && !duplicate
}

/// サブスコアを定性的なコメントに変換する。
pub fn analysis_comment(score: u8) -> &'static str {
    match score {
        95..=u8::MAX => "Perfect match to authentic sample",
        90..=94 => "High confidence authentic match",
        85..=89 => "Good match to authentic patterns",
        80..=84 => "Acceptable match",
        70..=79 => "Some inconsistencies detected",
        _ => "Significant differences from authentic sample",
    }
}

/// サブスコアごとの解析コメントを生成する。重複時は警告2行を追加する。
pub fn explanations(sub_scores: &SubScores, duplicate: bool) -> Vec<String> {
    let mut details = vec![
        format!("Logo analysis: {}", analysis_comment(sub_scores.logo)),
        format!("Texture analysis: {}", analysis_comment(sub_scores.texture)),
        format!("Barcode/QR validation: {}", analysis_comment(sub_scores.barcode)),
    ];
    if duplicate {
        details.extend(DUPLICATE_WARNINGS.iter().map(|w| w.to_string()));
    }
    details
}
