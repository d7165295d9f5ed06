//! # 重複判定ポリシー
//!
//! 同じフィンガープリントが別のユーザーによって既にスキャンされていれば重複とみなす。
//! 1つの物理的/デジタルな対象が複数の所有者を名乗る人の間で流通している兆候であり、
//! 偽造品の再流通と整合する。
//!
//! 自分自身が過去にスキャンしたフィンガープリントを再スキャンしても重複にはならない。

use std::collections::HashSet;

use trustscan_types::{RequesterId, Scan};

/// 履歴が空でなく、かつリクエスト元と異なるユーザーのスキャンが1件以上あれば `true`。
pub fn is_duplicate(history: &[Scan], requester: RequesterId) -> bool {
    history.iter().any(|scan| scan.requester_id != requester)
}

/// リクエスト元以外で、このフィンガープリントをスキャンしたユーザーの数。
pub fn distinct_other_requesters(history: &[Scan], requester: RequesterId) -> usize {
    history
        .iter()
        .map(|scan| scan.requester_id)
        .filter(|id| *id != requester)
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use trustscan_types::{Fingerprint, ScanChannel};

    fn scan_by(id: u64, requester: u64) -> Scan {
        Scan {
            id,
            requester_id: RequesterId(requester),
            product_name: None,
            artifact_ref: None,
            channel: ScanChannel::Qr,
            trust_score: 50,
            is_authentic: false,
            logo_score: 0,
            texture_score: 0,
            barcode_score: 50,
            registry_verified: false,
            fingerprint: Some(Fingerprint::new("tok")),
            created_at: 0,
        }
    }

    #[test]
    fn test_empty_history_is_not_duplicate() {
        assert!(!is_duplicate(&[], RequesterId(1)));
    }

    /// 自分のスキャンだけなら何度あっても重複ではない
    #[test]
    fn test_self_rescans_never_flag() {
        let history = vec![scan_by(1, 5), scan_by(2, 5), scan_by(3, 5)];
        assert!(!is_duplicate(&history, RequesterId(5)));
        assert_eq!(distinct_other_requesters(&history, RequesterId(5)), 0);
    }

    #[test]
    fn test_other_requester_flags() {
        let history = vec![scan_by(1, 9)];
        assert!(is_duplicate(&history, RequesterId(5)));
    }

    #[test]
    fn test_mixed_history_flags() {
        let history = vec![scan_by(1, 5), scan_by(2, 9), scan_by(3, 9), scan_by(4, 11)];
        assert!(is_duplicate(&history, RequesterId(5)));
        assert_eq!(distinct_other_requesters(&history, RequesterId(5)), 2);
    }
}
