//! # スキャンパイプライン
//!
//! フィンガープリント計算 → レジストリ/履歴検索 → 重複判定 → スコア合成 → 真贋判定
//! を1リクエスト内で完結させる。
//!
//! [`Scanner`] は読み取りのみを行う。結果は `into_new_scan` で [`NewScan`] に変換し、
//! 呼び出し側が永続化する。途中で失敗した場合はスキャンは記録されない。

use std::sync::Arc;

use trustscan_types::{
    Fingerprint, ImageAnalysis, NewScan, Product, RequesterId, Scan, ScanChannel,
};

use crate::duplicate::{distinct_other_requesters, is_duplicate};
use crate::fingerprint::{fingerprint_bytes, fingerprint_token};
use crate::scoring::{ScoringStrategy, SubScores, TokenBand};
use crate::store::ScanStore;
use crate::verdict;
use crate::{CoreError, UNKNOWN_PRODUCT_NAME};

/// ブロックチェーンハッシュ照会で、未登録でもスキャンを記録するハッシュ長の下限。
pub const MIN_RECORDED_HASH_LEN: usize = 32;

/// レジストリと履歴の検索結果。
struct Lookup {
    product: Option<Product>,
    history: Vec<Scan>,
    duplicate: bool,
}

/// 画像スキャンの結果。
#[derive(Debug, Clone)]
pub struct ImageScanOutcome {
    pub fingerprint: Fingerprint,
    pub product: Option<Product>,
    /// 減点適用後のサブスコア
    pub sub_scores: SubScores,
    pub trust_score: u8,
    pub is_authentic: bool,
    pub confidence_level: f64,
    pub explanations: Vec<String>,
    pub duplicate: bool,
}

impl ImageScanOutcome {
    pub fn registry_verified(&self) -> bool {
        verdict::registry_verified(self.product.is_some(), self.duplicate)
    }

    /// レスポンス用の解析結果に変換する。
    pub fn analysis(&self) -> ImageAnalysis {
        ImageAnalysis {
            trust_score: self.trust_score,
            is_authentic: self.is_authentic,
            logo_score: self.sub_scores.logo,
            texture_score: self.sub_scores.texture,
            barcode_score: self.sub_scores.barcode,
            confidence_level: self.confidence_level,
            detection_details: self.explanations.clone(),
            potential_duplicate: self.duplicate,
        }
    }

    /// 記録用のスキャンに変換する。
    ///
    /// 製品名はユーザー入力 → 登録製品名 → "Unknown Product" の順に決める。
    pub fn into_new_scan(
        &self,
        requester: RequesterId,
        product_name: Option<String>,
        artifact_ref: Option<String>,
    ) -> NewScan {
        let product_name = product_name
            .filter(|name| !name.trim().is_empty())
            .or_else(|| self.product.as_ref().map(|p| p.name.clone()))
            .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string());

        NewScan {
            requester_id: requester,
            product_name: Some(product_name),
            artifact_ref,
            channel: ScanChannel::Image,
            trust_score: self.trust_score,
            is_authentic: self.is_authentic,
            logo_score: self.sub_scores.logo,
            texture_score: self.sub_scores.texture,
            barcode_score: self.sub_scores.barcode,
            registry_verified: self.registry_verified(),
            fingerprint: Some(self.fingerprint.clone()),
        }
    }
}

/// QR/ブロックチェーンハッシュスキャンの結果。
#[derive(Debug, Clone)]
pub struct TokenScanOutcome {
    pub channel: ScanChannel,
    pub fingerprint: Fingerprint,
    pub band: TokenBand,
    pub trust_score: u8,
    pub is_authentic: bool,
    pub duplicate: bool,
    pub product: Option<Product>,
    /// このフィンガープリントの過去スキャン件数
    pub prior_scans: usize,
}

impl TokenScanOutcome {
    pub fn registry_verified(&self) -> bool {
        verdict::registry_verified(self.product.is_some(), self.duplicate)
    }

    /// 記録すべきかどうか。
    ///
    /// QRは常に記録する。ブロックチェーンハッシュ照会は、製品が見つかったか
    /// ハッシュらしい長さ（32文字以上）の場合のみ記録する。
    pub fn should_record(&self) -> bool {
        match self.channel {
            ScanChannel::Blockchain => {
                self.product.is_some() || self.fingerprint.as_str().len() >= MIN_RECORDED_HASH_LEN
            }
            _ => true,
        }
    }

    /// 重複時は過去スキャン件数、それ以外は0。
    pub fn duplicate_scans(&self) -> usize {
        if self.duplicate {
            self.prior_scans
        } else {
            0
        }
    }

    /// 記録用のスキャンに変換する。ロゴ/テクスチャは常に0。
    /// QRではバーコードスコアにTrust Scoreを入れる。
    pub fn into_new_scan(&self, requester: RequesterId) -> NewScan {
        let barcode_score = match self.channel {
            ScanChannel::Qr => self.trust_score,
            _ => 0,
        };
        NewScan {
            requester_id: requester,
            product_name: Some(
                self.product
                    .as_ref()
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string()),
            ),
            artifact_ref: None,
            channel: self.channel,
            trust_score: self.trust_score,
            is_authentic: self.is_authentic,
            logo_score: 0,
            texture_score: 0,
            barcode_score,
            registry_verified: self.registry_verified(),
            fingerprint: Some(self.fingerprint.clone()),
        }
    }
}

/// スキャンパイプライン。
///
/// ストアとスコアリング戦略を明示的に受け取り、リクエストハンドラへ注入して使う。
pub struct Scanner {
    store: Arc<dyn ScanStore>,
    strategy: Arc<dyn ScoringStrategy>,
}

impl Scanner {
    pub fn new(store: Arc<dyn ScanStore>, strategy: Arc<dyn ScoringStrategy>) -> Self {
        Self { store, strategy }
    }

    pub fn store(&self) -> &Arc<dyn ScanStore> {
        &self.store
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// レジストリと履歴を並行に検索し、重複判定を行う。
    async fn lookup(
        &self,
        fingerprint: &Fingerprint,
        requester: RequesterId,
    ) -> Result<Lookup, CoreError> {
        let (product, history) = tokio::try_join!(
            self.store.find_product_by_fingerprint(fingerprint),
            self.store.find_scans_by_fingerprint(fingerprint),
        )?;

        let duplicate = is_duplicate(&history, requester);
        tracing::debug!(
            fingerprint = %fingerprint.short(),
            registered = product.is_some(),
            prior_scans = history.len(),
            duplicate,
            "レジストリ・履歴検索完了"
        );
        if duplicate {
            tracing::warn!(
                fingerprint = %fingerprint.short(),
                %requester,
                other_requesters = distinct_other_requesters(&history, requester),
                "別ユーザーによるスキャン済みのフィンガープリントを検出"
            );
        }

        Ok(Lookup {
            product,
            history,
            duplicate,
        })
    }

    /// 画像スキャンのスコアを算出する。
    pub async fn score_image_scan(
        &self,
        image: &[u8],
        requester: RequesterId,
    ) -> Result<ImageScanOutcome, CoreError> {
        if image.is_empty() {
            return Err(CoreError::InvalidInput("画像が空です".to_string()));
        }

        let fingerprint = fingerprint_bytes(image);
        let lookup = self.lookup(&fingerprint, requester).await?;

        let drawn = self.strategy.image_sub_scores(image);
        let sub_scores = if lookup.duplicate {
            drawn.with_duplicate_penalty()
        } else {
            drawn
        };

        let trust_score = sub_scores.trust_score();
        let is_authentic = verdict::image_verdict(trust_score, lookup.duplicate);

        tracing::info!(
            fingerprint = %fingerprint.short(),
            channel = ScanChannel::Image.as_str(),
            trust_score,
            is_authentic,
            duplicate = lookup.duplicate,
            "画像スキャンを採点"
        );

        Ok(ImageScanOutcome {
            fingerprint,
            product: lookup.product,
            sub_scores,
            trust_score,
            is_authentic,
            confidence_level: sub_scores.confidence_level(),
            explanations: verdict::explanations(&sub_scores, lookup.duplicate),
            duplicate: lookup.duplicate,
        })
    }

    /// QRトークンのスコアを算出する。Trust Scoreは帯域内でスコアリング戦略が決める。
    pub async fn score_token_scan(
        &self,
        token: &str,
        requester: RequesterId,
    ) -> Result<TokenScanOutcome, CoreError> {
        let fingerprint = fingerprint_token(token)?;
        let lookup = self.lookup(&fingerprint, requester).await?;
        let band = TokenBand::select(lookup.product.is_some(), lookup.duplicate);
        let trust_score = self.strategy.token_score(band);
        Ok(self.token_outcome(ScanChannel::Qr, fingerprint, lookup, band, trust_score))
    }

    /// ブロックチェーンハッシュを照会する。Trust Scoreは帯域の代表値。
    pub async fn lookup_blockchain_hash(
        &self,
        hash: &str,
        requester: RequesterId,
    ) -> Result<TokenScanOutcome, CoreError> {
        let fingerprint = fingerprint_token(hash)?;
        let lookup = self.lookup(&fingerprint, requester).await?;
        let band = TokenBand::select(lookup.product.is_some(), lookup.duplicate);
        let trust_score = band.nominal_score();
        Ok(self.token_outcome(ScanChannel::Blockchain, fingerprint, lookup, band, trust_score))
    }

    fn token_outcome(
        &self,
        channel: ScanChannel,
        fingerprint: Fingerprint,
        lookup: Lookup,
        band: TokenBand,
        trust_score: u8,
    ) -> TokenScanOutcome {
        let is_authentic = verdict::token_verdict(lookup.product.is_some(), lookup.duplicate);
        tracing::info!(
            fingerprint = %fingerprint.short(),
            channel = channel.as_str(),
            band = ?band,
            trust_score,
            is_authentic,
            duplicate = lookup.duplicate,
            "トークンスキャンを採点"
        );
        TokenScanOutcome {
            channel,
            fingerprint,
            band,
            trust_score,
            is_authentic,
            duplicate: lookup.duplicate,
            product: lookup.product,
            prior_scans: lookup.history.len(),
        }
    }
}
