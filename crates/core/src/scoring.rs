//! # スコア合成
//!
//! 画像経路ではロゴ・テクスチャ・バーコードの3つのサブスコアを合成し、
//! QR/ブロックチェーン経路では登録・重複の状態に応じた帯域からTrust Scoreを決める。
//!
//! 実際の推論モデルは存在せず、乱数を帯域内に制約したものがモデルの代わりとなる。
//! 乱数源は [`ScoringStrategy`] に閉じ込めてあり、重複判定・真贋判定のポリシーを
//! 変えずに実モデルへ差し替えられる。

use std::ops::Range;

use rand::Rng;

/// 画像サブスコアの抽選範囲（70以上100未満）。
pub const IMAGE_SUB_SCORE_RANGE: Range<u8> = 70..100;

/// 重複時のロゴスコア減点幅と下限。
pub const LOGO_PENALTY: u8 = 30;
pub const LOGO_FLOOR: u8 = 20;
/// 重複時のテクスチャスコア減点幅と下限。
pub const TEXTURE_PENALTY: u8 = 25;
pub const TEXTURE_FLOOR: u8 = 30;
/// 重複時のバーコードスコア減点幅と下限。
pub const BARCODE_PENALTY: u8 = 40;
pub const BARCODE_FLOOR: u8 = 10;

/// 画像解析のサブスコア。各値は0-100。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubScores {
    pub logo: u8,
    pub texture: u8,
    pub barcode: u8,
}

impl SubScores {
    pub fn new(logo: u8, texture: u8, barcode: u8) -> Self {
        Self { logo, texture, barcode }
    }

    /// 重複時の減点を適用する。各サブスコアは固定幅で減点され、下限で止まる。
    pub fn with_duplicate_penalty(self) -> Self {
        Self {
            logo: self.logo.saturating_sub(LOGO_PENALTY).max(LOGO_FLOOR),
            texture: self.texture.saturating_sub(TEXTURE_PENALTY).max(TEXTURE_FLOOR),
            barcode: self.barcode.saturating_sub(BARCODE_PENALTY).max(BARCODE_FLOOR),
        }
    }

    /// 3つのサブスコアの平均（切り捨て）。
    pub fn trust_score(&self) -> u8 {
        let sum = u16::from(self.logo) + u16::from(self.texture) + u16::from(self.barcode);
        (sum / 3) as u8
    }

    /// 最小サブスコア / 100。
    pub fn confidence_level(&self) -> f64 {
        f64::from(self.logo.min(self.texture).min(self.barcode)) / 100.0
    }
}

/// QR/ブロックチェーン経路のTrust Score帯域。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenBand {
    /// 登録済みかつ重複なし
    Authentic,
    /// 登録済みだが別ユーザーがスキャン済み
    Suspicious,
    /// レジストリに存在しない
    Unknown,
}

impl TokenBand {
    /// 登録・重複の状態から帯域を選ぶ。
    pub fn select(registered: bool, duplicate: bool) -> Self {
        match (registered, duplicate) {
            (true, false) => TokenBand::Authentic,
            (true, true) => TokenBand::Suspicious,
            (false, _) => TokenBand::Unknown,
        }
    }

    /// 帯域の閉区間 `[下限, 上限]`。
    pub fn bounds(&self) -> (u8, u8) {
        match self {
            TokenBand::Authentic => (85, 100),
            TokenBand::Suspicious => (40, 60),
            TokenBand::Unknown => (20, 50),
        }
    }

    /// 乱数抽選に使う半開区間。上限値自体は抽選されない。
    pub fn draw_range(&self) -> Range<u8> {
        let (low, high) = self.bounds();
        low..high
    }

    /// 乱数を使わない代表値。ブロックチェーンハッシュ照会で記録される。
    pub fn nominal_score(&self) -> u8 {
        match self {
            TokenBand::Authentic => 95,
            TokenBand::Suspicious => 45,
            TokenBand::Unknown => 30,
        }
    }

    pub fn contains(&self, score: u8) -> bool {
        let (low, high) = self.bounds();
        (low..=high).contains(&score)
    }
}

/// スコアリング戦略。実モデルに置き換える場合はこのトレイトを実装する。
///
/// 同時に独立して呼ばれるため、呼び出し順序に依存する共有可変状態を持たないこと。
pub trait ScoringStrategy: Send + Sync {
    /// 戦略名（ログ出力用）。
    fn name(&self) -> &str;

    /// 画像から減点前のサブスコアを算出する。
    fn image_sub_scores(&self, image: &[u8]) -> SubScores;

    /// 帯域内のTrust Scoreを算出する。
    fn token_score(&self, band: TokenBand) -> u8;
}

/// 帯域内の一様乱数でスコアを生成する戦略。
///
/// スレッドローカルの乱数生成器を使うため、並行呼び出しで状態を共有しない。
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomScorer;

impl RandomScorer {
    pub fn new() -> Self {
        Self
    }
}

impl ScoringStrategy for RandomScorer {
    fn name(&self) -> &str {
        "random"
    }

    fn image_sub_scores(&self, _image: &[u8]) -> SubScores {
        let mut rng = rand::thread_rng();
        SubScores {
            logo: rng.gen_range(IMAGE_SUB_SCORE_RANGE),
            texture: rng.gen_range(IMAGE_SUB_SCORE_RANGE),
            barcode: rng.gen_range(IMAGE_SUB_SCORE_RANGE),
        }
    }

    fn token_score(&self, band: TokenBand) -> u8 {
        rand::thread_rng().gen_range(band.draw_range())
    }
}

/// 常に同じサブスコアを返す決定論的な戦略。テストや再現確認に使う。
///
/// トークン経路では帯域の代表値を返す。
#[derive(Debug, Clone, Copy)]
pub struct FixedScorer {
    pub sub_scores: SubScores,
}

impl FixedScorer {
    pub fn new(sub_scores: SubScores) -> Self {
        Self { sub_scores }
    }
}

impl ScoringStrategy for FixedScorer {
    fn name(&self) -> &str {
        "fixed"
    }

    fn image_sub_scores(&self, _image: &[u8]) -> SubScores {
        self.sub_scores
    }

    fn token_score(&self, band: TokenBand) -> u8 {
        band.nominal_score()
    }
}
