/// 上限値 N に関するエラー。
///
/// 木の構築そのものは全域関数なので、失敗するのは入力の上限値が不正な場合のみ。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoundError {
    #[error("bound must be positive")]
    NonPositive,

    /// trunk_max (N を超える最小の2の冪) が u64 に収まらない
    #[error("bound {max} is too large: trunk ceiling does not fit in u64")]
    TooLarge { max: u64 },

    #[error("cannot parse bound from {input:?}")]
    Parse { input: String },
}

/// レイアウト定数の検証エラー
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutConfigError {
    #[error("horizontal spacing must be positive and finite, got {0}")]
    Spacing(f64),

    #[error("vertical scale must be positive and finite, got {0}")]
    VerticalScale(f64),

    #[error("diagonal ratio must lie in (0, 1), got {0}")]
    DiagonalRatio(f64),
}
