//! 上限値 N の入力処理。
//!
//! 木の構築側は範囲を検証しないので、呼び出し側はここで [MIN_BOUND, MAX_BOUND]
//! に丸めてから [`build_tree`](crate::build_tree) を呼ぶ。

use crate::error::BoundError;

pub const MIN_BOUND: u64 = 4;
pub const MAX_BOUND: u64 = 100_000;
pub const DEFAULT_BOUND: u64 = 1000;

pub fn clamp_bound(n: i64) -> u64 {
    n.clamp(MIN_BOUND as i64, MAX_BOUND as i64) as u64
}

/// 先頭の空白・符号・10進数字列を読み取り、範囲に丸める。
/// 数字列の後ろの文字は無視する（"250abc" → 250）。数字が1つもなければエラー。
pub fn parse_bound(text: &str) -> Result<u64, BoundError> {
    let s = text.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let len = digits.bytes().take_while(u8::is_ascii_digit).count();
    if len == 0 {
        return Err(BoundError::Parse {
            input: text.to_string(),
        });
    }
    // i64 に収まらない桁数は上限に張り付くだけなので飽和させる
    let magnitude: i64 = digits[..len].parse().unwrap_or(i64::MAX);
    Ok(clamp_bound(if negative { -magnitude } else { magnitude }))
}

/// テキスト入力欄と、最後に適用された上限値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundInput {
    pub text: String,
    current: u64,
}

impl Default for BoundInput {
    fn default() -> Self {
        BoundInput::new(DEFAULT_BOUND)
    }
}

impl BoundInput {
    pub fn new(bound: u64) -> Self {
        let current = clamp_bound(i64::try_from(bound).unwrap_or(i64::MAX));
        BoundInput {
            text: current.to_string(),
            current,
        }
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    /// 入力欄の内容を確定する。
    /// 解析できなければ入力欄を直前の値に戻して None。
    /// 成功時は丸めた値で入力欄を書き換え、Some(値) を返す。
    pub fn apply(&mut self) -> Option<u64> {
        match parse_bound(&self.text) {
            Ok(bound) => {
                self.text = bound.to_string();
                self.current = bound;
                Some(bound)
            }
            Err(err) => {
                tracing::debug!(%err, "reverting bound input");
                self.text = self.current.to_string();
                None
            }
        }
    }
}
