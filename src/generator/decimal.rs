//! 定点十进制数 - 生成层
//!
//! 数值候选从解析、递进到渲染全程停留在十进制定点表示里，
//! 不经过二进制浮点，步长累加不会产生 0.30000000000000004 一类的漂移。

use std::fmt;

use crate::models::space::SpecError;

/// 整数位数上限（不含前导零）
const MAX_DIGITS: usize = 20;
/// 小数位数上限
const MAX_SCALE: u32 = 12;

/// 定点十进制数：数值 = mantissa / 10^scale
///
/// 位数上限保证任意两个已解析数对齐到公共 scale 后，加减与
/// 索引乘法都不会越过 i128 范围。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal {
    mantissa: i128,
    scale: u32,
}

impl Decimal {
    pub fn from_parts(mantissa: i128, scale: u32) -> Self {
        Decimal { mantissa, scale }
    }

    /// 解析十进制字符串（如 `-12`、`0.5`、`.25`、`3.`）
    ///
    /// 不接受指数记法与千位分隔符。
    pub fn parse(text: &str) -> Result<Self, SpecError> {
        let trimmed = text.trim();
        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        if body.is_empty() {
            return Err(SpecError::BadNumber(text.to_string()));
        }

        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(SpecError::BadNumber(text.to_string()));
        }
        if !int_part.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(SpecError::BadNumber(text.to_string()));
        }

        let scale = frac_part.len() as u32;
        if scale > MAX_SCALE {
            return Err(SpecError::OutOfRange(text.to_string()));
        }
        let joined = format!("{}{}", int_part, frac_part);
        if joined.trim_start_matches('0').len() > MAX_DIGITS {
            return Err(SpecError::OutOfRange(text.to_string()));
        }
        let mantissa: i128 = joined
            .parse()
            .map_err(|_| SpecError::BadNumber(text.to_string()))?;

        Ok(Decimal {
            mantissa: if negative { -mantissa } else { mantissa },
            scale,
        })
    }

    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    /// 换算到更大的 scale（数值不变）
    pub fn rescaled(&self, scale: u32) -> Result<Self, SpecError> {
        if scale < self.scale {
            return Err(SpecError::OutOfRange(self.to_string()));
        }
        let factor = 10i128
            .checked_pow(scale - self.scale)
            .ok_or(SpecError::TooLarge)?;
        let mantissa = self
            .mantissa
            .checked_mul(factor)
            .ok_or(SpecError::TooLarge)?;
        Ok(Decimal { mantissa, scale })
    }

    /// 四舍五入到指定小数位（0.5 远离零进位）
    pub fn round_half_up(&self, precision: u32) -> Self {
        if self.scale <= precision {
            return *self;
        }
        let drop = self.scale - precision;
        let factor = 10u128.pow(drop);
        let abs = self.mantissa.unsigned_abs();
        let mut quotient = abs / factor;
        if (abs % factor) * 2 >= factor {
            quotient += 1;
        }
        let mantissa = quotient as i128;
        Decimal {
            mantissa: if self.mantissa < 0 { -mantissa } else { mantissa },
            scale: precision,
        }
    }
}

impl fmt::Display for Decimal {
    /// 渲染为最短形式：去掉尾随零，再去掉孤立小数点
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.mantissa.unsigned_abs().to_string();
        let rendered = if self.scale == 0 {
            abs
        } else {
            let scale = self.scale as usize;
            let padded = if abs.len() <= scale {
                format!("{}{}", "0".repeat(scale + 1 - abs.len()), abs)
            } else {
                abs
            };
            let (int_part, frac_part) = padded.split_at(padded.len() - scale);
            let frac_part = frac_part.trim_end_matches('0');
            if frac_part.is_empty() {
                int_part.to_string()
            } else {
                format!("{}.{}", int_part, frac_part)
            }
        };
        if self.mantissa < 0 && rendered != "0" {
            write!(f, "-{}", rendered)
        } else {
            write!(f, "{}", rendered)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(text: &str) -> Decimal {
        Decimal::parse(text).unwrap()
    }

    #[test]
    fn test_parse_basic_forms() {
        assert_eq!(parsed("5"), Decimal::from_parts(5, 0));
        assert_eq!(parsed("0.5"), Decimal::from_parts(5, 1));
        assert_eq!(parsed("-12.25"), Decimal::from_parts(-1225, 2));
        assert_eq!(parsed(".5"), Decimal::from_parts(5, 1));
        assert_eq!(parsed("3."), Decimal::from_parts(3, 0));
        assert_eq!(parsed("+7"), Decimal::from_parts(7, 0));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "-", "abc", "1.2.3", "1e5", "1,5", "--1"] {
            assert!(Decimal::parse(bad).is_err(), "应当拒绝 {:?}", bad);
        }
    }

    #[test]
    fn test_parse_rejects_oversized() {
        // 21 位整数
        assert_eq!(
            Decimal::parse("123456789012345678901"),
            Err(SpecError::OutOfRange("123456789012345678901".to_string()))
        );
        // 13 位小数
        assert!(Decimal::parse("0.1234567890123").is_err());
    }

    #[test]
    fn test_display_strips_trailing_zeros() {
        assert_eq!(Decimal::from_parts(2500, 3).to_string(), "2.5");
        assert_eq!(Decimal::from_parts(50, 1).to_string(), "5");
        assert_eq!(Decimal::from_parts(5, 0).to_string(), "5");
        assert_eq!(Decimal::from_parts(0, 2).to_string(), "0");
        assert_eq!(Decimal::from_parts(-5, 1).to_string(), "-0.5");
        assert_eq!(Decimal::from_parts(105, 2).to_string(), "1.05");
    }

    #[test]
    fn test_round_half_up() {
        // 3.14159 → 3.14
        assert_eq!(parsed("3.14159").round_half_up(2).to_string(), "3.14");
        // 2.500 → 2.5
        assert_eq!(parsed("2.500").round_half_up(2).to_string(), "2.5");
        // 0.5 远离零进位
        assert_eq!(parsed("0.25").round_half_up(1).to_string(), "0.3");
        assert_eq!(parsed("-0.25").round_half_up(1).to_string(), "-0.3");
        assert_eq!(parsed("2.5").round_half_up(0).to_string(), "3");
        // 精度不低于 scale 时原样返回
        assert_eq!(parsed("1.2").round_half_up(4).to_string(), "1.2");
    }

    #[test]
    fn test_rescaled_keeps_value() {
        let half = parsed("0.5").rescaled(3).unwrap();
        assert_eq!(half, Decimal::from_parts(500, 3));
        assert_eq!(half.to_string(), "0.5");
    }
}
