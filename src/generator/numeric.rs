//! 数值候选生成 - 生成层
//!
//! 按 start → end 以 step 递进产出候选。第 i 个候选恒等于
//! start + i·step（公共 scale 下的整数运算），与迭代历史无关，
//! 因此可以从任意下标恢复。

use crate::models::candidate::Candidate;
use crate::models::space::SpecError;

use super::decimal::Decimal;

/// 数值序列生成器
#[derive(Debug, Clone)]
pub struct NumericGenerator {
    start_mantissa: i128,
    step_mantissa: i128,
    scale: u32,
    precision: u32,
    count: u64,
    index: u64,
}

impl NumericGenerator {
    pub fn new(start: &str, end: &str, step: &str, precision: u32) -> Result<Self, SpecError> {
        Self::resume(start, end, step, precision, 0)
    }

    /// 从指定下标恢复（下标 0 即 start 本身）
    pub fn resume(
        start: &str,
        end: &str,
        step: &str,
        precision: u32,
        index: u64,
    ) -> Result<Self, SpecError> {
        let start = Decimal::parse(start)?;
        let end = Decimal::parse(end)?;
        let step = Decimal::parse(step)?;
        if step.is_zero() {
            return Err(SpecError::ZeroStep);
        }

        // 对齐到三者的最大 scale，之后全部是整数运算
        let scale = start.scale().max(end.scale()).max(step.scale());
        let start_mantissa = start.rescaled(scale)?.mantissa();
        let end_mantissa = end.rescaled(scale)?.mantissa();
        let step_mantissa = step.rescaled(scale)?.mantissa();

        let span = end_mantissa - start_mantissa;
        let count = if (step_mantissa > 0 && span < 0) || (step_mantissa < 0 && span > 0) {
            // 方向背离：序列为空
            0
        } else {
            // 同号相除向零截断，结果正是最后一个不越过 end 的下标
            let steps = (span / step_mantissa).unsigned_abs();
            u64::try_from(steps)
                .ok()
                .and_then(|s| s.checked_add(1))
                .ok_or(SpecError::TooLarge)?
        };

        Ok(NumericGenerator {
            start_mantissa,
            step_mantissa,
            scale,
            precision,
            count,
            index,
        })
    }

    /// 序列总长度
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 下一个待产出候选的下标
    pub fn position(&self) -> u64 {
        self.index
    }

    fn value_at(&self, index: u64) -> Decimal {
        // count 已约束 index，start + i·step 不会越过 end，也就不会溢出
        let offset = (index as i128) * self.step_mantissa;
        Decimal::from_parts(self.start_mantissa + offset, self.scale)
    }
}

impl Iterator for NumericGenerator {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        if self.index >= self.count {
            return None;
        }
        let value = self.value_at(self.index);
        self.index += 1;
        Some(Candidate::new(
            value.round_half_up(self.precision).to_string(),
        ))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.count.saturating_sub(self.index)) {
            Ok(remaining) => (remaining, Some(remaining)),
            Err(_) => (usize::MAX, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(start: &str, end: &str, step: &str, precision: u32) -> Vec<String> {
        NumericGenerator::new(start, end, step, precision)
            .unwrap()
            .map(|c| c.into_string())
            .collect()
    }

    #[test]
    fn test_ascending_integers() {
        assert_eq!(collect("1", "5", "1", 0), vec!["1", "2", "3", "4", "5"]);
    }

    #[test]
    fn test_fractional_step() {
        assert_eq!(collect("0", "1", "0.5", 1), vec!["0", "0.5", "1"]);
    }

    #[test]
    fn test_descending() {
        assert_eq!(collect("5", "1", "-1", 0), vec!["5", "4", "3", "2", "1"]);
    }

    #[test]
    fn test_zero_step_rejected() {
        assert_eq!(
            NumericGenerator::new("1", "5", "0", 0).err(),
            Some(SpecError::ZeroStep)
        );
        assert_eq!(
            NumericGenerator::new("1", "5", "0.0", 0).err(),
            Some(SpecError::ZeroStep)
        );
    }

    #[test]
    fn test_direction_mismatch_is_empty() {
        assert!(collect("5", "1", "1", 0).is_empty());
        assert!(collect("1", "5", "-1", 0).is_empty());
    }

    #[test]
    fn test_end_not_overshot() {
        // 1.9 + 0.3 越过 2，序列在 1.9 截止
        assert_eq!(collect("1", "2", "0.3", 1), vec!["1", "1.3", "1.6", "1.9"]);
    }

    #[test]
    fn test_single_element_when_bounds_equal() {
        assert_eq!(collect("3", "3", "1", 0), vec!["3"]);
        assert_eq!(collect("3", "3", "-1", 0), vec!["3"]);
    }

    #[test]
    fn test_tenth_step_lands_exactly_on_end() {
        // 0.1 在二进制浮点下不可精确表示，这里必须精确走满 11 个值
        let values = collect("0", "1", "0.1", 1);
        assert_eq!(values.len(), 11);
        assert_eq!(values.first().map(String::as_str), Some("0"));
        assert_eq!(values.last().map(String::as_str), Some("1"));
    }

    #[test]
    fn test_precision_rounds_render_only() {
        // 内部递进保持 0.25 步长，渲染时才按 precision=1 取整
        assert_eq!(
            collect("0", "1", "0.25", 1),
            vec!["0", "0.3", "0.5", "0.8", "1"]
        );
    }

    #[test]
    fn test_negative_range() {
        assert_eq!(collect("-2", "2", "1", 0), vec!["-2", "-1", "0", "1", "2"]);
    }

    #[test]
    fn test_resume_from_index() {
        let resumed: Vec<String> = NumericGenerator::resume("1", "5", "1", 0, 2)
            .unwrap()
            .map(|c| c.into_string())
            .collect();
        assert_eq!(resumed, vec!["3", "4", "5"]);

        // 恢复点越过末尾时直接耗尽
        let done: Vec<String> = NumericGenerator::resume("1", "5", "1", 0, 9)
            .unwrap()
            .map(|c| c.into_string())
            .collect();
        assert!(done.is_empty());
    }

    #[test]
    fn test_count_and_size_hint() {
        let mut generator = NumericGenerator::new("0", "1", "0.5", 1).unwrap();
        assert_eq!(NumericGenerator::count(&generator), 3);
        assert_eq!(generator.position(), 0);
        assert_eq!(generator.size_hint(), (3, Some(3)));

        generator.next();
        assert_eq!(generator.position(), 1);
        assert_eq!(generator.size_hint(), (2, Some(2)));
    }
}
