//! 候选生成 - 生成层
//!
//! ## 职责
//! - 把候选空间定义展开成确定性的候选序列
//! - 数值空间走定点十进制递进，文本空间走字典序枚举
//! - 构造即校验：非法空间在会话开始前就报错

pub mod decimal;
pub mod numeric;
pub mod textual;

pub use numeric::NumericGenerator;
pub use textual::TextualGenerator;

use crate::models::candidate::Candidate;
use crate::models::space::{resolve_alphabet, CandidateSpace, SpecError};

/// 两类候选空间的统一生成器
#[derive(Debug, Clone)]
pub enum CandidateGenerator {
    Numeric(NumericGenerator),
    Textual(TextualGenerator),
}

impl CandidateGenerator {
    /// 构造生成器；构造成功即代表空间定义合法
    pub fn new(space: &CandidateSpace) -> Result<Self, SpecError> {
        Self::resume(space, 0)
    }

    /// 从指定下标恢复
    pub fn resume(space: &CandidateSpace, index: u64) -> Result<Self, SpecError> {
        match space {
            CandidateSpace::Numeric {
                start,
                end,
                step,
                precision,
            } => Ok(CandidateGenerator::Numeric(NumericGenerator::resume(
                start, end, step, *precision, index,
            )?)),
            CandidateSpace::Textual {
                alphabet,
                min_length,
                max_length,
            } => Ok(CandidateGenerator::Textual(TextualGenerator::resume(
                resolve_alphabet(alphabet),
                *min_length,
                *max_length,
                index,
            )?)),
        }
    }

    /// 候选总数
    pub fn count(&self) -> u128 {
        match self {
            CandidateGenerator::Numeric(g) => g.count() as u128,
            CandidateGenerator::Textual(g) => g.count(),
        }
    }

    /// 下一个待产出候选的下标，可直接用作恢复点
    pub fn position(&self) -> u128 {
        match self {
            CandidateGenerator::Numeric(g) => g.position() as u128,
            CandidateGenerator::Textual(g) => g.position(),
        }
    }
}

impl Iterator for CandidateGenerator {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        match self {
            CandidateGenerator::Numeric(g) => g.next(),
            CandidateGenerator::Textual(g) => g.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            CandidateGenerator::Numeric(g) => g.size_hint(),
            CandidateGenerator::Textual(g) => g.size_hint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_space_through_facade() {
        let space = CandidateSpace::numeric("1", "3", "1", 0);
        let generator = CandidateGenerator::new(&space).unwrap();
        assert_eq!(CandidateGenerator::count(&generator), 3);
        let values: Vec<String> = generator.map(|c| c.into_string()).collect();
        assert_eq!(values, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_textual_space_resolves_preset() {
        let space = CandidateSpace::textual("digits", 1, 1);
        let generator = CandidateGenerator::new(&space).unwrap();
        assert_eq!(CandidateGenerator::count(&generator), 10);
        let values: Vec<String> = generator.map(|c| c.into_string()).collect();
        assert_eq!(values.first().map(String::as_str), Some("0"));
        assert_eq!(values.last().map(String::as_str), Some("9"));
    }

    #[test]
    fn test_invalid_space_fails_at_construction() {
        let space = CandidateSpace::numeric("1", "5", "0", 0);
        assert_eq!(CandidateGenerator::new(&space).err(), Some(SpecError::ZeroStep));

        let space = CandidateSpace::textual("", 1, 2);
        assert_eq!(
            CandidateGenerator::new(&space).err(),
            Some(SpecError::EmptyAlphabet)
        );
    }

    #[test]
    fn test_resume_through_facade() {
        let space = CandidateSpace::numeric("0", "1", "0.5", 1);
        let values: Vec<String> = CandidateGenerator::resume(&space, 1)
            .unwrap()
            .map(|c| c.into_string())
            .collect();
        assert_eq!(values, vec!["0.5", "1"]);
    }

    #[test]
    fn test_position_is_a_valid_resume_point() {
        let space = CandidateSpace::textual("ab", 1, 2);
        let mut paused = CandidateGenerator::new(&space).unwrap();
        paused.next();
        paused.next();
        paused.next();
        assert_eq!(paused.position(), 3);

        // 从暂停点恢复的序列必须与剩余序列完全一致
        let resumed: Vec<String> = CandidateGenerator::resume(&space, paused.position() as u64)
            .unwrap()
            .map(|c| c.into_string())
            .collect();
        let remainder: Vec<String> = paused.map(|c| c.into_string()).collect();
        assert_eq!(resumed, remainder);
        assert_eq!(resumed.first().map(String::as_str), Some("ab"));
    }
}
