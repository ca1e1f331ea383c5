use phf::phf_map;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 字符集预设表
///
/// 任务里的 `alphabet` 字段既可以是预设名，也可以是字面字符集。
static ALPHABET_PRESETS: phf::Map<&'static str, &'static str> = phf_map! {
    "digits" => "0123456789",
    "lower" => "abcdefghijklmnopqrstuvwxyz",
    "upper" => "ABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "letters" => "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ",
    "alnum" => "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789",
    "symbols" => "!@#$%^&*()_+-=[]{}|;:,.<>?",
};

/// 展开字符集预设，未命中预设时原样返回
pub fn resolve_alphabet(value: &str) -> &str {
    ALPHABET_PRESETS.get(value).copied().unwrap_or(value)
}

/// 候选空间定义错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("步长不能为 0")]
    ZeroStep,
    #[error("无法解析数值: {0}")]
    BadNumber(String),
    #[error("数值超出可处理范围: {0}")]
    OutOfRange(String),
    #[error("字符集不能为空")]
    EmptyAlphabet,
    #[error("长度范围无效: {min}..={max}")]
    BadLengthRange { min: usize, max: usize },
    #[error("候选空间过大")]
    TooLarge,
}

/// 候选答案空间
///
/// 数值边界与步长以十进制字符串表达，解析后全程用定点十进制运算，
/// 不经过二进制浮点。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateSpace {
    /// 数值序列：从 start 按 step 递进，不越过 end
    Numeric {
        start: String,
        end: String,
        step: String,
        /// 渲染时保留的小数位数（四舍五入，0.5 进位）
        #[serde(default)]
        precision: u32,
    },
    /// 文本枚举：字符集上长度 min_length..=max_length 的全组合
    Textual {
        alphabet: String,
        min_length: usize,
        max_length: usize,
    },
}

impl CandidateSpace {
    pub fn numeric(
        start: impl Into<String>,
        end: impl Into<String>,
        step: impl Into<String>,
        precision: u32,
    ) -> Self {
        CandidateSpace::Numeric {
            start: start.into(),
            end: end.into(),
            step: step.into(),
            precision,
        }
    }

    pub fn textual(alphabet: impl Into<String>, min_length: usize, max_length: usize) -> Self {
        CandidateSpace::Textual {
            alphabet: alphabet.into(),
            min_length,
            max_length,
        }
    }

    /// 对应的题目类型标签（结果记录用）
    pub fn question_type(&self) -> &'static str {
        match self {
            CandidateSpace::Numeric { .. } => "number",
            CandidateSpace::Textual { .. } => "string",
        }
    }
}
