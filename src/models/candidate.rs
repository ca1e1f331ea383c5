use std::fmt;

/// 单次尝试提交的候选答案
///
/// 候选一经生成即为最终字符串形式，提交层不再做任何数值加工。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate(String);

impl Candidate {
    pub fn new(text: impl Into<String>) -> Self {
        Candidate(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// 生成小数分隔符互换后的变体（`.` 与 `,` 对调）
    ///
    /// 部分平台的数值题只接受其中一种分隔符，首次提交遇到暂时性
    /// 失败时会用该变体重试一次。没有分隔符的候选返回原样。
    pub fn separator_swapped(&self) -> Candidate {
        let swapped = self
            .0
            .chars()
            .map(|c| match c {
                '.' => ',',
                ',' => '.',
                other => other,
            })
            .collect();
        Candidate(swapped)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Candidate {
    fn from(s: String) -> Self {
        Candidate(s)
    }
}

impl From<&str> for Candidate {
    fn from(s: &str) -> Self {
        Candidate(s.to_string())
    }
}

impl AsRef<str> for Candidate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_separator_swapped_dot_to_comma() {
        assert_eq!(Candidate::new("3.14").separator_swapped().as_str(), "3,14");
    }

    #[test]
    fn test_separator_swapped_comma_to_dot() {
        assert_eq!(Candidate::new("3,14").separator_swapped().as_str(), "3.14");
    }

    #[test]
    fn test_separator_swapped_without_separator() {
        // 没有分隔符时互换是恒等变换
        assert_eq!(Candidate::new("42").separator_swapped().as_str(), "42");
        assert_eq!(Candidate::new("abc").separator_swapped().as_str(), "abc");
    }
}
