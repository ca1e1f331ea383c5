//! 文本候选生成 - 生成层
//!
//! 在给定字符集上枚举长度 min..=max 的全组合。全局下标先按长度分块
//! （短在前），块内按字典序（最左位变化最慢）。与数值生成器一样，
//! 候选只由下标决定，可从任意位置恢复。

use crate::models::candidate::Candidate;
use crate::models::space::SpecError;

/// 文本枚举生成器
#[derive(Debug, Clone)]
pub struct TextualGenerator {
    alphabet: Vec<char>,
    min_length: usize,
    /// 各长度块的大小，依次对应 min_length..=max_length
    blocks: Vec<u128>,
    count: u128,
    index: u128,
}

impl TextualGenerator {
    pub fn new(alphabet: &str, min_length: usize, max_length: usize) -> Result<Self, SpecError> {
        Self::resume(alphabet, min_length, max_length, 0)
    }

    /// 从全局下标恢复（下标 0 即最短块的第一个组合）
    pub fn resume(
        alphabet: &str,
        min_length: usize,
        max_length: usize,
        index: u64,
    ) -> Result<Self, SpecError> {
        let alphabet: Vec<char> = alphabet.chars().collect();
        if alphabet.is_empty() {
            return Err(SpecError::EmptyAlphabet);
        }
        if min_length < 1 || min_length > max_length {
            return Err(SpecError::BadLengthRange {
                min: min_length,
                max: max_length,
            });
        }

        let base = alphabet.len() as u128;
        let mut blocks = Vec::with_capacity(max_length - min_length + 1);
        let mut count: u128 = 0;
        for length in min_length..=max_length {
            let exp = u32::try_from(length).map_err(|_| SpecError::TooLarge)?;
            let block = base.checked_pow(exp).ok_or(SpecError::TooLarge)?;
            count = count.checked_add(block).ok_or(SpecError::TooLarge)?;
            blocks.push(block);
        }

        Ok(TextualGenerator {
            alphabet,
            min_length,
            blocks,
            count,
            index: index as u128,
        })
    }

    /// 组合总数
    pub fn count(&self) -> u128 {
        self.count
    }

    /// 下一个待产出候选的全局下标
    pub fn position(&self) -> u128 {
        self.index
    }

    fn value_at(&self, global: u128) -> Option<String> {
        let mut offset = global;
        for (i, &block) in self.blocks.iter().enumerate() {
            if offset < block {
                return Some(self.render(offset, self.min_length + i));
            }
            offset -= block;
        }
        None
    }

    /// 块内下标 → 固定长度字符串：最右位变化最快
    fn render(&self, mut offset: u128, length: usize) -> String {
        let base = self.alphabet.len() as u128;
        let mut reversed = Vec::with_capacity(length);
        for _ in 0..length {
            reversed.push(self.alphabet[(offset % base) as usize]);
            offset /= base;
        }
        reversed.iter().rev().collect()
    }
}

impl Iterator for TextualGenerator {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        if self.index >= self.count {
            return None;
        }
        let text = self.value_at(self.index)?;
        self.index += 1;
        Some(Candidate::new(text))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.count.saturating_sub(self.index)) {
            Ok(remaining) => (remaining, Some(remaining)),
            Err(_) => (usize::MAX, None),
        }
    }
}
