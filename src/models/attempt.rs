use chrono::{DateTime, Local};
use uuid::Uuid;

use super::candidate::Candidate;

/// 单次提交的判定结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 平台确认答案正确
    Correct,
    /// 提交成功但未确认正确
    Incorrect,
    /// 提交本身未完成（超时、元素缺失等），重试后仍失败
    TransientError,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Correct => "correct",
            AttemptOutcome::Incorrect => "incorrect",
            AttemptOutcome::TransientError => "transient_error",
        }
    }
}

/// 一次尝试的完整记录
#[derive(Debug, Clone)]
pub struct AttemptResult {
    pub candidate: Candidate,
    pub outcome: AttemptOutcome,
    pub timestamp: DateTime<Local>,
}

impl AttemptResult {
    pub fn now(candidate: Candidate, outcome: AttemptOutcome) -> Self {
        AttemptResult {
            candidate,
            outcome,
            timestamp: Local::now(),
        }
    }
}

/// 会话以失败终止时所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureStage {
    Login,
    Navigation,
    Submit,
    Verify,
}

impl FailureStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStage::Login => "login",
            FailureStage::Navigation => "navigation",
            FailureStage::Submit => "submit",
            FailureStage::Verify => "verify",
        }
    }
}

/// 会话终态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// 找到正确答案
    Succeeded(Candidate),
    /// 候选空间耗尽仍未命中
    Exhausted,
    /// 被用户取消
    Cancelled,
    /// 某个阶段致命失败
    Failed(FailureStage),
}

impl SessionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionOutcome::Succeeded(_) => "succeeded",
            SessionOutcome::Exhausted => "exhausted",
            SessionOutcome::Cancelled => "cancelled",
            SessionOutcome::Failed(_) => "failed",
        }
    }

    pub fn answer(&self) -> Option<&str> {
        match self {
            SessionOutcome::Succeeded(candidate) => Some(candidate.as_str()),
            _ => None,
        }
    }
}

/// 一次会话的完整汇报
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub url: String,
    pub question_type: &'static str,
    pub outcome: SessionOutcome,
    /// 每个已消费候选一条记录，与消费顺序一致
    pub attempts: Vec<AttemptResult>,
    /// 已消费的候选数量
    pub tried: usize,
    /// 候选空间总大小
    pub total: u128,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
}

impl SessionReport {
    pub fn answer(&self) -> Option<&str> {
        self.outcome.answer()
    }

    pub fn elapsed_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }
}
