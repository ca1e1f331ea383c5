//! 会话上下文
//!
//! 封装"这一场会话在哪道题上、以什么节奏跑"这一信息

use std::fmt::Display;
use std::time::Duration;

use uuid::Uuid;

/// 会话上下文
///
/// 包含执行单场答题会话所需的所有上下文信息
#[derive(Debug, Clone)]
pub struct SessionCtx {
    /// 会话ID
    pub session_id: Uuid,

    /// 来源任务ID
    pub task_id: Uuid,

    /// 题目页 URL
    pub url: String,

    /// 登录账号
    pub email: String,

    /// 题型标识（number / string）
    pub question_type: &'static str,

    /// 相邻两次提交之间的间隔
    pub attempt_delay: Duration,

    /// 每消费多少个候选打一条进度日志；0 表示不打
    pub progress_log_every: u64,
}

impl SessionCtx {
    /// 创建新的会话上下文
    pub fn new(
        session_id: Uuid,
        task_id: Uuid,
        url: String,
        email: String,
        question_type: &'static str,
        attempt_delay: Duration,
        progress_log_every: u64,
    ) -> Self {
        Self {
            session_id,
            task_id,
            url,
            email,
            question_type,
            attempt_delay,
            progress_log_every,
        }
    }

    /// 日志里用的短会话号
    pub fn short_id(&self) -> String {
        self.session_id.to_string().chars().take(8).collect()
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[会话 #{}]", self.short_id())
    }
}
