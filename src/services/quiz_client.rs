//! 答题客户端能力 - 业务能力层
//!
//! 核心流程只依赖这组能力，不认识任何页面细节。
//! 浏览器实现之外，测试用脚本化实现同样可以驱动完整会话。

use anyhow::Result;
use async_trait::async_trait;

/// 单次提交的结果
///
/// - `ok=true`：提交已完成，可以去读平台反馈
/// - `ok=false, transient=true`：暂时性失败（超时、元素缺失），值得重试
/// - `ok=false, transient=false`：致命失败，会话应当终止
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitOutcome {
    pub ok: bool,
    pub transient: bool,
}

impl SubmitOutcome {
    pub fn submitted() -> Self {
        SubmitOutcome {
            ok: true,
            transient: false,
        }
    }

    pub fn transient() -> Self {
        SubmitOutcome {
            ok: false,
            transient: true,
        }
    }

    pub fn rejected() -> Self {
        SubmitOutcome {
            ok: false,
            transient: false,
        }
    }
}

/// 答题客户端
///
/// 四个操作与会话状态机的阶段一一对应。`login` / `open` 返回
/// `Ok(false)` 表示该阶段失败且不可恢复；`Err` 保留给底层通道
/// 本身的故障。
#[async_trait]
pub trait QuizClient: Send + Sync {
    /// 登录平台账号
    async fn login(&self, email: &str, password: &str) -> Result<bool>;

    /// 打开目标答题页并确认输入框存在
    async fn open(&self, url: &str) -> Result<bool>;

    /// 填入候选并提交
    async fn submit(&self, candidate: &str) -> Result<SubmitOutcome>;

    /// 读取平台反馈，判断最近一次提交是否被判定为正确
    async fn check_success(&self) -> Result<bool>;
}
