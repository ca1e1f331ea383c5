use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use super::attempt::{AttemptResult, SessionOutcome};

/// 会话运行阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Init,
    Authenticating,
    NavigatingToTarget,
    AwaitingCandidate,
    Submitting,
    Verifying,
    Finished,
}

impl SessionPhase {
    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Init => "初始化",
            SessionPhase::Authenticating => "登录中",
            SessionPhase::NavigatingToTarget => "打开目标页",
            SessionPhase::AwaitingCandidate => "等待候选",
            SessionPhase::Submitting => "提交中",
            SessionPhase::Verifying => "校验反馈",
            SessionPhase::Finished => "已结束",
        }
    }
}

/// 会话进度快照
///
/// 经 watch 通道发布，写入方只有会话本体；外层随时读取最新值，
/// 不阻塞会话推进。
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub session_id: Uuid,
    pub phase: SessionPhase,
    pub tried: usize,
    pub total: u128,
}

impl ProgressSnapshot {
    pub fn initial(session_id: Uuid, total: u128) -> Self {
        ProgressSnapshot {
            session_id,
            phase: SessionPhase::Init,
            tried: 0,
            total,
        }
    }

    /// 完成百分比；空间为空时记 100%
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.tried as f64 / self.total as f64 * 100.0
        }
    }
}

/// 应用事件：面向外层消费者（运行日志、上层界面）的轻量通知
#[derive(Debug, Clone)]
pub enum AppEvent {
    Log {
        timestamp: DateTime<Local>,
        message: String,
    },
    Attempt(AttemptResult),
    Finished {
        session_id: Uuid,
        outcome: SessionOutcome,
    },
}

/// 事件汇集器
///
/// 面向用户的进展信息统一经由这里：先走 tracing，再投递事件通道。
/// 通道无人消费时事件被丢弃，不影响会话本体。
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl EventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventSink { tx }, rx)
    }

    pub fn log(&self, message: impl Into<String>) {
        let message = message.into();
        info!("{}", message);
        let _ = self.tx.send(AppEvent::Log {
            timestamp: Local::now(),
            message,
        });
    }

    pub fn attempt(&self, result: AttemptResult) {
        let _ = self.tx.send(AppEvent::Attempt(result));
    }

    pub fn finished(&self, session_id: Uuid, outcome: SessionOutcome) {
        let _ = self.tx.send(AppEvent::Finished {
            session_id,
            outcome,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::candidate::Candidate;
    use crate::models::attempt::AttemptOutcome;

    #[test]
    fn test_percent() {
        let mut snapshot = ProgressSnapshot::initial(Uuid::new_v4(), 200);
        assert_eq!(snapshot.percent(), 0.0);

        snapshot.tried = 50;
        assert_eq!(snapshot.percent(), 25.0);

        snapshot.total = 0;
        assert_eq!(snapshot.percent(), 100.0);
    }

    #[tokio::test]
    async fn test_sink_delivers_events_in_order() {
        let (sink, mut rx) = EventSink::new();

        sink.log("开始");
        sink.attempt(AttemptResult::now(
            Candidate::new("7"),
            AttemptOutcome::Incorrect,
        ));

        match rx.recv().await.unwrap() {
            AppEvent::Log { message, .. } => assert_eq!(message, "开始"),
            other => panic!("期望 Log 事件，实际为 {:?}", other),
        }
        match rx.recv().await.unwrap() {
            AppEvent::Attempt(result) => {
                assert_eq!(result.candidate.as_str(), "7");
                assert_eq!(result.outcome, AttemptOutcome::Incorrect);
            }
            other => panic!("期望 Attempt 事件，实际为 {:?}", other),
        }
    }

    #[test]
    fn test_sink_without_consumer_does_not_block() {
        let (sink, rx) = EventSink::new();
        drop(rx);
        // 接收端不在也不能影响发送方
        sink.log("无人消费");
        sink.finished(Uuid::new_v4(), SessionOutcome::Exhausted);
    }
}
