//! 会话管理器 - 编排层
//!
//! ## 职责
//!
//! 管理答题会话的生命周期：同一时刻最多一场会话在跑。
//!
//! ## 核心功能
//!
//! 1. **互斥启动**：Semaphore(1) 保证单会话，占用时立即报忙
//! 2. **组装会话**：校验候选空间 → 建流程 → spawn 后台任务
//! 3. **控制句柄**：取消、进度订阅、等待终态
//! 4. **结果落盘**：每场会话的终态都追加进结果文件
//!
//! ## 设计特点
//!
//! - **先校验后占坑**：候选空间不合法时不消耗会话名额
//! - **许可随任务走**：信号量许可移入后台任务，终态后自动释放

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult, SessionError};
use crate::generator::CandidateGenerator;
use crate::models::{EventSink, ProgressSnapshot, SessionReport, Task};
use crate::services::{AccountConfig, QuizClient, ResultWriter};
use crate::workflow::{SessionCtx, SessionFlow};

/// 会话管理器
pub struct SessionManager {
    slot: Arc<Semaphore>,
    client: Arc<dyn QuizClient>,
    sink: EventSink,
    results: Arc<ResultWriter>,
    attempt_delay: Duration,
    progress_log_every: u64,
}

impl SessionManager {
    /// 创建新的会话管理器
    pub fn new(
        client: Arc<dyn QuizClient>,
        sink: EventSink,
        results: Arc<ResultWriter>,
        config: &Config,
    ) -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
            client,
            sink,
            results,
            attempt_delay: Duration::from_millis(config.attempt_delay_ms),
            progress_log_every: config.progress_log_every,
        }
    }

    /// 启动一场会话；已有会话在跑时报忙
    ///
    /// # 参数
    /// - `task`: 待执行的答题任务
    /// - `account`: 当前账号凭据（密码为明文，只进入会话本体）
    ///
    /// # 返回
    /// 会话控制句柄；候选空间不合法或会话位被占用时报错
    pub fn start_session(
        &self,
        task: &Task,
        account: &AccountConfig,
    ) -> AppResult<SessionHandle> {
        // 先校验候选空间：报错要发生在占坑之前
        let generator = CandidateGenerator::new(&task.space)?;

        let permit = self
            .slot
            .clone()
            .try_acquire_owned()
            .map_err(|_| AppError::session_busy(&task.url))?;

        if !task.email.is_empty() && task.email != account.email {
            warn!(
                "⚠️ 任务指定账号 {} 与当前凭据账号 {} 不一致，按当前凭据执行",
                task.email, account.email
            );
        }

        let session_id = Uuid::new_v4();
        let ctx = SessionCtx::new(
            session_id,
            task.id,
            task.url.clone(),
            account.email.clone(),
            task.space.question_type(),
            self.attempt_delay,
            self.progress_log_every,
        );

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (progress_tx, progress_rx) =
            watch::channel(ProgressSnapshot::initial(
                session_id,
                CandidateGenerator::count(&generator),
            ));

        let flow = SessionFlow::new(
            self.client.clone(),
            self.sink.clone(),
            progress_tx,
            cancel_rx,
        );
        let results = self.results.clone();
        let password = account.password.clone();

        let join = tokio::spawn(async move {
            let _permit = permit;
            let report = flow.run(ctx, password, generator).await;
            if let Err(e) = results.append(&report).await {
                error!("❌ 写入结果文件失败: {}", e);
            }
            report
        });

        Ok(SessionHandle {
            session_id,
            cancel_tx,
            progress_rx,
            join,
        })
    }
}

/// 会话控制句柄
///
/// 会话在后台任务里推进；句柄只负责取消、看进度、等终态。
/// 句柄被丢弃时会话照常跑完（结果仍会落盘）。
pub struct SessionHandle {
    session_id: Uuid,
    cancel_tx: watch::Sender<bool>,
    progress_rx: watch::Receiver<ProgressSnapshot>,
    join: JoinHandle<SessionReport>,
}

impl SessionHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// 请求取消；会话在取下一个候选前停下
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// 当前进度快照
    pub fn progress(&self) -> ProgressSnapshot {
        self.progress_rx.borrow().clone()
    }

    /// 等待会话终态
    pub async fn wait(&mut self) -> AppResult<SessionReport> {
        (&mut self.join)
            .await
            .map_err(|_| AppError::Session(SessionError::TaskAborted))
    }
}
