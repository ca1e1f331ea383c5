//! 答题会话流程 - 流程层
//!
//! 核心职责：定义"一场答题会话"的完整执行流程
//!
//! 流程顺序：
//! 1. 登录 → 打开题目页
//! 2. 逐个候选：提交（瞬态失败换分隔符重试一次）→ 校验反馈
//! 3. 终态汇报（命中 / 耗尽 / 取消 / 失败）

use chrono::{DateTime, Local};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::generator::CandidateGenerator;
use crate::models::{
    AttemptOutcome, AttemptResult, Candidate, EventSink, FailureStage, ProgressSnapshot,
    SessionOutcome, SessionPhase, SessionReport,
};
use crate::services::{QuizClient, SubmitOutcome};
use crate::workflow::session_ctx::SessionCtx;

/// 连续瞬态失败上限：达到后判定提交通道已不可用
const MAX_CONSECUTIVE_TRANSIENT: u32 = 5;

/// 答题会话流程
///
/// - 编排登录、导航、提交、校验的完整顺序
/// - 决定何时重试、何时终止
/// - 不持有浏览器资源（page），只依赖业务能力（services）
pub struct SessionFlow {
    client: Arc<dyn QuizClient>,
    sink: EventSink,
    progress_tx: watch::Sender<ProgressSnapshot>,
    cancel_rx: watch::Receiver<bool>,
}

impl SessionFlow {
    /// 创建新的会话流程
    pub fn new(
        client: Arc<dyn QuizClient>,
        sink: EventSink,
        progress_tx: watch::Sender<ProgressSnapshot>,
        cancel_rx: watch::Receiver<bool>,
    ) -> Self {
        Self {
            client,
            sink,
            progress_tx,
            cancel_rx,
        }
    }

    /// 执行一场完整会话，返回终态汇报
    ///
    /// 流程内部的所有失败都折算进终态，不向外抛错；
    /// 每个已消费的候选都恰好留下一条尝试记录。
    pub async fn run(
        self,
        ctx: SessionCtx,
        password: String,
        mut generator: CandidateGenerator,
    ) -> SessionReport {
        let started_at = Local::now();
        let mut attempts: Vec<AttemptResult> = Vec::new();
        let mut progress =
            ProgressSnapshot::initial(ctx.session_id, CandidateGenerator::count(&generator));

        self.sink.log(format!(
            "{} 🚀 会话开始: {} (候选空间 {} 个)",
            ctx, ctx.url, progress.total
        ));
        debug!("{} 来源任务: {}，账号: {}", ctx, ctx.task_id, ctx.email);

        // ========== 流程 1: 登录 ==========
        self.publish_phase(&mut progress, SessionPhase::Authenticating);
        match self.client.login(&ctx.email, &password).await {
            Ok(true) => info!("{} ✓ 登录成功: {}", ctx, ctx.email),
            Ok(false) => {
                warn!("{} ❌ 登录失败: {}", ctx, ctx.email);
                return self.finish(
                    &ctx,
                    started_at,
                    attempts,
                    progress,
                    SessionOutcome::Failed(FailureStage::Login),
                );
            }
            Err(e) => {
                error!("{} ❌ 登录过程异常: {}", ctx, e);
                return self.finish(
                    &ctx,
                    started_at,
                    attempts,
                    progress,
                    SessionOutcome::Failed(FailureStage::Login),
                );
            }
        }

        // ========== 流程 2: 打开题目页 ==========
        self.publish_phase(&mut progress, SessionPhase::NavigatingToTarget);
        match self.client.open(&ctx.url).await {
            Ok(true) => info!("{} ✓ 题目页就绪: {}", ctx, ctx.url),
            Ok(false) => {
                warn!("{} ❌ 题目页不可用: {}", ctx, ctx.url);
                return self.finish(
                    &ctx,
                    started_at,
                    attempts,
                    progress,
                    SessionOutcome::Failed(FailureStage::Navigation),
                );
            }
            Err(e) => {
                error!("{} ❌ 打开题目页异常: {}", ctx, e);
                return self.finish(
                    &ctx,
                    started_at,
                    attempts,
                    progress,
                    SessionOutcome::Failed(FailureStage::Navigation),
                );
            }
        }

        // ========== 流程 3: 逐个候选提交 ==========
        let mut consecutive_transient = 0u32;
        loop {
            // 取消优先于取下一个候选
            if *self.cancel_rx.borrow() {
                self.sink.log(format!("{} ⚠️ 会话被取消", ctx));
                return self.finish(
                    &ctx,
                    started_at,
                    attempts,
                    progress,
                    SessionOutcome::Cancelled,
                );
            }

            self.publish_phase(&mut progress, SessionPhase::AwaitingCandidate);
            let candidate = match generator.next() {
                Some(candidate) => candidate,
                None => {
                    return self.finish(
                        &ctx,
                        started_at,
                        attempts,
                        progress,
                        SessionOutcome::Exhausted,
                    );
                }
            };

            self.publish_phase(&mut progress, SessionPhase::Submitting);
            let submit = self.submit_with_retry(&ctx, &candidate).await;

            if submit.ok {
                consecutive_transient = 0;

                self.publish_phase(&mut progress, SessionPhase::Verifying);
                match self.client.check_success().await {
                    Ok(true) => {
                        self.record(
                            &mut attempts,
                            &mut progress,
                            candidate.clone(),
                            AttemptOutcome::Correct,
                        );
                        self.sink
                            .log(format!("{} ✅ 命中正确答案: {}", ctx, candidate));
                        return self.finish(
                            &ctx,
                            started_at,
                            attempts,
                            progress,
                            SessionOutcome::Succeeded(candidate),
                        );
                    }
                    Ok(false) => {
                        self.record(
                            &mut attempts,
                            &mut progress,
                            candidate.clone(),
                            AttemptOutcome::Incorrect,
                        );
                    }
                    Err(e) => {
                        error!("{} ❌ 校验反馈时浏览器通道异常: {}", ctx, e);
                        self.record(
                            &mut attempts,
                            &mut progress,
                            candidate,
                            AttemptOutcome::TransientError,
                        );
                        return self.finish(
                            &ctx,
                            started_at,
                            attempts,
                            progress,
                            SessionOutcome::Failed(FailureStage::Verify),
                        );
                    }
                }
            } else if submit.transient {
                consecutive_transient += 1;
                self.record(
                    &mut attempts,
                    &mut progress,
                    candidate,
                    AttemptOutcome::TransientError,
                );
                if consecutive_transient >= MAX_CONSECUTIVE_TRANSIENT {
                    error!(
                        "{} ❌ 连续 {} 次提交未完成，判定提交通道失效",
                        ctx, consecutive_transient
                    );
                    return self.finish(
                        &ctx,
                        started_at,
                        attempts,
                        progress,
                        SessionOutcome::Failed(FailureStage::Submit),
                    );
                }
                debug!("{} 提交未完成，记为瞬态错误后继续", ctx);
            } else {
                warn!("{} ❌ 页面拒绝此次提交且不可重试", ctx);
                self.record(
                    &mut attempts,
                    &mut progress,
                    candidate,
                    AttemptOutcome::TransientError,
                );
                return self.finish(
                    &ctx,
                    started_at,
                    attempts,
                    progress,
                    SessionOutcome::Failed(FailureStage::Submit),
                );
            }

            if ctx.progress_log_every > 0 && progress.tried as u64 % ctx.progress_log_every == 0 {
                self.sink.log(format!(
                    "{} 进度 {}/{} ({:.1}%)",
                    ctx,
                    progress.tried,
                    progress.total,
                    progress.percent()
                ));
            }

            tokio::time::sleep(ctx.attempt_delay).await;
        }
    }

    /// 提交单个候选；瞬态失败时换一次小数点分隔符重试
    async fn submit_with_retry(&self, ctx: &SessionCtx, candidate: &Candidate) -> SubmitOutcome {
        debug!("{} 📤 提交候选: {}", ctx, candidate);
        let first = self.submit_once(candidate.as_str()).await;
        if first.ok || !first.transient {
            return first;
        }

        let swapped = candidate.separator_swapped();
        debug!("{} 换用分隔符重试: {} → {}", ctx, candidate, swapped);
        self.submit_once(swapped.as_str()).await
    }

    /// 单次提交；通道错误折算成瞬态失败
    async fn submit_once(&self, value: &str) -> SubmitOutcome {
        match self.client.submit(value).await {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!("提交过程异常，记为瞬态: {}", e);
                SubmitOutcome::transient()
            }
        }
    }

    /// 为已消费的候选留下尝试记录并推进进度
    fn record(
        &self,
        attempts: &mut Vec<AttemptResult>,
        progress: &mut ProgressSnapshot,
        candidate: Candidate,
        outcome: AttemptOutcome,
    ) {
        let result = AttemptResult::now(candidate, outcome);
        self.sink.attempt(result.clone());
        attempts.push(result);
        progress.tried += 1;
        let _ = self.progress_tx.send(progress.clone());
    }

    /// 发布会话阶段变化
    fn publish_phase(&self, progress: &mut ProgressSnapshot, phase: SessionPhase) {
        progress.phase = phase;
        let _ = self.progress_tx.send(progress.clone());
    }

    /// 收束会话：发布终态、通知事件通道、组装汇报
    fn finish(
        &self,
        ctx: &SessionCtx,
        started_at: DateTime<Local>,
        attempts: Vec<AttemptResult>,
        mut progress: ProgressSnapshot,
        outcome: SessionOutcome,
    ) -> SessionReport {
        self.publish_phase(&mut progress, SessionPhase::Finished);

        self.sink.log(format!(
            "{} {} (已尝试 {}/{} 个候选)",
            ctx,
            outcome_summary(&outcome),
            progress.tried,
            progress.total
        ));
        self.sink.finished(ctx.session_id, outcome.clone());

        SessionReport {
            session_id: ctx.session_id,
            url: ctx.url.clone(),
            question_type: ctx.question_type,
            outcome,
            attempts,
            tried: progress.tried,
            total: progress.total,
            started_at,
            finished_at: Local::now(),
        }
    }
}

// ========== 日志辅助 ==========

/// 终态的一句话总结
fn outcome_summary(outcome: &SessionOutcome) -> String {
    match outcome {
        SessionOutcome::Succeeded(candidate) => format!("✅ 会话成功，答案: {}", candidate),
        SessionOutcome::Exhausted => "⚠️ 候选空间耗尽，未找到正确答案".to_string(),
        SessionOutcome::Cancelled => "⚠️ 会话已取消".to_string(),
        SessionOutcome::Failed(stage) => format!("❌ 会话失败于 {} 阶段", stage.as_str()),
    }
}
