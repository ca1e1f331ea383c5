//! 计划调度器 - 编排层
//!
//! ## 职责
//!
//! 维护计划任务列表，按到期窗口触发会话。
//!
//! ## 核心功能
//!
//! 1. **任务登记**：添加前校验候选空间，变更即落盘
//! 2. **到期判定**：轮询式 tick，窗口为 [计划时间, +1 分钟)
//! 3. **触发与推进**：触发后立即推进周期任务 / 移除一次性任务
//! 4. **宽容失败**：会话启动失败只记日志，计划照常推进
//!
//! ## 设计特点
//!
//! - **时钟注入**：tick 的 now 由调用方传入，窗口逻辑可直接测试
//! - **触发即推进**：同一个到期窗口内不会重复触发同一任务

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::generator::CandidateGenerator;
use crate::models::{EventSink, Task, SCHEDULE_DATETIME_FORMAT};
use crate::services::ScheduleStore;
use crate::utils::truncate_text;

/// 会话发射器：调度器据此触发会话，不关心会话内部
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    async fn launch(&self, task: &Task) -> AppResult<()>;
}

/// 计划调度器
pub struct ScheduleManager {
    tasks: Mutex<Vec<Task>>,
    store: ScheduleStore,
    launcher: Arc<dyn SessionLauncher>,
    sink: EventSink,
    poll_interval: Duration,
}

impl ScheduleManager {
    /// 创建新的计划调度器
    pub fn new(
        store: ScheduleStore,
        launcher: Arc<dyn SessionLauncher>,
        sink: EventSink,
        poll_interval: Duration,
    ) -> Self {
        Self {
            tasks: Mutex::new(Vec::new()),
            store,
            launcher,
            sink,
            poll_interval,
        }
    }

    /// 从存储恢复任务列表
    pub async fn load(&self) {
        let restored = self.store.load().await;
        if !restored.is_empty() {
            info!("📖 恢复 {} 个计划任务", restored.len());
        }
        *self.tasks.lock().await = restored;
    }

    /// 登记新任务；候选空间在这里提前校验
    pub async fn add_task(&self, task: Task) -> AppResult<Uuid> {
        CandidateGenerator::new(&task.space)?;

        let id = task.id;
        let mut tasks = self.tasks.lock().await;
        info!(
            "⏰ 登记计划任务: {} @ {} ({})",
            truncate_text(&task.url, 60),
            task.scheduled_at.format(SCHEDULE_DATETIME_FORMAT),
            task.recurrence.label()
        );
        tasks.push(task);
        self.persist(&tasks).await;
        Ok(id)
    }

    /// 移除任务
    pub async fn remove_task(&self, id: Uuid) -> AppResult<()> {
        let mut tasks = self.tasks.lock().await;
        let before = tasks.len();
        tasks.retain(|task| task.id != id);
        if tasks.len() == before {
            return Err(AppError::task_not_found(id));
        }
        self.persist(&tasks).await;
        Ok(())
    }

    /// 当前任务数量
    pub async fn task_count(&self) -> usize {
        self.tasks.lock().await.len()
    }

    /// 任务列表快照
    pub async fn tasks(&self) -> Vec<Task> {
        self.tasks.lock().await.clone()
    }

    /// 单轮到期检查
    ///
    /// 到期任务触发后立即推进计划：周期任务改到下一次执行时间，
    /// 一次性任务移出列表。启动失败不影响推进，否则同一窗口内
    /// 会反复触发同一任务。
    pub async fn tick(&self, now: NaiveDateTime) {
        let mut tasks = self.tasks.lock().await;
        let mut fired_any = false;
        let mut index = 0;

        while index < tasks.len() {
            if !tasks[index].is_due(now) {
                index += 1;
                continue;
            }
            fired_any = true;

            let task = tasks[index].clone();
            self.sink.log(format!(
                "⏰ 计划任务到期: {} ({})",
                truncate_text(&task.url, 60),
                task.recurrence.label()
            ));

            if let Err(e) = self.launcher.launch(&task).await {
                error!("❌ 计划任务启动失败: {}", e);
            }

            match task.advanced_schedule() {
                Some(next) => {
                    info!("⏰ 下一次执行: {}", next.format(SCHEDULE_DATETIME_FORMAT));
                    tasks[index].scheduled_at = next;
                    index += 1;
                }
                None => {
                    info!("✓ 一次性任务完成，移出计划");
                    tasks.remove(index);
                }
            }
        }

        if fired_any {
            self.persist(&tasks).await;
        }
    }

    /// 周期轮询循环；收到停机信号后退出
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        info!(
            "⏰ 调度器启动，每 {} 秒检查一次计划",
            self.poll_interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick(Local::now().naive_local()).await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("⏰ 调度器退出");
                        break;
                    }
                }
            }
        }
    }

    async fn persist(&self, tasks: &[Task]) {
        if let Err(e) = self.store.save(tasks).await {
            warn!("⚠️ 计划任务落盘失败: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateSpace, Recurrence};
    use chrono::{Duration as ChronoDuration, NaiveDate};
    use std::sync::Mutex as StdMutex;
    use tempfile::tempdir;

    struct RecordingLauncher {
        launched: StdMutex<Vec<String>>,
        fail: bool,
    }

    impl RecordingLauncher {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                launched: StdMutex::new(Vec::new()),
                fail,
            })
        }

        fn launched(&self) -> Vec<String> {
            self.launched.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SessionLauncher for RecordingLauncher {
        async fn launch(&self, task: &Task) -> AppResult<()> {
            self.launched.lock().unwrap().push(task.url.clone());
            if self.fail {
                Err(AppError::Other("模拟启动失败".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn manager_with(dir: &std::path::Path, launcher: Arc<RecordingLauncher>) -> ScheduleManager {
        let (sink, _rx) = EventSink::new();
        ScheduleManager::new(
            ScheduleStore::new(dir),
            launcher,
            sink,
            Duration::from_secs(30),
        )
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    fn task_at(scheduled_at: NaiveDateTime, recurrence: Recurrence) -> Task {
        let mut task = Task::one_shot(
            "https://stepik.org/lesson/1/step/1",
            "user@example.org",
            CandidateSpace::numeric("1", "9", "1", 0),
            scheduled_at,
        );
        task.recurrence = recurrence;
        task
    }

    #[tokio::test]
    async fn test_due_one_shot_fires_once_and_is_removed() {
        let temp = tempdir().unwrap();
        let launcher = RecordingLauncher::new(false);
        let manager = manager_with(temp.path(), launcher.clone());

        manager
            .add_task(task_at(at(2025, 6, 1, 9, 30), Recurrence::None))
            .await
            .unwrap();

        manager.tick(at(2025, 6, 1, 9, 30)).await;
        assert_eq!(launcher.launched().len(), 1);
        assert_eq!(manager.task_count().await, 0);

        // 同一窗口内再 tick 不会重复触发
        manager
            .tick(at(2025, 6, 1, 9, 30) + ChronoDuration::seconds(30))
            .await;
        assert_eq!(launcher.launched().len(), 1);

        // 移除状态已落盘，重启后不会复活
        let reloaded = manager_with(temp.path(), RecordingLauncher::new(false));
        reloaded.load().await;
        assert_eq!(reloaded.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_not_due_task_does_not_fire() {
        let temp = tempdir().unwrap();
        let launcher = RecordingLauncher::new(false);
        let manager = manager_with(temp.path(), launcher.clone());

        manager
            .add_task(task_at(at(2025, 6, 1, 9, 30), Recurrence::None))
            .await
            .unwrap();

        manager.tick(at(2025, 6, 1, 9, 29)).await;
        assert!(launcher.launched().is_empty());
        assert_eq!(manager.task_count().await, 1);
    }

    #[tokio::test]
    async fn test_recurring_task_advances_after_firing() {
        let temp = tempdir().unwrap();
        let launcher = RecordingLauncher::new(false);
        let manager = manager_with(temp.path(), launcher.clone());

        manager
            .add_task(task_at(at(2025, 6, 1, 9, 30), Recurrence::Daily))
            .await
            .unwrap();

        manager.tick(at(2025, 6, 1, 9, 30)).await;
        assert_eq!(launcher.launched().len(), 1);

        let tasks = manager.tasks().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].scheduled_at, at(2025, 6, 2, 9, 30));

        // 推进后的时间已落盘
        let reloaded = manager_with(temp.path(), RecordingLauncher::new(false));
        reloaded.load().await;
        assert_eq!(reloaded.tasks().await[0].scheduled_at, at(2025, 6, 2, 9, 30));
    }

    #[tokio::test]
    async fn test_failed_launch_still_advances_schedule() {
        let temp = tempdir().unwrap();
        let launcher = RecordingLauncher::new(true);
        let manager = manager_with(temp.path(), launcher.clone());

        manager
            .add_task(task_at(at(2025, 6, 1, 9, 30), Recurrence::Weekly))
            .await
            .unwrap();

        manager.tick(at(2025, 6, 1, 9, 30)).await;
        assert_eq!(launcher.launched().len(), 1);

        let tasks = manager.tasks().await;
        assert_eq!(tasks[0].scheduled_at, at(2025, 6, 8, 9, 30));
    }

    #[tokio::test]
    async fn test_add_task_rejects_invalid_space() {
        let temp = tempdir().unwrap();
        let manager = manager_with(temp.path(), RecordingLauncher::new(false));

        let bad = Task::one_shot(
            "https://stepik.org/lesson/1/step/1",
            "user@example.org",
            CandidateSpace::numeric("1", "9", "0", 0),
            at(2025, 6, 1, 9, 30),
        );
        assert!(manager.add_task(bad).await.is_err());
        assert_eq!(manager.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_remove_task() {
        let temp = tempdir().unwrap();
        let manager = manager_with(temp.path(), RecordingLauncher::new(false));

        let id = manager
            .add_task(task_at(at(2025, 6, 1, 9, 30), Recurrence::None))
            .await
            .unwrap();

        manager.remove_task(id).await.unwrap();
        assert_eq!(manager.task_count().await, 0);
        assert!(manager.remove_task(id).await.is_err());
    }

    #[tokio::test]
    async fn test_tasks_survive_restart() {
        let temp = tempdir().unwrap();
        {
            let manager = manager_with(temp.path(), RecordingLauncher::new(false));
            manager
                .add_task(task_at(at(2025, 6, 1, 9, 30), Recurrence::Monthly))
                .await
                .unwrap();
        }

        let manager = manager_with(temp.path(), RecordingLauncher::new(false));
        manager.load().await;
        assert_eq!(manager.task_count().await, 1);
        assert_eq!(manager.tasks().await[0].recurrence, Recurrence::Monthly);
    }
}
