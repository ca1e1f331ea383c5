//! 计划任务存储 - 业务能力层
//!
//! 计划任务列表的落盘与恢复。读取按条容错：个别条目损坏时
//! 跳过并告警，存活的条目照常恢复。

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::warn;

use crate::models::Task;

/// 计划任务文件名
const SCHEDULE_FILE: &str = "schedule.json";

/// 计划任务存储
pub struct ScheduleStore {
    path: PathBuf,
}

impl ScheduleStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: data_dir.into().join(SCHEDULE_FILE),
        }
    }

    /// 读取任务列表；文件缺失返回空，损坏条目逐个跳过
    pub async fn load(&self) -> Vec<Task> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };
        let raw: Vec<serde_json::Value> = match serde_json::from_str(&content) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("⚠️ 计划任务文件损坏，按空列表处理: {}", e);
                return Vec::new();
            }
        };

        let mut tasks = Vec::with_capacity(raw.len());
        for entry in raw {
            match serde_json::from_value::<Task>(entry) {
                Ok(task) => tasks.push(task),
                Err(e) => warn!("⚠️ 跳过无法解析的计划任务: {}", e),
            }
        }
        tasks
    }

    /// 保存任务列表
    pub async fn save(&self, tasks: &[Task]) -> Result<()> {
        let content = serde_json::to_string_pretty(tasks)?;
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("写入计划任务失败: {}", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateSpace, Recurrence};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn sample_task() -> Task {
        let at = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();
        let mut task = Task::one_shot(
            "https://stepik.org/lesson/1/step/1",
            "user@example.org",
            CandidateSpace::numeric("0", "10", "1", 0),
            at,
        );
        task.recurrence = Recurrence::Daily;
        task
    }

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let temp = tempdir().unwrap();
        let store = ScheduleStore::new(temp.path());

        let tasks = vec![sample_task()];
        store.save(&tasks).await.unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].url, tasks[0].url);
        assert_eq!(loaded[0].scheduled_at, tasks[0].scheduled_at);
        assert_eq!(loaded[0].recurrence, Recurrence::Daily);
    }

    #[tokio::test]
    async fn test_malformed_entry_is_skipped() {
        let temp = tempdir().unwrap();
        let store = ScheduleStore::new(temp.path());

        let good = serde_json::to_value(sample_task()).unwrap();
        let bad = serde_json::json!({"url": "x", "scheduled_at": "01.06.2025 09:30"});
        let content = serde_json::to_string(&vec![bad, good]).unwrap();
        std::fs::write(temp.path().join(SCHEDULE_FILE), content).unwrap();

        let loaded = store.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].url, "https://stepik.org/lesson/1/step/1");
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let temp = tempdir().unwrap();
        let store = ScheduleStore::new(temp.path());
        assert!(store.load().await.is_empty());
    }
}
