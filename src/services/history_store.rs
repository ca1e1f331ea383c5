//! 历史记录存储 - 业务能力层
//!
//! 维护最近提交过的题目 URL 列表，按时间倒序、去重、封顶。

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs;
use tracing::warn;

/// 历史记录文件名
const HISTORY_FILE: &str = "history.json";

/// 历史记录存储
pub struct HistoryStore {
    path: PathBuf,
    cap: usize,
}

impl HistoryStore {
    pub fn new(data_dir: impl Into<PathBuf>, cap: usize) -> Self {
        Self {
            path: data_dir.into().join(HISTORY_FILE),
            cap,
        }
    }

    /// 读取历史记录；文件缺失或损坏时返回空列表
    pub async fn load(&self) -> Vec<String> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("⚠️ 历史记录损坏，按空列表处理: {}", e);
                Vec::new()
            }
        }
    }

    /// 保存历史记录
    pub async fn save(&self, entries: &[String]) -> Result<()> {
        let content = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, content)
            .await
            .with_context(|| format!("写入历史记录失败: {}", self.path.display()))?;
        Ok(())
    }

    /// 把 URL 插到列表最前面：去掉旧位置、超出上限的从尾部裁掉
    pub fn insert(&self, entries: &mut Vec<String>, url: &str) {
        entries.retain(|existing| existing != url);
        entries.insert(0, url.to_string());
        entries.truncate(self.cap);
    }
}
