//! 结果写入服务 - 业务能力层
//!
//! 只负责"把会话报告追加进 CSV"能力，不关心流程

use anyhow::Result;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::debug;

use crate::error::AppError;
use crate::models::SessionReport;

/// CSV 表头，仅在文件首次创建时写入
const CSV_HEADER: &str = "timestamp,url,question_type,outcome,answer,attempts\n";

/// 结果写入服务
///
/// 职责：
/// - 将单个会话报告追加写入结果文件
/// - 首次写入时补上表头
/// - 不关心会话流程顺序
pub struct ResultWriter {
    results_file_path: String,
}

impl ResultWriter {
    /// 使用自定义文件路径创建
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            results_file_path: path.into(),
        }
    }

    /// 追加一条会话结果
    ///
    /// # 参数
    /// - `report`: 会话终态汇报
    ///
    /// # 返回
    /// 返回是否成功写入
    pub async fn append(&self, report: &SessionReport) -> Result<()> {
        debug!(
            "写入结果: {} | {} | 尝试 {} 次",
            report.url,
            report.outcome.as_str(),
            report.tried
        );

        let needs_header = !Path::new(&self.results_file_path).exists();

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.results_file_path)
            .map_err(|e| AppError::file_write_failed(&self.results_file_path, e))?;

        if needs_header {
            file.write_all(CSV_HEADER.as_bytes())?;
        }

        let row = format!(
            "{},{},{},{},{},{}\n",
            report.finished_at.format("%Y-%m-%d %H:%M:%S"),
            csv_field(&report.url),
            report.question_type,
            report.outcome.as_str(),
            csv_field(report.answer().unwrap_or("")),
            report.tried,
        );
        file.write_all(row.as_bytes())?;

        Ok(())
    }
}

/// CSV 字段转义：含逗号、引号或换行时整体加引号，内部引号翻倍
fn csv_field(raw: &str) -> String {
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, SessionOutcome};
    use chrono::Local;
    use tempfile::tempdir;
    use uuid::Uuid;

    fn sample_report(outcome: SessionOutcome) -> SessionReport {
        SessionReport {
            session_id: Uuid::new_v4(),
            url: "https://stepik.org/lesson/1/step/2".to_string(),
            question_type: "number",
            outcome,
            attempts: Vec::new(),
            tried: 7,
            total: 100,
            started_at: Local::now(),
            finished_at: Local::now(),
        }
    }

    #[test]
    fn test_csv_field_escaping() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("two\nlines"), "\"two\nlines\"");
    }

    #[tokio::test]
    async fn test_header_written_once() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("results.csv");
        let writer = ResultWriter::new(path.to_string_lossy().to_string());

        writer
            .append(&sample_report(SessionOutcome::Succeeded(Candidate::new("42"))))
            .await
            .unwrap();
        writer
            .append(&sample_report(SessionOutcome::Exhausted))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER.trim_end());
        assert!(lines[1].contains(",succeeded,42,"));
        assert!(lines[2].contains(",exhausted,,"));
    }
}
