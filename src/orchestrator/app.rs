//! 应用编排 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责资源装配与运行模式选择。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：运行日志、凭据存储、浏览器、各管理器
//! 2. **模式选择**：给了目标 URL 走一次性模式，否则走定时调度模式
//! 3. **事件泵**：把会话事件逐条追加进运行日志文件
//! 4. **停机收束**：Ctrl+C 先取消会话 / 停调度器，再退出
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一持有 Browser 的模块
//! - **向下委托**：会话交给 SessionManager，计划交给 ScheduleManager

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::Browser;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::browser;
use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::PageDriver;
use crate::models::{AppEvent, EventSink, SessionReport, Task};
use crate::orchestrator::scheduler::{ScheduleManager, SessionLauncher};
use crate::orchestrator::session_manager::SessionManager;
use crate::services::{
    AccountConfig, BrowserClient, CredentialStore, HistoryStore, QuizClient, ResultWriter,
    ScheduleStore,
};
use crate::utils::{init_log_file, log_startup};

/// 应用主结构
pub struct App {
    config: Config,
    account: AccountConfig,
    history: HistoryStore,
    sessions: Arc<SessionManager>,
    scheduler: Arc<ScheduleManager>,
    events: Option<mpsc::UnboundedReceiver<AppEvent>>,
    _browser: Browser,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        init_log_file(&config.output_log_file)?;
        log_startup(mode_label(&config));

        // 凭据与账号
        let credentials = Arc::new(CredentialStore::open(&config.data_dir).await?);
        let mut account = credentials.load().await;
        if apply_env_overrides(&mut account, &config) {
            // 环境变量带来的改动也落盘（密码重新加密）
            credentials.save(&account).await?;
        }

        // 浏览器
        let remote = account.remote_endpoint();
        let (browser, page) = browser::acquire_browser(&config, remote.as_ref()).await?;
        let driver = PageDriver::new(page);
        let client: Arc<dyn QuizClient> = Arc::new(BrowserClient::new(driver, &config)?);

        // 事件通道与各管理器
        let (sink, events) = EventSink::new();
        let results = Arc::new(ResultWriter::new(config.results_file.clone()));
        let sessions = Arc::new(SessionManager::new(
            client,
            sink.clone(),
            results,
            &config,
        ));

        let launcher = Arc::new(StoreLauncher {
            sessions: sessions.clone(),
            credentials,
        });
        let scheduler = Arc::new(ScheduleManager::new(
            ScheduleStore::new(&config.data_dir),
            launcher,
            sink,
            Duration::from_secs(config.poll_interval_secs),
        ));
        scheduler.load().await;

        let history = HistoryStore::new(&config.data_dir, config.history_cap);

        Ok(Self {
            config,
            account,
            history,
            sessions,
            scheduler,
            events: Some(events),
            _browser: browser,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(mut self) -> Result<()> {
        // 事件泵随应用启动，把会话事件写进运行日志文件
        if let Some(events) = self.events.take() {
            tokio::spawn(pump_events(events, self.config.output_log_file.clone()));
        }

        match self.config.target_url.clone() {
            Some(url) => self.run_once(&url).await,
            None => self.run_scheduler().await,
        }
    }

    /// 一次性模式：对单个题目页立即开一场会话
    async fn run_once(&self, url: &str) -> Result<()> {
        info!("🚀 一次性模式: {}", url);

        // 记入历史
        let mut entries = self.history.load().await;
        self.history.insert(&mut entries, url);
        if let Err(e) = self.history.save(&entries).await {
            warn!("⚠️ 历史记录落盘失败: {}", e);
        }

        let task = Task::one_shot(
            url,
            self.account.email.clone(),
            self.config.candidate_space(),
            chrono::Local::now().naive_local(),
        );
        let mut handle = self.sessions.start_session(&task, &self.account)?;

        // Ctrl+C 时先请求取消，再等会话收束
        let finished = tokio::select! {
            report = handle.wait() => Some(report),
            _ = tokio::signal::ctrl_c() => None,
        };
        let report = match finished {
            Some(report) => report?,
            None => {
                let progress = handle.progress();
                warn!(
                    "⚠️ 收到中断信号，取消当前会话（{}，已尝试 {} 个）...",
                    progress.phase.label(),
                    progress.tried
                );
                handle.cancel();
                handle.wait().await?
            }
        };

        log_session_summary(&report);
        Ok(())
    }

    /// 定时调度模式：轮询计划任务直到被中断
    async fn run_scheduler(&self) -> Result<()> {
        if self.scheduler.task_count().await == 0 {
            warn!("⚠️ 计划任务列表为空，没有可执行的工作，程序结束");
            return Ok(());
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let runner = tokio::spawn(self.scheduler.clone().run(shutdown_rx));

        tokio::signal::ctrl_c().await?;
        warn!("⚠️ 收到中断信号，停止调度器...");
        let _ = shutdown_tx.send(true);
        let _ = runner.await;

        Ok(())
    }
}

/// 由调度器触发会话的发射器
///
/// 每次触发都重新读取凭据，密码只在会话启动瞬间解密；
/// 控制句柄直接丢弃，会话在后台跑完并自行落盘。
struct StoreLauncher {
    sessions: Arc<SessionManager>,
    credentials: Arc<CredentialStore>,
}

#[async_trait]
impl SessionLauncher for StoreLauncher {
    async fn launch(&self, task: &Task) -> AppResult<()> {
        let account = self.credentials.load().await;
        let handle = self.sessions.start_session(task, &account)?;
        debug!("会话 {} 已由计划任务启动", handle.session_id());
        Ok(())
    }
}

/// 事件泵：把会话事件逐条追加到运行日志文件
async fn pump_events(mut events: mpsc::UnboundedReceiver<AppEvent>, log_path: String) {
    use std::io::Write;

    while let Some(event) = events.recv().await {
        let line = match &event {
            AppEvent::Log { timestamp, message } => {
                format!("[{}] {}\n", timestamp.format("%H:%M:%S"), message)
            }
            AppEvent::Attempt(result) => format!(
                "[{}] 候选 {} → {}\n",
                result.timestamp.format("%H:%M:%S"),
                result.candidate,
                result.outcome.as_str()
            ),
            AppEvent::Finished {
                session_id,
                outcome,
            } => format!(
                "[{}] 会话 {} 结束: {}\n",
                chrono::Local::now().format("%H:%M:%S"),
                session_id,
                outcome.as_str()
            ),
        };

        let appended = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(e) = appended {
            debug!("运行日志追加失败: {}", e);
        }
    }
}

// ========== 日志辅助函数 ==========

fn mode_label(config: &Config) -> &'static str {
    if config.target_url.is_some() {
        "一次性答题模式"
    } else {
        "定时调度模式"
    }
}

/// 环境变量里的账号信息优先于已保存配置
fn apply_env_overrides(account: &mut AccountConfig, config: &Config) -> bool {
    let mut changed = false;
    if let Some(email) = &config.email {
        if account.email != *email {
            account.email = email.clone();
            changed = true;
        }
    }
    if let Some(password) = &config.password {
        if account.password != *password {
            account.password = password.clone();
            changed = true;
        }
    }
    changed
}

fn log_session_summary(report: &SessionReport) {
    info!("{}", "=".repeat(60));
    info!("📊 会话统计");
    match report.answer() {
        Some(answer) => info!("✅ 正确答案: {}", answer),
        None => info!("❌ 未找到正确答案 ({})", report.outcome.as_str()),
    }
    info!("已尝试候选: {}/{}", report.tried, report.total);
    info!("耗时: {} 秒", report.elapsed_seconds());
    info!("{}", "=".repeat(60));
}
