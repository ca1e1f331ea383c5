//! # Quiz Answer Brute
//!
//! 一个对单道客观题暴力穷举答案的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 唯一的 page owner，提供 goto() / eval() 能力
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个候选
//! - `BrowserClient` - 登录 / 打开题目页 / 提交 / 校验反馈能力
//! - `CredentialStore` - 账号凭据加密存取能力
//! - `HistoryStore` / `ScheduleStore` - 历史与计划任务的落盘能力
//! - `ResultWriter` - 写结果 CSV 能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一场会话"的完整执行流程
//! - `SessionCtx` - 上下文封装（session_id + url + 节奏参数）
//! - `SessionFlow` - 流程编排（login → open → submit → verify）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/session_manager` - 会话管理器，单会话互斥
//! - `orchestrator/scheduler` - 计划调度器，按到期窗口触发
//! - `orchestrator/app` - 应用装配与运行模式选择
//!
//! 候选空间的枚举（`generator/`）与领域模型（`models/`）不依赖任何
//! 浏览器资源，可独立测试。

pub mod browser;
pub mod config;
pub mod error;
pub mod generator;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::acquire_browser;
pub use config::Config;
pub use error::{AppError, AppResult};
pub use generator::CandidateGenerator;
pub use infrastructure::PageDriver;
pub use models::{Candidate, CandidateSpace, SessionOutcome, SessionReport, Task};
pub use orchestrator::{App, ScheduleManager, SessionHandle, SessionManager};
pub use workflow::{SessionCtx, SessionFlow};
