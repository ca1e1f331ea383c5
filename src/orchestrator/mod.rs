//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责会话生命周期与计划调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用编排
//! - 管理应用生命周期（初始化、运行、收束）
//! - 装配浏览器、凭据存储与各管理器
//! - 决定运行模式（一次性 / 定时调度）
//! - 把会话事件泵进运行日志
//!
//! ### `session_manager` - 会话管理器
//! - 单会话互斥（Semaphore(1)）
//! - 组装并 spawn 会话流程
//! - 暴露取消 / 进度 / 等待的控制句柄
//! - 会话终态落盘到结果文件
//!
//! ### `scheduler` - 计划调度器
//! - 维护计划任务列表（登记 / 移除 / 恢复）
//! - 按到期窗口触发会话
//! - 周期任务推进与一次性任务移除
//!
//! ## 层次关系
//!
//! ```text
//! app (装配资源、选模式)
//!     ↓
//! scheduler (何时开一场会话)  →  session_manager (同时最多一场)
//!     ↓
//! workflow::SessionFlow (一场会话怎么跑)
//!     ↓
//! services (能力层：quiz_client / credential / history / schedule / result)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：scheduler 管何时，session_manager 管同时几场
//! 2. **资源隔离**：只有编排层持有 Browser
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体答题判断

pub mod app;
pub mod scheduler;
pub mod session_manager;

// 重新导出主要类型
pub use app::App;
pub use scheduler::{ScheduleManager, SessionLauncher};
pub use session_manager::{SessionHandle, SessionManager};
