use crate::models::space::SpecError;
use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 浏览器客户端错误
    Client(ClientError),
    /// 候选空间定义错误
    Spec(SpecError),
    /// 存储与加密错误
    Store(StoreError),
    /// 会话编排错误
    Session(SessionError),
    /// 定时任务错误
    Schedule(ScheduleError),
    /// 文件操作错误
    File(FileError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Client(e) => write!(f, "客户端错误: {}", e),
            AppError::Spec(e) => write!(f, "候选空间错误: {}", e),
            AppError::Store(e) => write!(f, "存储错误: {}", e),
            AppError::Session(e) => write!(f, "会话错误: {}", e),
            AppError::Schedule(e) => write!(f, "调度错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Client(e) => Some(e),
            AppError::Spec(e) => Some(e),
            AppError::Store(e) => Some(e),
            AppError::Session(e) => Some(e),
            AppError::Schedule(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 浏览器客户端错误
#[derive(Debug)]
pub enum ClientError {
    /// 连接浏览器失败
    ConnectionFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 创建页面失败
    PageCreationFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 导航失败
    NavigationFailed {
        url: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 执行脚本失败
    ScriptExecutionFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 浏览器配置失败
    ConfigurationFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::ConnectionFailed { endpoint, source } => {
                write!(f, "无法连接到浏览器 ({}): {}", endpoint, source)
            }
            ClientError::PageCreationFailed { source } => {
                write!(f, "创建页面失败: {}", source)
            }
            ClientError::NavigationFailed { url, source } => {
                write!(f, "导航到 {} 失败: {}", url, source)
            }
            ClientError::ScriptExecutionFailed { source } => {
                write!(f, "执行脚本失败: {}", source)
            }
            ClientError::ConfigurationFailed { source } => {
                write!(f, "浏览器配置失败: {}", source)
            }
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::ConnectionFailed { source, .. }
            | ClientError::PageCreationFailed { source }
            | ClientError::NavigationFailed { source, .. }
            | ClientError::ScriptExecutionFailed { source }
            | ClientError::ConfigurationFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 存储与加密错误
#[derive(Debug)]
pub enum StoreError {
    /// 密钥文件损坏
    KeyCorrupted {
        path: String,
    },
    /// 加密失败
    EncryptFailed,
    /// 解密失败
    DecryptFailed,
    /// JSON 解析失败
    JsonParseFailed {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::KeyCorrupted { path } => {
                write!(f, "密钥文件损坏: {}", path)
            }
            StoreError::EncryptFailed => write!(f, "密码加密失败"),
            StoreError::DecryptFailed => write!(f, "密码解密失败"),
            StoreError::JsonParseFailed { source } => {
                write!(f, "JSON解析失败: {}", source)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::JsonParseFailed { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 会话编排错误
#[derive(Debug)]
pub enum SessionError {
    /// 已有活动会话，拒绝并发启动
    Busy {
        url: String,
    },
    /// 后台会话任务意外终止
    TaskAborted,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Busy { url } => {
                write!(f, "已有活动会话，无法启动新会话 (目标: {})", url)
            }
            SessionError::TaskAborted => write!(f, "会话任务意外终止"),
        }
    }
}

impl std::error::Error for SessionError {}

/// 定时任务错误
#[derive(Debug)]
pub enum ScheduleError {
    /// 任务不存在
    TaskNotFound {
        id: String,
    },
    /// 无法解析计划时间
    BadDatetime {
        value: String,
    },
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::TaskNotFound { id } => write!(f, "定时任务不存在: {}", id),
            ScheduleError::BadDatetime { value } => {
                write!(f, "无法解析计划时间 (期望 YYYY-MM-DD HH:MM): {}", value)
            }
        }
    }
}

impl std::error::Error for ScheduleError {}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 文件不存在
    NotFound {
        path: String,
    },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "文件不存在: {}", path),
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. } | FileError::WriteFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<chromiumoxide::error::CdpError> for AppError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AppError::Client(ClientError::ScriptExecutionFailed {
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Store(StoreError::JsonParseFailed {
            source: Box::new(err),
        })
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<SpecError> for AppError {
    fn from(err: SpecError) -> Self {
        AppError::Spec(err)
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建浏览器连接错误
    pub fn connection_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Client(ClientError::ConnectionFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建会话占用错误
    pub fn session_busy(url: impl Into<String>) -> Self {
        AppError::Session(SessionError::Busy { url: url.into() })
    }

    /// 创建任务不存在错误
    pub fn task_not_found(id: impl fmt::Display) -> Self {
        AppError::Schedule(ScheduleError::TaskNotFound { id: id.to_string() })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
