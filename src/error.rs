//! 错误类型
//!
//! - `DesktopError`：桌面后端原语（进程、窗口、按键、剪贴板）失败
//! - `InstanceError`：单个样本实例的失败，只影响该样本，不中断批次
//! - `ConfigError`：配置错误
//! - `AppError`：整次运行级别的致命错误

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::models::Pid;

/// 桌面后端错误
#[derive(Debug, Error)]
pub enum DesktopError {
    /// 无法启动进程或外部工具
    #[error("无法启动 {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// 外部工具返回非零状态
    #[error("{tool} 执行失败 (状态: {status:?}): {stderr}")]
    ToolFailed {
        tool: String,
        status: Option<i32>,
        stderr: String,
    },

    /// 外部工具超时
    #[error("{tool} 执行超时 ({timeout:?})")]
    ToolTimeout { tool: String, timeout: Duration },

    /// 剪贴板访问失败
    #[error("剪贴板错误: {0}")]
    Clipboard(String),

    /// 未登记的进程
    #[error("未知进程: {0}")]
    UnknownProcess(Pid),

    /// 进程操作失败（kill / wait）
    #[error("进程 {pid} 操作失败: {source}")]
    Process {
        pid: Pid,
        #[source]
        source: std::io::Error,
    },
}

/// 失败分类，写入运行报告
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Launch,
    Command,
    Extraction,
    Cleanup,
}

/// 单个样本实例错误
#[derive(Debug, Error)]
pub enum InstanceError {
    /// 进程没有启动
    #[error("启动失败 ({artifact}): {source}")]
    Launch {
        artifact: PathBuf,
        #[source]
        source: DesktopError,
    },

    /// 在超时时间内没有找到主窗口
    #[error("进程 {pid} 的主窗口未出现 (超时 {timeout:?})")]
    WindowNotFound { pid: Pid, timeout: Duration },

    /// 进程在找到主窗口之前退出
    #[error("进程 {pid} 在主窗口出现之前已退出")]
    ExitedEarly { pid: Pid },

    /// 指令发送失败
    #[error("指令发送失败 [{step}]: {source}")]
    Command {
        step: String,
        #[source]
        source: DesktopError,
    },

    /// 读取剪贴板失败
    #[error("读取 {target} 数据失败: {source}")]
    Clipboard {
        target: String,
        #[source]
        source: DesktopError,
    },

    /// 剪贴板内容为空
    #[error("{target} 数据为空")]
    EmptyClipboard { target: String },

    /// 写入结果文件失败
    #[error("写入文件失败 ({}): {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 关闭进程失败
    #[error("关闭进程 {pid} 失败: {source}")]
    Cleanup {
        pid: Pid,
        #[source]
        source: DesktopError,
    },
}

impl InstanceError {
    pub fn kind(&self) -> FailureKind {
        match self {
            InstanceError::Launch { .. }
            | InstanceError::WindowNotFound { .. }
            | InstanceError::ExitedEarly { .. } => FailureKind::Launch,
            InstanceError::Command { .. } => FailureKind::Command,
            InstanceError::Clipboard { .. }
            | InstanceError::EmptyClipboard { .. }
            | InstanceError::Write { .. } => FailureKind::Extraction,
            InstanceError::Cleanup { .. } => FailureKind::Cleanup,
        }
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 并发数必须大于 0
    #[error("并发数必须大于 0")]
    ZeroConcurrency,

    /// 正则表达式无效
    #[error("错误对话框标题正则无效 '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// 配置文件读取失败
    #[error("无法读取配置文件 {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 配置文件解析失败
    #[error("无法解析配置文件 {}: {source}", path.display())]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },

    /// 指令序列为空
    #[error("指令序列 {0} 不能为空")]
    EmptySequence(&'static str),
}

/// 运行级错误
#[derive(Debug, Error)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 输入目录不存在
    #[error("输入目录不存在: {}", .0.display())]
    InputDirNotFound(PathBuf),

    /// 读取输入目录失败
    #[error("无法读取输入目录 {}: {source}", path.display())]
    InputDirUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 创建输出目录失败
    #[error("无法创建输出目录 {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 写入运行报告失败
    #[error("无法写入运行报告 {}: {source}", path.display())]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("报告序列化失败: {0}")]
    Json(#[from] serde_json::Error),
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_mapping() {
        let timeout = InstanceError::WindowNotFound {
            pid: Pid(7),
            timeout: Duration::from_secs(20),
        };
        assert_eq!(timeout.kind(), FailureKind::Launch);

        let empty = InstanceError::EmptyClipboard {
            target: "主数据".to_string(),
        };
        assert_eq!(empty.kind(), FailureKind::Extraction);

        let command = InstanceError::Command {
            step: "alt+w".to_string(),
            source: DesktopError::UnknownProcess(Pid(1)),
        };
        assert_eq!(command.kind(), FailureKind::Command);

        let cleanup = InstanceError::Cleanup {
            pid: Pid(3),
            source: DesktopError::Clipboard("x".to_string()),
        };
        assert_eq!(cleanup.kind(), FailureKind::Cleanup);
    }

    #[test]
    fn test_failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::Extraction).unwrap();
        assert_eq!(json, "\"extraction\"");
    }
}
