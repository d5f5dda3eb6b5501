//! 桌面能力 - 基础设施层
//!
//! 只暴露宿主机的原语能力：进程、窗口、按键、剪贴板。
//! 不认识 WorkItem，不处理流程，也不做任何等待。

use std::ffi::OsString;

use crate::error::DesktopError;
use crate::models::{Pid, WindowId};

/// 启动命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl LaunchCommand {
    /// `[prefix..., app, artifact]`，有前缀时由前缀程序启动外部程序
    pub fn new(prefix: &[String], app: impl Into<OsString>, artifact: impl Into<OsString>) -> Self {
        let mut argv: Vec<OsString> = prefix.iter().map(OsString::from).collect();
        argv.push(app.into());
        argv.push(artifact.into());
        let program = argv.remove(0);
        Self {
            program,
            args: argv,
        }
    }
}

/// 桌面后端
///
/// 输入焦点和剪贴板都是整台机器共享的，调用方必须保证顺序调用
#[allow(async_fn_in_trait)]
pub trait Desktop {
    /// 启动进程
    async fn spawn(&self, command: &LaunchCommand) -> Result<Pid, DesktopError>;

    /// 列出属于该进程的可见顶层窗口
    async fn windows_of(&self, pid: Pid) -> Result<Vec<WindowId>, DesktopError>;

    /// 读取窗口标题
    async fn window_title(&self, window: WindowId) -> Result<String, DesktopError>;

    /// 激活窗口并获取输入焦点
    async fn activate(&self, window: WindowId) -> Result<(), DesktopError>;

    /// 向当前焦点窗口发送一个按键组合
    async fn send_keys(&self, keys: &str) -> Result<(), DesktopError>;

    /// 清空剪贴板
    async fn clear_clipboard(&self) -> Result<(), DesktopError>;

    /// 读取剪贴板文本
    async fn read_clipboard(&self) -> Result<String, DesktopError>;

    /// 请求窗口正常关闭
    async fn close_window(&self, window: WindowId) -> Result<(), DesktopError>;

    /// 进程是否仍在运行
    async fn is_alive(&self, pid: Pid) -> bool;

    /// 强制结束进程并回收
    async fn kill(&self, pid: Pid) -> Result<(), DesktopError>;
}
