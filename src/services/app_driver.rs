//! 外部程序驱动 - 业务能力层
//!
//! 在桌面原语之上组合出"操作一个外部程序实例"的能力：
//! 启动（含启动对话框处理）、查找主窗口、激活、发送指令序列、读取剪贴板、终止。
//! 所有等待时间都来自 `Timing`，不在这里写死。

use std::path::{Path, PathBuf};

use regex::Regex;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use crate::config::{Config, Timing};
use crate::error::{ConfigError, DesktopError, InstanceError};
use crate::infrastructure::{Desktop, LaunchCommand};
use crate::models::{Pid, Termination, WindowId};
use crate::services::command_sequence::KeyStep;

const SELECT_ALL: &str = "ctrl+a";
const COPY: &str = "ctrl+c";

/// 启动错误对话框的探测结果
#[derive(Debug)]
pub enum DialogScan {
    /// 找到了标题匹配的对话框
    Found(WindowId),
    /// 没有对话框（正常情况）
    NotFound,
    /// 探测本身失败
    Error(DesktopError),
}

/// 外部程序驱动
pub struct AppDriver<D> {
    desktop: D,
    app_path: PathBuf,
    launch_prefix: Vec<String>,
    main_pattern: Regex,
    dialog_pattern: Regex,
    dismiss_key: String,
    timing: Timing,
}

impl<D: Desktop> AppDriver<D> {
    pub fn new(desktop: D, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self {
            desktop,
            app_path: config.app_path.clone(),
            launch_prefix: config.launch_prefix.clone(),
            main_pattern: config.main_window_regex()?,
            dialog_pattern: config.dialog_regex()?,
            dismiss_key: config.dismiss_key.clone(),
            timing: config.timing.clone(),
        })
    }

    pub fn desktop(&self) -> &D {
        &self.desktop
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// 以输入文件为参数启动外部程序，并关闭启动时弹出的错误对话框
    pub async fn launch(&self, artifact: &Path) -> Result<Pid, InstanceError> {
        let command = LaunchCommand::new(&self.launch_prefix, &self.app_path, artifact);
        let pid = self
            .desktop
            .spawn(&command)
            .await
            .map_err(|source| InstanceError::Launch {
                artifact: artifact.to_path_buf(),
                source,
            })?;

        sleep(self.timing.launch_settle).await;

        let dismissed = self.dismiss_startup_dialogs(pid).await;
        if dismissed > 0 {
            debug!("进程 {} 关闭了 {} 个启动对话框", pid, dismissed);
        }

        Ok(pid)
    }

    /// 有限次数地关闭启动对话框，返回关闭的数量
    ///
    /// 没有对话框时立即结束
    pub async fn dismiss_startup_dialogs(&self, pid: Pid) -> u32 {
        let mut dismissed = 0;

        for attempt in 1..=self.timing.dialog_attempts {
            match self.scan_error_dialog(pid).await {
                DialogScan::Found(dialog) => {
                    debug!(
                        "进程 {} 发现启动对话框 {} (第 {}/{} 次)",
                        pid, dialog, attempt, self.timing.dialog_attempts
                    );
                    let result = async {
                        self.desktop.activate(dialog).await?;
                        self.desktop.send_keys(&self.dismiss_key).await
                    }
                    .await;
                    match result {
                        Ok(()) => dismissed += 1,
                        Err(e) => warn!("进程 {} 关闭对话框失败: {}", pid, e),
                    }
                    sleep(self.timing.dialog_settle).await;
                }
                DialogScan::NotFound => break,
                DialogScan::Error(e) => {
                    warn!("进程 {} 探测启动对话框失败: {}", pid, e);
                    break;
                }
            }
        }

        dismissed
    }

    /// 在该进程自己的窗口中查找标题匹配的错误对话框
    pub async fn scan_error_dialog(&self, pid: Pid) -> DialogScan {
        let windows = match self.desktop.windows_of(pid).await {
            Ok(w) => w,
            Err(e) => return DialogScan::Error(e),
        };

        for window in windows {
            match self.desktop.window_title(window).await {
                Ok(title) if self.dialog_pattern.is_match(&title) => {
                    return DialogScan::Found(window);
                }
                Ok(_) => {}
                Err(e) => return DialogScan::Error(e),
            }
        }

        DialogScan::NotFound
    }

    /// 轮询查找该进程的主窗口
    ///
    /// 只在该进程自己的窗口里找，同时运行的其他实例标题相同也不会混淆；
    /// 同一进程的其他窗口（启动画面、输入法窗口、错误对话框）靠标题排除。
    /// 超时时间为零时也至少查找一次。
    pub async fn locate_window(&self, pid: Pid) -> Result<WindowId, InstanceError> {
        let deadline = Instant::now() + self.timing.window_timeout;

        loop {
            match self.find_main_window(pid).await {
                Ok(Some(window)) => return Ok(window),
                Ok(None) => {}
                Err(e) => debug!("进程 {} 查找窗口出错: {}", pid, e),
            }

            if !self.desktop.is_alive(pid).await {
                return Err(InstanceError::ExitedEarly { pid });
            }

            if Instant::now() >= deadline {
                return Err(InstanceError::WindowNotFound {
                    pid,
                    timeout: self.timing.window_timeout,
                });
            }

            sleep(self.timing.window_poll_interval).await;
        }
    }

    async fn find_main_window(&self, pid: Pid) -> Result<Option<WindowId>, DesktopError> {
        for window in self.desktop.windows_of(pid).await? {
            let title = self.desktop.window_title(window).await?;
            if self.main_pattern.is_match(&title) && !self.dialog_pattern.is_match(&title) {
                return Ok(Some(window));
            }
            debug!("进程 {} 跳过窗口 {} \"{}\"", pid, window, title);
        }
        Ok(None)
    }

    /// 激活窗口，模拟按键之前必须调用
    pub async fn focus(&self, window: WindowId) -> Result<(), DesktopError> {
        self.desktop.activate(window).await?;
        sleep(self.timing.focus_settle).await;
        Ok(())
    }

    /// 按顺序发送指令序列
    pub async fn send_sequence(&self, steps: &[KeyStep]) -> Result<(), InstanceError> {
        for step in steps {
            for _ in 0..step.repeat {
                self.desktop
                    .send_keys(&step.keys)
                    .await
                    .map_err(|source| InstanceError::Command {
                        step: step.to_string(),
                        source,
                    })?;
                sleep(step.settle()).await;
            }
        }
        Ok(())
    }

    /// 在当前焦点窗口中全选并复制，然后读取剪贴板
    ///
    /// 复制前先清空剪贴板，避免读到上一个实例的内容
    pub async fn read_clipboard(&self) -> Result<String, DesktopError> {
        self.desktop.clear_clipboard().await?;
        self.desktop.send_keys(SELECT_ALL).await?;
        sleep(self.timing.clipboard_settle).await;
        self.desktop.send_keys(COPY).await?;
        sleep(self.timing.clipboard_settle).await;
        self.desktop.read_clipboard().await
    }

    /// 终止进程：先正常关闭窗口，宽限期后仍在运行则强制结束
    pub async fn terminate(
        &self,
        pid: Pid,
        window: Option<WindowId>,
    ) -> Result<Termination, DesktopError> {
        if !self.desktop.is_alive(pid).await {
            return Ok(Termination::AlreadyExited);
        }

        if let Some(window) = window {
            match self.desktop.close_window(window).await {
                Ok(()) => {
                    sleep(self.timing.close_grace).await;
                    if !self.desktop.is_alive(pid).await {
                        return Ok(Termination::Graceful);
                    }
                    debug!("进程 {} 在宽限期后仍在运行，强制结束", pid);
                }
                Err(e) => warn!("进程 {} 正常关闭失败: {}", pid, e),
            }
        }

        self.desktop.kill(pid).await?;
        Ok(Termination::ForceKilled)
    }
}
