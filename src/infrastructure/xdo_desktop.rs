//! X11 桌面后端
//!
//! 窗口查找、激活和按键通过 `xdotool` 完成，剪贴板通过 `copypasta` 读取。
//! 持有所有启动的子进程，子进程设置了 kill_on_drop，后端被丢弃时不会遗留进程。

use std::collections::HashMap;
use std::process::{Output, Stdio};
use std::sync::Mutex;
use std::time::Duration;

use copypasta::{ClipboardContext, ClipboardProvider};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::DesktopError;
use crate::infrastructure::desktop::{Desktop, LaunchCommand};
use crate::models::{Pid, WindowId};

const XDOTOOL: &str = "xdotool";

/// xdotool + copypasta 实现的桌面后端
pub struct XdoDesktop {
    children: Mutex<HashMap<Pid, Child>>,
    tool_timeout: Duration,
}

impl XdoDesktop {
    pub fn new(tool_timeout: Duration) -> Self {
        Self {
            children: Mutex::new(HashMap::new()),
            tool_timeout,
        }
    }

    fn children(&self) -> std::sync::MutexGuard<'_, HashMap<Pid, Child>> {
        self.children.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 执行 xdotool，返回原始输出
    async fn xdotool(&self, args: &[&str]) -> Result<Output, DesktopError> {
        debug!("xdotool {}", args.join(" "));

        let child = Command::new(XDOTOOL)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DesktopError::Spawn {
                program: XDOTOOL.to_string(),
                source,
            })?;

        match tokio::time::timeout(self.tool_timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| DesktopError::Spawn {
                program: XDOTOOL.to_string(),
                source,
            }),
            Err(_) => Err(DesktopError::ToolTimeout {
                tool: format!("{} {}", XDOTOOL, args.first().unwrap_or(&"")),
                timeout: self.tool_timeout,
            }),
        }
    }

    /// 执行 xdotool，非零状态视为错误
    async fn xdotool_ok(&self, args: &[&str]) -> Result<String, DesktopError> {
        let output = self.xdotool(args).await?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            Err(DesktopError::ToolFailed {
                tool: format!("{} {}", XDOTOOL, args.first().unwrap_or(&"")),
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

impl Desktop for XdoDesktop {
    async fn spawn(&self, command: &LaunchCommand) -> Result<Pid, DesktopError> {
        let program = command.program.to_string_lossy().into_owned();

        let child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| DesktopError::Spawn {
                program: program.clone(),
                source,
            })?;

        let pid = child.id().map(Pid).ok_or_else(|| DesktopError::ToolFailed {
            tool: program,
            status: None,
            stderr: "进程启动后立即退出".to_string(),
        })?;

        self.children().insert(pid, child);
        Ok(pid)
    }

    async fn windows_of(&self, pid: Pid) -> Result<Vec<WindowId>, DesktopError> {
        let pid_arg = pid.to_string();
        let output = self
            .xdotool(&["search", "--onlyvisible", "--pid", &pid_arg])
            .await?;

        // 没有匹配窗口时 xdotool 返回 1 且没有输出
        if !output.status.success() && output.stdout.is_empty() {
            return Ok(Vec::new());
        }

        let windows = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| line.trim().parse::<u64>().ok())
            .map(WindowId)
            .collect();
        Ok(windows)
    }

    async fn window_title(&self, window: WindowId) -> Result<String, DesktopError> {
        let id = window.0.to_string();
        self.xdotool_ok(&["getwindowname", &id]).await
    }

    async fn activate(&self, window: WindowId) -> Result<(), DesktopError> {
        let id = window.0.to_string();
        self.xdotool_ok(&["windowactivate", "--sync", &id]).await?;
        Ok(())
    }

    async fn send_keys(&self, keys: &str) -> Result<(), DesktopError> {
        let mut args = vec!["key", "--clearmodifiers"];
        args.extend(keys.split_whitespace());
        self.xdotool_ok(&args).await?;
        Ok(())
    }

    async fn clear_clipboard(&self) -> Result<(), DesktopError> {
        tokio::task::spawn_blocking(|| {
            let mut ctx = ClipboardContext::new().map_err(|e| e.to_string())?;
            ctx.set_contents(String::new()).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| DesktopError::Clipboard(e.to_string()))?
        .map_err(DesktopError::Clipboard)
    }

    async fn read_clipboard(&self) -> Result<String, DesktopError> {
        tokio::task::spawn_blocking(|| {
            let mut ctx = ClipboardContext::new().map_err(|e| e.to_string())?;
            ctx.get_contents().map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| DesktopError::Clipboard(e.to_string()))?
        .map_err(DesktopError::Clipboard)
    }

    async fn close_window(&self, window: WindowId) -> Result<(), DesktopError> {
        let id = window.0.to_string();
        self.xdotool_ok(&[
            "windowactivate",
            "--sync",
            &id,
            "key",
            "--clearmodifiers",
            "alt+F4",
        ])
        .await?;
        Ok(())
    }

    /// 已退出的子进程在这里回收，不再留在表里
    async fn is_alive(&self, pid: Pid) -> bool {
        let mut children = self.children();
        let Some(child) = children.get_mut(&pid) else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                debug!("进程 {} 已退出 ({})", pid, status);
                children.remove(&pid);
                false
            }
            Err(e) => {
                warn!("无法查询进程 {} 状态: {}", pid, e);
                true
            }
        }
    }

    async fn kill(&self, pid: Pid) -> Result<(), DesktopError> {
        let child = self.children().remove(&pid);
        let mut child = child.ok_or(DesktopError::UnknownProcess(pid))?;
        child
            .kill()
            .await
            .map_err(|source| DesktopError::Process { pid, source })
    }
}
