//! 测试用的脚本化桌面后端
//!
//! 不启动任何真实进程：每个"进程"有一个主窗口，可以配置启动对话框、
//! 辅助窗口、找不到窗口、按键失败、剪贴板为空或读取失败、忽略关闭请求、
//! 无法强制结束、主窗口中途重建等行为。

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::time::Instant;

use conductance_batch::{
    CommandSequences, Config, Desktop, DesktopError, KeyStep, LaunchCommand, Pid, Timing, WindowId,
};

/// 单个样本的模拟行为
#[derive(Debug, Clone, Default)]
pub struct Behavior {
    pub fail_spawn: bool,
    pub exit_immediately: bool,
    pub no_window: bool,
    pub startup_dialogs: u32,
    pub fail_keys: bool,
    pub empty_clipboard: bool,
    pub fail_clipboard: bool,
    pub ignore_close: bool,
    pub fail_kill: bool,
    /// 同一进程还有一个标题无关的窗口，列在最前面
    pub helper_window: bool,
    /// 第一次复制之后主窗口被销毁并以新 id 重建
    pub reopen_window: bool,
}

/// 记录下来的事件，用于检查阶段顺序
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Spawn(String),
    Keys(String, String),
    Copy(String),
    Close(String),
    Kill(String),
}

#[derive(Debug)]
struct FakeProcess {
    name: String,
    alive: bool,
    main_window: Option<WindowId>,
    helper: Option<WindowId>,
    dialogs: Vec<WindowId>,
    view: &'static str,
    reopened: bool,
}

#[derive(Debug, Default)]
struct State {
    next_pid: u32,
    next_dialog: u64,
    behaviors: HashMap<String, Behavior>,
    processes: HashMap<Pid, FakeProcess>,
    focused: Option<WindowId>,
    clipboard: String,
    live: usize,
    max_live: usize,
    events: Vec<Event>,
    times: Vec<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedDesktop {
    state: Arc<Mutex<State>>,
}

const MAIN_WINDOW_BASE: u64 = 0x1000;
const DIALOG_BASE: u64 = 0x9000;
const HELPER_BASE: u64 = 0x3000;
const REOPEN_BASE: u64 = 0x5000;

impl ScriptedDesktop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, name: &str, behavior: Behavior) -> Self {
        self.lock().behaviors.insert(name.to_string(), behavior);
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn live(&self) -> usize {
        self.lock().live
    }

    pub fn max_live(&self) -> usize {
        self.lock().max_live
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    pub fn spawned(&self) -> usize {
        self.lock()
            .events
            .iter()
            .filter(|e| matches!(e, Event::Spawn(_)))
            .count()
    }

    pub fn pid_of(&self, name: &str) -> Option<Pid> {
        self.lock()
            .processes
            .iter()
            .find(|(_, p)| p.name == name)
            .map(|(pid, _)| *pid)
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.lock()
            .processes
            .values()
            .any(|p| p.name == name && p.alive)
    }

    pub fn remaining_dialogs(&self, pid: Pid) -> usize {
        self.lock()
            .processes
            .get(&pid)
            .map(|p| p.dialogs.len())
            .unwrap_or(0)
    }

    /// 第一个满足条件的事件下标
    pub fn position(&self, pred: impl Fn(&Event) -> bool) -> Option<usize> {
        self.lock().events.iter().position(pred)
    }

    /// 最后一个满足条件的事件下标
    pub fn last_position(&self, pred: impl Fn(&Event) -> bool) -> Option<usize> {
        self.lock().events.iter().rposition(pred)
    }

    /// 第 `index` 个事件发生时的（虚拟）时间
    pub fn time_of(&self, index: usize) -> Instant {
        self.lock().times[index]
    }

    pub fn main_window_of(&self, pid: Pid) -> Option<WindowId> {
        self.lock().processes.get(&pid).and_then(|p| p.main_window)
    }

    fn record(state: &mut State, event: Event) {
        state.events.push(event);
        state.times.push(Instant::now());
    }

    fn owner_of(state: &State, window: WindowId) -> Option<Pid> {
        state
            .processes
            .iter()
            .find(|(_, p)| {
                p.main_window == Some(window)
                    || p.helper == Some(window)
                    || p.dialogs.contains(&window)
            })
            .map(|(pid, _)| *pid)
    }

    fn stop(state: &mut State, pid: Pid) {
        if let Some(p) = state.processes.get_mut(&pid) {
            if p.alive {
                p.alive = false;
                state.live -= 1;
            }
        }
    }
}

fn base_name(command: &LaunchCommand) -> String {
    command
        .args
        .last()
        .and_then(|a| Path::new(a).file_stem())
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn tool_failed(reason: &str) -> DesktopError {
    DesktopError::ToolFailed {
        tool: "scripted".to_string(),
        status: Some(1),
        stderr: reason.to_string(),
    }
}

impl Desktop for ScriptedDesktop {
    async fn spawn(&self, command: &LaunchCommand) -> Result<Pid, DesktopError> {
        let name = base_name(command);
        let mut state = self.lock();
        let behavior = state.behaviors.get(&name).cloned().unwrap_or_default();

        if behavior.fail_spawn {
            return Err(DesktopError::Spawn {
                program: command.program.to_string_lossy().into_owned(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such program"),
            });
        }

        state.next_pid += 1;
        let pid = Pid(state.next_pid);
        let mut dialogs = Vec::new();
        for _ in 0..behavior.startup_dialogs {
            state.next_dialog += 1;
            dialogs.push(WindowId(DIALOG_BASE + state.next_dialog));
        }

        let alive = !behavior.exit_immediately;
        if alive {
            state.live += 1;
            state.max_live = state.max_live.max(state.live);
        }

        state.processes.insert(
            pid,
            FakeProcess {
                name: name.clone(),
                alive,
                main_window: (!behavior.no_window).then_some(WindowId(MAIN_WINDOW_BASE + pid.0 as u64)),
                helper: behavior.helper_window.then_some(WindowId(HELPER_BASE + pid.0 as u64)),
                dialogs,
                view: "none",
                reopened: false,
            },
        );
        Self::record(&mut state, Event::Spawn(name));
        Ok(pid)
    }

    async fn windows_of(&self, pid: Pid) -> Result<Vec<WindowId>, DesktopError> {
        let state = self.lock();
        let Some(p) = state.processes.get(&pid).filter(|p| p.alive) else {
            return Ok(Vec::new());
        };
        let mut windows: Vec<WindowId> = p.helper.into_iter().collect();
        windows.extend(p.dialogs.iter().copied());
        windows.extend(p.main_window);
        Ok(windows)
    }

    async fn window_title(&self, window: WindowId) -> Result<String, DesktopError> {
        let state = self.lock();
        let pid = Self::owner_of(&state, window).ok_or_else(|| tool_failed("no such window"))?;
        let p = &state.processes[&pid];
        if p.dialogs.contains(&window) {
            Ok("Error".to_string())
        } else if p.helper == Some(window) {
            Ok("Default IME".to_string())
        } else {
            Ok(format!("VacTran - {}", p.name))
        }
    }

    async fn activate(&self, window: WindowId) -> Result<(), DesktopError> {
        let mut state = self.lock();
        let pid = Self::owner_of(&state, window).ok_or_else(|| tool_failed("no such window"))?;
        if !state.processes[&pid].alive {
            return Err(tool_failed("window gone"));
        }
        state.focused = Some(window);
        Ok(())
    }

    async fn send_keys(&self, keys: &str) -> Result<(), DesktopError> {
        let mut state = self.lock();
        let window = state.focused.ok_or_else(|| tool_failed("nothing focused"))?;
        let pid = Self::owner_of(&state, window).ok_or_else(|| tool_failed("focus lost"))?;
        let name = state.processes[&pid].name.clone();
        let behavior = state.behaviors.get(&name).cloned().unwrap_or_default();

        // 对话框上按键等于关闭对话框
        if state.processes[&pid].dialogs.contains(&window) {
            let p = state.processes.get_mut(&pid).unwrap();
            p.dialogs.retain(|d| *d != window);
            state.focused = None;
            return Ok(());
        }

        if behavior.fail_keys {
            return Err(tool_failed("keys rejected"));
        }

        Self::record(&mut state, Event::Keys(name.clone(), keys.to_string()));
        match keys {
            "2" => state.processes.get_mut(&pid).unwrap().view = "main",
            "6" => state.processes.get_mut(&pid).unwrap().view = "series",
            "ctrl+c" => {
                // 复制不到内容时剪贴板保持原样
                if !behavior.empty_clipboard {
                    let view = state.processes[&pid].view;
                    state.clipboard = format!("{} {} text\n", name, view);
                }
                Self::record(&mut state, Event::Copy(name));

                let p = state.processes.get_mut(&pid).unwrap();
                if behavior.reopen_window && !p.reopened {
                    p.reopened = true;
                    p.main_window = Some(WindowId(REOPEN_BASE + pid.0 as u64));
                    state.focused = None;
                }
            }
            _ => {}
        }
        Ok(())
    }

    async fn clear_clipboard(&self) -> Result<(), DesktopError> {
        self.lock().clipboard.clear();
        Ok(())
    }

    async fn read_clipboard(&self) -> Result<String, DesktopError> {
        let state = self.lock();
        let failing = state
            .focused
            .and_then(|w| Self::owner_of(&state, w))
            .map(|pid| &state.processes[&pid].name)
            .and_then(|name| state.behaviors.get(name))
            .map(|b| b.fail_clipboard)
            .unwrap_or(false);
        if failing {
            return Err(DesktopError::Clipboard("clipboard owner vanished".to_string()));
        }
        Ok(state.clipboard.clone())
    }

    async fn close_window(&self, window: WindowId) -> Result<(), DesktopError> {
        let mut state = self.lock();
        let pid = Self::owner_of(&state, window).ok_or_else(|| tool_failed("no such window"))?;
        let name = state.processes[&pid].name.clone();
        let ignore = state
            .behaviors
            .get(&name)
            .map(|b| b.ignore_close)
            .unwrap_or(false);

        Self::record(&mut state, Event::Close(name));
        if !ignore {
            Self::stop(&mut state, pid);
        }
        Ok(())
    }

    async fn is_alive(&self, pid: Pid) -> bool {
        self.lock()
            .processes
            .get(&pid)
            .map(|p| p.alive)
            .unwrap_or(false)
    }

    async fn kill(&self, pid: Pid) -> Result<(), DesktopError> {
        let mut state = self.lock();
        let name = state
            .processes
            .get(&pid)
            .map(|p| p.name.clone())
            .ok_or(DesktopError::UnknownProcess(pid))?;
        let refuse = state
            .behaviors
            .get(&name)
            .map(|b| b.fail_kill)
            .unwrap_or(false);

        Self::record(&mut state, Event::Kill(name));
        if refuse {
            return Err(DesktopError::Process {
                pid,
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "operation not permitted"),
            });
        }
        Self::stop(&mut state, pid);
        Ok(())
    }
}

/// 测试配置：所有等待为零
pub fn test_config(input_dir: &Path, output_dir: &Path, concurrency: usize) -> Config {
    Config {
        input_dir: input_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        concurrency,
        app_path: "VacTran.exe".into(),
        timing: Timing::immediate(),
        sequences: without_settle(CommandSequences::default()),
        ..Config::default()
    }
}

/// 去掉按键之间的等待，保留按键本身
pub fn without_settle(mut sequences: CommandSequences) -> CommandSequences {
    let strip = |steps: &mut Vec<KeyStep>| steps.iter_mut().for_each(|s| s.settle_ms = 0);
    strip(&mut sequences.trigger);
    strip(&mut sequences.export_primary);
    strip(&mut sequences.export_model);
    sequences
}

/// 在目录中创建若干个输入文件
pub fn create_artifacts(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(format!("{}.vtser", name)), "series").unwrap();
    }
}

/// 目录下按名称排序的文件列表
pub fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
