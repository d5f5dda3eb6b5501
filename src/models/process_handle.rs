//! 单个外部程序实例的句柄与状态机
//!
//! ```text
//! Launching → WindowFound → CommandsSent → DataExtracted → Closed
//!     └───────────┴──────────────┴──→ Failed ──→ Closed
//! ```

use std::fmt;

use serde::Serialize;

use crate::error::InstanceError;
use crate::models::WorkItem;

/// 操作系统进程号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Pid(pub u32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 顶层窗口引用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// 实例状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceState {
    Launching,
    WindowFound,
    CommandsSent,
    DataExtracted,
    Failed,
    Closed,
}

impl InstanceState {
    /// 是否允许从当前状态转移到 `next`
    pub fn can_transition_to(self, next: InstanceState) -> bool {
        use InstanceState::*;
        matches!(
            (self, next),
            (Launching, WindowFound)
                | (WindowFound, CommandsSent)
                | (CommandsSent, DataExtracted)
                | (DataExtracted, Closed)
                | (Launching | WindowFound | CommandsSent, Failed)
                | (Failed, Closed)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == InstanceState::Closed
    }
}

/// 终止方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// 进程从未启动
    NotStarted,
    /// 关闭前进程已退出
    AlreadyExited,
    /// 窗口正常关闭
    Graceful,
    /// 宽限期后强制结束
    ForceKilled,
    /// 强制结束也失败
    KillFailed,
}

/// 进程句柄
///
/// 每个 WorkItem 在一次运行中只对应一个句柄，不复用、不重试
#[derive(Debug)]
pub struct ProcessHandle {
    item: WorkItem,
    batch: usize,
    pid: Option<Pid>,
    window: Option<WindowId>,
    state: InstanceState,
    history: Vec<InstanceState>,
    failure: Option<InstanceError>,
    termination: Option<Termination>,
    cleanup_error: Option<InstanceError>,
}

impl ProcessHandle {
    pub fn new(item: WorkItem, batch: usize) -> Self {
        Self {
            item,
            batch,
            pid: None,
            window: None,
            state: InstanceState::Launching,
            history: vec![InstanceState::Launching],
            failure: None,
            termination: None,
            cleanup_error: None,
        }
    }

    pub fn item(&self) -> &WorkItem {
        &self.item
    }

    pub fn batch(&self) -> usize {
        self.batch
    }

    pub fn pid(&self) -> Option<Pid> {
        self.pid
    }

    pub fn window(&self) -> Option<WindowId> {
        self.window
    }

    pub fn state(&self) -> InstanceState {
        self.state
    }

    /// 经历过的状态序列（包含初始的 Launching）
    pub fn history(&self) -> &[InstanceState] {
        &self.history
    }

    pub fn failure(&self) -> Option<&InstanceError> {
        self.failure.as_ref()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub fn cleanup_error(&self) -> Option<&InstanceError> {
        self.cleanup_error.as_ref()
    }

    /// 是否完整走完成功路径
    pub fn succeeded(&self) -> bool {
        self.failure.is_none() && self.history.contains(&InstanceState::DataExtracted)
    }

    pub(crate) fn set_pid(&mut self, pid: Pid) {
        self.pid = Some(pid);
    }

    pub(crate) fn window_found(&mut self, window: WindowId) {
        self.window = Some(window);
        self.advance(InstanceState::WindowFound);
    }

    /// 主窗口被重建后更新窗口，状态不变
    pub(crate) fn window_moved(&mut self, window: WindowId) {
        self.window = Some(window);
    }

    pub(crate) fn commands_sent(&mut self) {
        self.advance(InstanceState::CommandsSent);
    }

    pub(crate) fn data_extracted(&mut self) {
        self.advance(InstanceState::DataExtracted);
    }

    /// 标记失败；已经失败或已关闭的句柄保持原有失败原因
    pub(crate) fn fail(&mut self, error: InstanceError) {
        if self.failure.is_some() || self.state.is_terminal() {
            return;
        }
        self.failure = Some(error);
        self.advance(InstanceState::Failed);
    }

    pub(crate) fn closed(&mut self, termination: Termination, cleanup_error: Option<InstanceError>) {
        self.termination = Some(termination);
        self.cleanup_error = cleanup_error;
        self.advance(InstanceState::Closed);
    }

    fn advance(&mut self, next: InstanceState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "非法状态转移: {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
        self.history.push(next);
    }
}
