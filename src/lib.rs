//! # Conductance Batch
//!
//! 驱动没有编程接口的真空传导率计算程序，批量把几何样本转换成传导率曲线
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（进程、输入焦点、剪贴板），只暴露能力
//! - `Desktop` - 桌面原语接口；`XdoDesktop` 为 X11 实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能对一个外部程序实例做什么"
//! - `AppDriver` - 启动 / 查找窗口 / 激活 / 发送指令 / 读剪贴板 / 终止
//! - `ResultWriter` - 原子写入两个结果文件
//! - `command_sequence` - 固定的菜单导航路径
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个实例"在每个阶段的处理和状态转移
//! - `InstanceCtx` - 上下文封装（批次 + 样本序号）
//! - `InstanceFlow` - launch → drive → extract → close
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batcher` - 分批
//! - `orchestrator/batch_processor` - 阶段屏障、批次串行、统计与报告
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, Timing};
pub use error::{AppError, AppResult, ConfigError, DesktopError, FailureKind, InstanceError};
pub use infrastructure::{Desktop, LaunchCommand, XdoDesktop};
pub use models::{
    InstanceState, ItemOutcome, ItemStatus, Pid, ProcessHandle, RunReport, Termination, WindowId,
    WorkItem,
};
pub use orchestrator::{partition, App, Batch};
pub use services::{AppDriver, CommandSequences, KeyStep};
pub use workflow::{InstanceCtx, InstanceFlow};
