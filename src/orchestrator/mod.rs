//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责分批和阶段调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batcher` - 分批器
//! - 把排好序的样本切成大小不超过并发数的批次
//!
//! ### `batch_processor` - 批量实例处理器
//! - 管理应用生命周期（初始化、运行、报告）
//! - 逐批推进：启动全部 → 触发全部 → 等待 → 逐个提取并关闭
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Batch>)
//!     ↓
//! workflow::InstanceFlow (处理单个 ProcessHandle 的某个阶段)
//!     ↓
//! services (能力层：AppDriver / ResultWriter)
//!     ↓
//! infrastructure (基础设施：Desktop)
//! ```

pub mod batch_processor;
pub mod batcher;

pub use batch_processor::App;
pub use batcher::{partition, Batch};
