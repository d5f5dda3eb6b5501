//! 指令序列 - 业务能力层
//!
//! 描述外部程序内部的一条固定菜单导航路径。按键写法与 xdotool 相同
//! （`alt+w`、`Return`、`Down`、`ctrl+a`）。

use std::fmt;
use std::time::Duration;

use serde::Deserialize;

/// 单个按键步骤
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KeyStep {
    /// 按键组合
    pub keys: String,
    /// 重复次数
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    /// 每次按键后的等待时间（毫秒），给界面重绘留时间
    #[serde(default)]
    pub settle_ms: u64,
}

fn default_repeat() -> u32 {
    1
}

impl KeyStep {
    pub fn new(keys: impl Into<String>, settle_ms: u64) -> Self {
        Self {
            keys: keys.into(),
            repeat: 1,
            settle_ms,
        }
    }

    pub fn repeated(keys: impl Into<String>, repeat: u32, settle_ms: u64) -> Self {
        Self {
            keys: keys.into(),
            repeat,
            settle_ms,
        }
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl fmt::Display for KeyStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.repeat > 1 {
            write!(f, "{}×{}", self.keys, self.repeat)
        } else {
            write!(f, "{}", self.keys)
        }
    }
}

/// 一条完整的指令序列
pub type CommandSequence = Vec<KeyStep>;

/// 三条固定的指令序列
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommandSequences {
    /// 触发计算：打开 Series Text Window，再生成 Conductance vs Pressure 图
    pub trigger: CommandSequence,
    /// 导出主数据：切换到 Main Text Window
    pub export_primary: CommandSequence,
    /// 导出模型数据：切换到 Series Text Window 的模型页
    pub export_model: CommandSequence,
}

impl Default for CommandSequences {
    fn default() -> Self {
        Self {
            trigger: vec![
                KeyStep::new("alt+w", 500),
                KeyStep::new("6", 200),
                KeyStep::new("Return", 1000),
                KeyStep::new("alt+g", 500),
                // 菜单第 19 项
                KeyStep::repeated("Down", 18, 100),
                KeyStep::new("Return", 500),
            ],
            export_primary: vec![
                KeyStep::new("alt+w", 500),
                KeyStep::new("2", 200),
                KeyStep::new("Return", 1500),
            ],
            export_model: vec![
                KeyStep::new("alt+w", 500),
                KeyStep::new("6", 200),
                KeyStep::new("Return", 200),
                KeyStep::new("Return", 200),
                KeyStep::new("Right", 200),
                KeyStep::new("Tab", 1000),
            ],
        }
    }
}

/// 导出目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    Primary,
    Model,
}

impl ExportTarget {
    pub const ALL: [ExportTarget; 2] = [ExportTarget::Primary, ExportTarget::Model];

    pub fn label(self) -> &'static str {
        match self {
            ExportTarget::Primary => "主数据",
            ExportTarget::Model => "模型数据",
        }
    }

    pub fn sequence(self, sequences: &CommandSequences) -> &[KeyStep] {
        match self {
            ExportTarget::Primary => &sequences.export_primary,
            ExportTarget::Model => &sequences.export_model,
        }
    }
}
