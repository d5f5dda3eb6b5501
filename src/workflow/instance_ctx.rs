//! 实例处理上下文
//!
//! 封装"我正在处理第几批的第几个样本"这一信息，只用于日志

use std::fmt::Display;

/// 实例处理上下文
#[derive(Debug, Clone)]
pub struct InstanceCtx {
    /// 样本在整次运行中的序号（从1开始）
    pub index: usize,

    /// 批次编号（从1开始）
    pub batch: usize,

    /// 样本名（输入文件名去掉扩展名）
    pub name: String,
}

impl InstanceCtx {
    pub fn new(index: usize, batch: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            batch,
            name: name.into(),
        }
    }
}

impl Display for InstanceCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[样本 #{} {}]", self.index, self.name)
    }
}
