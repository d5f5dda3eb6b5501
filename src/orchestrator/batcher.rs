//! 分批器
//!
//! 把按顺序排好的样本切成大小不超过并发数的批次，批次之间保持原顺序

use crate::models::WorkItem;

/// 一个批次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 批次编号（从1开始）
    pub index: usize,
    /// 本批第一个样本在整次运行中的序号（从1开始）
    pub first_item: usize,
    pub items: Vec<WorkItem>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// 本批最后一个样本的序号
    pub fn last_item(&self) -> usize {
        self.first_item + self.items.len().saturating_sub(1)
    }
}

/// 切分批次
pub fn partition(items: Vec<WorkItem>, limit: usize) -> Vec<Batch> {
    let limit = limit.max(1);
    let mut batches = Vec::with_capacity(items.len().div_ceil(limit));
    let mut items = items.into_iter().peekable();
    let mut first_item = 1;

    while items.peek().is_some() {
        let chunk: Vec<WorkItem> = items.by_ref().take(limit).collect();
        let len = chunk.len();
        batches.push(Batch {
            index: batches.len() + 1,
            first_item,
            items: chunk,
        });
        first_item += len;
    }

    batches
}
