//! 运行报告
//!
//! 每个样本一条结构化结果记录，运行结束后写成 JSON

use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::error::FailureKind;
use crate::models::{ProcessHandle, Termination};

/// 样本处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Succeeded,
    Failed,
}

/// 单个样本的处理结果
#[derive(Debug, Clone, Serialize)]
pub struct ItemOutcome {
    pub name: String,
    pub artifact: PathBuf,
    pub batch: usize,
    pub status: ItemStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination: Option<Termination>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup_error: Option<String>,
}

impl ItemOutcome {
    /// 从已关闭的句柄生成结果记录
    pub fn from_handle(handle: &ProcessHandle) -> Self {
        let status = if handle.succeeded() {
            ItemStatus::Succeeded
        } else {
            ItemStatus::Failed
        };

        Self {
            name: handle.item().base_name().to_string(),
            artifact: handle.item().artifact().to_path_buf(),
            batch: handle.batch(),
            status,
            failure_kind: handle.failure().map(|e| e.kind()),
            reason: handle.failure().map(|e| e.to_string()),
            termination: handle.termination(),
            cleanup_error: handle.cleanup_error().map(|e| e.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ItemStatus::Succeeded
    }
}

/// 整次运行的报告
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    pub concurrency: usize,
    pub batches: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub items: Vec<ItemOutcome>,
}

impl RunReport {
    pub fn new(concurrency: usize) -> Self {
        Self {
            started_at: Local::now(),
            finished_at: None,
            concurrency,
            batches: 0,
            total: 0,
            succeeded: 0,
            failed: 0,
            items: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: ItemOutcome) {
        self.total += 1;
        if outcome.is_success() {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.items.push(outcome);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Local::now());
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InstanceError;
    use crate::models::{Pid, WindowId, WorkItem};
    use std::path::Path;

    #[test]
    fn test_outcome_from_failed_handle() {
        let item = WorkItem::new("in/B.vtser", Path::new("out"), "_model");
        let mut handle = ProcessHandle::new(item, 2);
        handle.set_pid(Pid(42));
        handle.window_found(WindowId(1));
        handle.fail(InstanceError::EmptyClipboard {
            target: "模型数据".to_string(),
        });
        handle.closed(Termination::Graceful, None);

        let outcome = ItemOutcome::from_handle(&handle);
        assert_eq!(outcome.name, "B");
        assert_eq!(outcome.batch, 2);
        assert_eq!(outcome.status, ItemStatus::Failed);
        assert_eq!(outcome.failure_kind, Some(FailureKind::Extraction));

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["failure_kind"], "extraction");
        assert_eq!(json["termination"], "graceful");
        assert!(json.get("cleanup_error").is_none());
    }

    #[test]
    fn test_report_tally() {
        let mut report = RunReport::new(4);
        for (name, ok) in [("A", true), ("B", false), ("C", true)] {
            report.record(ItemOutcome {
                name: name.to_string(),
                artifact: PathBuf::from(format!("{}.vtser", name)),
                batch: 1,
                status: if ok { ItemStatus::Succeeded } else { ItemStatus::Failed },
                failure_kind: None,
                reason: None,
                termination: Some(Termination::Graceful),
                cleanup_error: None,
            });
        }
        report.finish();

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert!(report.has_failures());
        assert!(report.finished_at.is_some());
    }
}
