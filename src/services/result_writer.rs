//! 结果写入服务 - 业务能力层
//!
//! 只负责把一个样本的两段文本写到磁盘，不关心流程

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, warn};

use crate::error::InstanceError;
use crate::models::WorkItem;

const PART_SUFFIX: &str = ".part";

/// 结果写入服务
///
/// - 两个文件都先写入 `.part` 临时文件，全部写完后再重命名
/// - 任何一步失败都会清理掉这个样本的所有输出，不留下半成品
#[derive(Debug, Default, Clone)]
pub struct ResultWriter;

impl ResultWriter {
    pub fn new() -> Self {
        Self
    }

    /// 写入主数据和模型数据
    pub async fn write_pair(
        &self,
        item: &WorkItem,
        primary: &str,
        model: &str,
    ) -> Result<(), InstanceError> {
        let result = self.write_pair_inner(item, primary, model).await;
        if result.is_err() {
            self.discard(item).await;
        }
        result
    }

    async fn write_pair_inner(
        &self,
        item: &WorkItem,
        primary: &str,
        model: &str,
    ) -> Result<(), InstanceError> {
        let targets = [(item.primary_output(), primary), (item.model_output(), model)];

        for (path, content) in targets {
            let part = part_path(path);
            if let Err(source) = fs::write(&part, content).await {
                return Err(InstanceError::Write { path: part, source });
            }
        }

        for (path, _) in targets {
            fs::rename(part_path(path), path)
                .await
                .map_err(|source| InstanceError::Write {
                    path: path.to_path_buf(),
                    source,
                })?;
        }

        debug!(
            "已写入 {} 和 {}",
            item.primary_output().display(),
            item.model_output().display()
        );
        Ok(())
    }

    /// 删除该样本的所有输出（包括临时文件和上一次运行留下的旧文件）
    pub async fn discard(&self, item: &WorkItem) {
        for path in [item.primary_output(), item.model_output()] {
            remove_if_exists(path).await;
            remove_if_exists(&part_path(path)).await;
        }
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(PART_SUFFIX);
    PathBuf::from(name)
}

async fn remove_if_exists(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("已删除 {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("删除 {} 失败: {}", path.display(), e),
    }
}
