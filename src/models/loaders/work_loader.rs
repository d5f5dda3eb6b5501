use crate::error::{AppError, AppResult};
use crate::models::WorkItem;
use std::collections::HashSet;
use std::path::Path;
use tokio::fs;
use tracing::warn;

/// 扫描输入目录，返回按文件名排序的 WorkItem 列表
///
/// - 扩展名比较不区分大小写
/// - 输出文件与前面的样本重名（如 `S1.VTSER` 与 `S1.vtser`）时跳过后者
/// - 目录不存在是致命错误；没有匹配文件返回空列表
pub async fn load_work_items(
    input_dir: &Path,
    extension: &str,
    output_dir: &Path,
    model_suffix: &str,
) -> AppResult<Vec<WorkItem>> {
    if !fs::metadata(input_dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        return Err(AppError::InputDirNotFound(input_dir.to_path_buf()));
    }

    let unreadable = |source| AppError::InputDirUnreadable {
        path: input_dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(input_dir).await.map_err(unreadable)?;
    let mut artifacts = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(unreadable)? {
        let path = entry.path();
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if !is_file {
            continue;
        }

        let matches = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if matches {
            artifacts.push(path);
        }
    }

    artifacts.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    tracing::debug!(
        "在 {} 中找到 {} 个 .{} 文件",
        input_dir.display(),
        artifacts.len(),
        extension
    );

    // 输出文件名不区分大小写比较，大小写不敏感的文件系统上同样会冲突
    let mut claimed = HashSet::new();
    let mut items = Vec::with_capacity(artifacts.len());
    for path in artifacts {
        let item = WorkItem::new(path, output_dir, model_suffix);
        let outputs = [item.primary_output(), item.model_output()].map(output_key);
        if outputs.iter().any(|key| claimed.contains(key)) {
            warn!(
                "⚠️ 跳过 {}: 输出文件与前面的样本重名",
                item.artifact().display()
            );
            continue;
        }
        claimed.extend(outputs);
        items.push(item);
    }

    Ok(items)
}

fn output_key(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}
