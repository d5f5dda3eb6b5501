/// 日志工具模块
///
/// 提供日志初始化和格式化输出的辅助函数
use std::path::Path;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::RunReport;

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先；否则 verbose 时为 debug，默认 info
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 批量并发计算模式");
    info!("📂 输入目录: {}", config.input_dir.display());
    info!("📂 输出目录: {}", config.output_dir.display());
    info!("📊 最大并发数: {}", config.concurrency);
    info!("{}", "=".repeat(60));
}

/// 记录样本加载信息
pub fn log_items_loaded(total: usize, concurrency: usize, total_batches: usize) {
    info!("✓ 找到 {} 个待处理的样本", total);
    info!("📋 将以每批 {} 个的方式处理，共 {} 批", concurrency, total_batches);
    info!("💡 每批完成后再开始下一批\n");
}

/// 记录批次开始信息
///
/// # 参数
/// - `batch_num`: 批次编号
/// - `total_batches`: 批次总数
/// - `start`: 起始样本编号
/// - `end`: 结束样本编号
/// - `total`: 样本总数
pub fn log_batch_start(
    batch_num: usize,
    total_batches: usize,
    start: usize,
    end: usize,
    total: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批", batch_num, total_batches);
    info!("📄 本批样本: {}-{} / 共 {} 个", start, end, total);
    info!("{}", "=".repeat(60));
}

/// 记录阶段切换
pub fn log_phase(batch_num: usize, phase: &str) {
    info!("── 第 {} 批 · {} ──", batch_num, phase);
}

/// 记录计算等待
pub fn log_wait(batch_num: usize, wait: Duration) {
    info!("⏳ 第 {} 批等待计算完成 ({:?})", batch_num, wait);
}

/// 记录批次完成信息
pub fn log_batch_complete(batch_num: usize, success: usize, total: usize) {
    info!("\n{}", "─".repeat(60));
    info!("✓ 第 {} 批完成: 成功 {}/{}", batch_num, success, total);
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(report: &RunReport, elapsed: Duration, report_path: &Path) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", report.succeeded, report.total);
    info!("❌ 失败: {}", report.failed);
    for item in report.items.iter().filter(|i| !i.is_success()) {
        info!(
            "   - {}: {}",
            item.name,
            item.reason.as_deref().unwrap_or("未知原因")
        );
    }
    info!("⏱️ 总耗时: {:.2} 秒", elapsed.as_secs_f64());
    info!("{}", "=".repeat(60));
    info!("\n运行报告已保存至: {}", report_path.display());
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
