//! 批量实例处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批次的调度和外部进程的生命周期。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验配置、创建输出目录、创建驱动
//! 2. **批量加载**：扫描并排序所有待处理的样本（`Vec<WorkItem>`）
//! 3. **分批处理**：每批最多 `concurrency` 个外部进程同时存活，
//!    本批全部关闭后才开始下一批
//! 4. **阶段屏障**：启动全部 → 触发全部 → 等待一次 → 逐个提取并关闭
//! 5. **全局统计**：汇总所有样本的结果并写入运行报告
//!
//! ## 设计特点
//!
//! - 计算在外部程序里异步进行，先给整批发完指令再统一等待，
//!   整批只付出一次计算延迟
//! - 焦点和剪贴板是全局共享的，所以对实例的操作始终是串行的
//! - 单个样本的失败只影响它自己，失败的样本依然会被关闭

use std::time::Instant;

use tokio::fs;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::Desktop;
use crate::models::{self, ItemOutcome, ProcessHandle, RunReport};
use crate::orchestrator::batcher::{self, Batch};
use crate::services::{AppDriver, ResultWriter};
use crate::utils::logging;
use crate::workflow::{InstanceCtx, InstanceFlow};

/// 应用主结构
pub struct App<D> {
    config: Config,
    driver: AppDriver<D>,
    writer: ResultWriter,
}

impl<D: Desktop> App<D> {
    /// 初始化应用
    pub async fn initialize(config: Config, desktop: D) -> AppResult<Self> {
        config.validate()?;

        logging::log_startup(&config);

        fs::create_dir_all(&config.output_dir)
            .await
            .map_err(|source| AppError::OutputDir {
                path: config.output_dir.clone(),
                source,
            })?;

        let driver = AppDriver::new(desktop, &config)?;

        Ok(Self {
            config,
            driver,
            writer: ResultWriter::new(),
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<RunReport> {
        let started = Instant::now();
        let mut report = RunReport::new(self.config.concurrency);

        let items = self.load_items().await?;
        if items.is_empty() {
            warn!("⚠️ 没有找到待处理的 .{} 文件，程序结束", self.config.input_extension);
        }

        let total_items = items.len();
        let batches = batcher::partition(items, self.config.concurrency);
        report.batches = batches.len();

        if total_items > 0 {
            logging::log_items_loaded(total_items, self.config.concurrency, batches.len());
        }

        for batch in &batches {
            logging::log_batch_start(
                batch.index,
                batches.len(),
                batch.first_item,
                batch.last_item(),
                total_items,
            );

            let outcomes = self.process_batch(batch).await;
            let success = outcomes.iter().filter(|o| o.is_success()).count();
            logging::log_batch_complete(batch.index, success, outcomes.len());

            for outcome in outcomes {
                report.record(outcome);
            }
        }

        report.finish();
        let report_path = self.write_report(&report).await?;
        logging::print_final_stats(&report, started.elapsed(), &report_path);

        Ok(report)
    }

    /// 加载样本
    async fn load_items(&self) -> AppResult<Vec<models::WorkItem>> {
        info!("\n📁 正在扫描待处理的样本...");
        models::load_work_items(
            &self.config.input_dir,
            &self.config.input_extension,
            &self.config.output_dir,
            &self.config.model_suffix,
        )
        .await
    }

    /// 处理单个批次
    ///
    /// 每个阶段对本批所有实例都执行完之后，才进入下一个阶段
    pub async fn process_batch(&self, batch: &Batch) -> Vec<ItemOutcome> {
        let flow = InstanceFlow::new(&self.driver, &self.writer, &self.config.sequences);

        // ========== 阶段 1: 启动全部 ==========
        logging::log_phase(batch.index, "启动");
        let mut instances: Vec<(InstanceCtx, ProcessHandle)> = Vec::with_capacity(batch.len());
        for (offset, item) in batch.items.iter().enumerate() {
            let ctx = InstanceCtx::new(batch.first_item + offset, batch.index, item.base_name());
            let handle = flow.launch(item.clone(), &ctx).await;
            instances.push((ctx, handle));
        }

        // ========== 阶段 2: 触发全部 ==========
        logging::log_phase(batch.index, "触发计算");
        for (ctx, handle) in instances.iter_mut() {
            flow.drive(handle, ctx).await;
        }

        // ========== 阶段 3: 整批等待一次 ==========
        if instances.iter().any(|(_, h)| !h.is_failed()) {
            let wait = self.driver.timing().computation_wait;
            logging::log_wait(batch.index, wait);
            sleep(wait).await;
        }

        // ========== 阶段 4: 逐个提取并关闭 ==========
        logging::log_phase(batch.index, "提取并关闭");
        let mut outcomes = Vec::with_capacity(instances.len());
        for (ctx, mut handle) in instances {
            flow.extract(&mut handle, &ctx).await;
            flow.close(&mut handle, &ctx).await;
            outcomes.push(ItemOutcome::from_handle(&handle));
        }

        outcomes
    }

    /// 写入运行报告
    async fn write_report(&self, report: &RunReport) -> AppResult<std::path::PathBuf> {
        let path = self.config.report_path();
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json)
            .await
            .map_err(|source| AppError::Report {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}
