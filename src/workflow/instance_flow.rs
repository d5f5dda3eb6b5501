//! 实例处理流程 - 流程层
//!
//! 定义"一个外部程序实例"在每个阶段做什么：
//! 1. launch：启动 → 关闭启动对话框 → 查找主窗口
//! 2. drive：激活 → 发送触发计算的指令序列
//! 3. extract：对主数据和模型数据分别 激活 → 切换视图 → 复制 → 写文件
//! 4. close：终止进程（无论成功失败都要执行）
//!
//! 每一步的失败只记录在该实例的句柄上，不向上传播。

use tracing::{debug, error, info, warn};

use crate::error::InstanceError;
use crate::infrastructure::Desktop;
use crate::models::{ProcessHandle, Termination, WindowId, WorkItem};
use crate::services::{AppDriver, CommandSequences, ExportTarget, ResultWriter};
use crate::utils::logging::truncate_text;
use crate::workflow::InstanceCtx;

/// 实例处理流程
///
/// - 不持有任何资源，只借用驱动和写入服务
/// - 每个方法只处理一个句柄
pub struct InstanceFlow<'a, D> {
    driver: &'a AppDriver<D>,
    writer: &'a ResultWriter,
    sequences: &'a CommandSequences,
}

impl<'a, D: Desktop> InstanceFlow<'a, D> {
    pub fn new(
        driver: &'a AppDriver<D>,
        writer: &'a ResultWriter,
        sequences: &'a CommandSequences,
    ) -> Self {
        Self {
            driver,
            writer,
            sequences,
        }
    }

    /// 启动阶段：Launching → WindowFound
    pub async fn launch(&self, item: WorkItem, ctx: &InstanceCtx) -> ProcessHandle {
        let mut handle = ProcessHandle::new(item, ctx.batch);

        let pid = match self.driver.launch(handle.item().artifact()).await {
            Ok(pid) => pid,
            Err(e) => {
                error!("{} ❌ 启动失败: {}", ctx, e);
                handle.fail(e);
                return handle;
            }
        };
        handle.set_pid(pid);

        match self.driver.locate_window(pid).await {
            Ok(window) => {
                info!("{} 🚀 已启动 (进程 {}, 窗口 {})", ctx, pid, window);
                handle.window_found(window);
            }
            Err(e) => {
                error!("{} ❌ {}", ctx, e);
                handle.fail(e);
            }
        }

        handle
    }

    /// 指令阶段：WindowFound → CommandsSent
    pub async fn drive(&self, handle: &mut ProcessHandle, ctx: &InstanceCtx) {
        let Some(window) = self.healthy_window(handle, ctx, "指令") else {
            return;
        };

        let result = async {
            self.focus(window).await?;
            self.driver.send_sequence(&self.sequences.trigger).await
        }
        .await;

        match result {
            Ok(()) => {
                info!("{} ⚙️ 已触发计算", ctx);
                handle.commands_sent();
            }
            Err(e) => {
                error!("{} ❌ {}", ctx, e);
                handle.fail(e);
            }
        }
    }

    /// 提取阶段：CommandsSent → DataExtracted
    ///
    /// 两段数据都拿到之后才写文件
    pub async fn extract(&self, handle: &mut ProcessHandle, ctx: &InstanceCtx) {
        if self.healthy_window(handle, ctx, "提取").is_none() {
            return;
        }

        let mut texts = Vec::with_capacity(ExportTarget::ALL.len());
        for target in ExportTarget::ALL {
            match self.export(handle, target, ctx).await {
                Ok(text) => texts.push(text),
                Err(e) => {
                    error!("{} ❌ {}", ctx, e);
                    handle.fail(e);
                    return;
                }
            }
        }

        match self
            .writer
            .write_pair(handle.item(), &texts[0], &texts[1])
            .await
        {
            Ok(()) => {
                info!(
                    "{} ✓ 已保存 {}",
                    ctx,
                    handle.item().primary_output().display()
                );
                handle.data_extracted();
            }
            Err(e) => {
                error!("{} ❌ {}", ctx, e);
                handle.fail(e);
            }
        }
    }

    /// 关闭阶段：→ Closed
    ///
    /// 无论之前是否失败都会执行；失败的样本同时清理掉旧的输出文件
    pub async fn close(&self, handle: &mut ProcessHandle, ctx: &InstanceCtx) {
        if handle.is_failed() {
            self.writer.discard(handle.item()).await;
        }

        let Some(pid) = handle.pid() else {
            debug!("{} 进程未启动，无需关闭", ctx);
            handle.closed(Termination::NotStarted, None);
            return;
        };

        match self.driver.terminate(pid, handle.window()).await {
            Ok(termination) => {
                info!("{} 🔚 已关闭 ({:?})", ctx, termination);
                handle.closed(termination, None);
            }
            Err(source) => {
                let e = InstanceError::Cleanup { pid, source };
                warn!("{} ⚠️ {}", ctx, e);
                handle.closed(Termination::KillFailed, Some(e));
            }
        }
    }

    /// 导出一段数据：激活 → 切换视图 → 复制
    async fn export(
        &self,
        handle: &mut ProcessHandle,
        target: ExportTarget,
        ctx: &InstanceCtx,
    ) -> Result<String, InstanceError> {
        self.refocus(handle, ctx).await?;
        self.driver
            .send_sequence(target.sequence(self.sequences))
            .await?;

        let text = self
            .driver
            .read_clipboard()
            .await
            .map_err(|source| InstanceError::Clipboard {
                target: target.label().to_string(),
                source,
            })?;

        if text.trim().is_empty() {
            return Err(InstanceError::EmptyClipboard {
                target: target.label().to_string(),
            });
        }

        debug!(
            "{} {} {} 字节: {}",
            ctx,
            target.label(),
            text.len(),
            truncate_text(text.trim(), 60)
        );
        Ok(text)
    }

    /// 激活主窗口；窗口已经不存在时重新查找一次
    async fn refocus(
        &self,
        handle: &mut ProcessHandle,
        ctx: &InstanceCtx,
    ) -> Result<(), InstanceError> {
        let (Some(pid), Some(window)) = (handle.pid(), handle.window()) else {
            return Ok(());
        };

        let Err(first) = self.focus(window).await else {
            return Ok(());
        };

        warn!("{} ⚠️ {}，重新查找主窗口", ctx, first);
        match self.driver.locate_window(pid).await {
            Ok(found) if found != window => {
                info!("{} 🔄 主窗口已更换为 {}", ctx, found);
                handle.window_moved(found);
                self.focus(found).await
            }
            _ => Err(first),
        }
    }

    async fn focus(&self, window: WindowId) -> Result<(), InstanceError> {
        self.driver
            .focus(window)
            .await
            .map_err(|source| InstanceError::Command {
                step: format!("focus {}", window),
                source,
            })
    }

    /// 已失败的句柄返回 None，后续阶段跳过
    fn healthy_window(
        &self,
        handle: &ProcessHandle,
        ctx: &InstanceCtx,
        phase: &str,
    ) -> Option<WindowId> {
        if handle.is_failed() {
            info!("{} ⏭️ 已失败，跳过{}阶段", ctx, phase);
            return None;
        }
        handle.window()
    }
}
