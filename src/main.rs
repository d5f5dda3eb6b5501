use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use conductance_batch::utils::logging;
use conductance_batch::{App, Config, XdoDesktop};

/// 批量驱动传导率计算程序，导出每个样本的计算结果
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// 输入目录（.vtser 文件）
    input_dir: PathBuf,

    /// 输出目录（.txt 文件）
    output_dir: PathBuf,

    /// TOML 配置文件
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 同时运行的实例数量
    #[arg(short = 'n', long)]
    concurrency: Option<usize>,

    /// 外部程序路径
    #[arg(long)]
    app: Option<PathBuf>,

    /// 启动前缀（默认 wine）；不带参数时直接执行外部程序
    #[arg(long, num_args = 0.., value_name = "ARG", allow_hyphen_values = true)]
    launch_prefix: Option<Vec<String>>,

    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// 命令行参数覆盖配置
    fn apply(self, config: &mut Config) {
        config.input_dir = self.input_dir;
        config.output_dir = self.output_dir;
        if let Some(n) = self.concurrency {
            config.concurrency = n;
        }
        if let Some(app) = self.app {
            config.app_path = app;
        }
        if let Some(prefix) = self.launch_prefix {
            config.launch_prefix = prefix;
        }
        config.verbose_logging |= self.verbose;
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::load(cli.config.as_deref()).context("加载配置失败")?;
    cli.apply(&mut config);

    // 初始化日志
    logging::init(config.verbose_logging);

    let desktop = XdoDesktop::new(config.timing.tool_timeout);

    // 初始化并运行应用
    let report = App::initialize(config, desktop).await?.run().await?;

    if report.has_failures() {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
