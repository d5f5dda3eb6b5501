//! 程序配置
//!
//! 优先级：内置默认值 → TOML 配置文件 → 环境变量 → 命令行参数

use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::services::command_sequence::{CommandSequence, CommandSequences};

/// 等待时间配置
///
/// 外部程序没有完成信号，只能靠固定等待和轮询
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timing {
    /// 启动后等待程序加载
    pub launch_settle: Duration,
    /// 激活窗口后等待
    pub focus_settle: Duration,
    /// 查找主窗口的超时时间
    pub window_timeout: Duration,
    /// 查找主窗口的轮询间隔
    pub window_poll_interval: Duration,
    /// 启动对话框最多关闭次数
    pub dialog_attempts: u32,
    /// 关闭对话框后等待
    pub dialog_settle: Duration,
    /// 整批计算等待时间（每批只等一次）
    pub computation_wait: Duration,
    /// 全选 / 复制之后等待
    pub clipboard_settle: Duration,
    /// 正常关闭后的宽限期，超过则强制结束
    pub close_grace: Duration,
    /// 单次调用外部工具的超时
    pub tool_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            launch_settle: Duration::from_secs(3),
            focus_settle: Duration::from_millis(500),
            window_timeout: Duration::from_secs(20),
            window_poll_interval: Duration::from_secs(1),
            dialog_attempts: 5,
            dialog_settle: Duration::from_millis(500),
            computation_wait: Duration::from_secs(10),
            clipboard_settle: Duration::from_millis(500),
            close_grace: Duration::from_secs(1),
            tool_timeout: Duration::from_secs(10),
        }
    }
}

impl Timing {
    /// 所有等待为零（用于测试和模拟后端）
    pub fn immediate() -> Self {
        Self {
            launch_settle: Duration::ZERO,
            focus_settle: Duration::ZERO,
            window_timeout: Duration::ZERO,
            window_poll_interval: Duration::ZERO,
            dialog_attempts: 5,
            dialog_settle: Duration::ZERO,
            computation_wait: Duration::ZERO,
            clipboard_settle: Duration::ZERO,
            close_grace: Duration::ZERO,
            tool_timeout: Duration::from_secs(5),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 输入目录（.vtser 文件）
    pub input_dir: PathBuf,
    /// 输出目录（.txt 文件）
    pub output_dir: PathBuf,
    /// 同时运行的外部程序实例数量
    pub concurrency: usize,
    /// 外部程序路径
    pub app_path: PathBuf,
    /// 启动前缀，默认用 wine 启动 Windows 程序；为空时直接执行 `app_path`
    pub launch_prefix: Vec<String>,
    /// 输入文件扩展名（不含点）
    pub input_extension: String,
    /// 模型数据文件后缀
    pub model_suffix: String,
    /// 运行报告文件名（写在输出目录下）
    pub report_file: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 主窗口标题正则
    pub main_window_pattern: String,
    /// 启动错误对话框的标题正则
    pub error_dialog_pattern: String,
    /// 关闭对话框使用的按键
    pub dismiss_key: String,
    pub timing: Timing,
    pub sequences: CommandSequences,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("02_vtser_files"),
            output_dir: PathBuf::from("03_vactran_txt_output"),
            concurrency: 4,
            app_path: PathBuf::from(r"C:\Program Files (x86)\PEC\VacTran 3\VacTran.exe"),
            launch_prefix: vec!["wine".to_string()],
            input_extension: "vtser".to_string(),
            model_suffix: "_model".to_string(),
            report_file: "run_report.json".to_string(),
            verbose_logging: false,
            main_window_pattern: "VacTran".to_string(),
            error_dialog_pattern: "(?i)error".to_string(),
            dismiss_key: "Return".to_string(),
            timing: Timing::default(),
            sequences: CommandSequences::default(),
        }
    }
}

/// TOML 配置文件结构，所有字段可选
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub concurrency: Option<usize>,
    pub app_path: Option<PathBuf>,
    pub launch_prefix: Option<Vec<String>>,
    pub input_extension: Option<String>,
    pub model_suffix: Option<String>,
    pub report_file: Option<String>,
    pub verbose_logging: Option<bool>,
    pub main_window_pattern: Option<String>,
    pub error_dialog_pattern: Option<String>,
    pub dismiss_key: Option<String>,
    pub timing: FileTiming,
    pub sequences: FileSequences,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileTiming {
    pub launch_settle_ms: Option<u64>,
    pub focus_settle_ms: Option<u64>,
    pub window_timeout_ms: Option<u64>,
    pub window_poll_interval_ms: Option<u64>,
    pub dialog_attempts: Option<u32>,
    pub dialog_settle_ms: Option<u64>,
    pub computation_wait_ms: Option<u64>,
    pub clipboard_settle_ms: Option<u64>,
    pub close_grace_ms: Option<u64>,
    pub tool_timeout_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileSequences {
    pub trigger: Option<CommandSequence>,
    pub export_primary: Option<CommandSequence>,
    pub export_model: Option<CommandSequence>,
}

impl Config {
    /// 加载配置：默认值 → 配置文件（可选）→ 环境变量
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = config_file {
            config.apply_file(Self::read_file(path)?);
        }
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// 读取并解析 TOML 配置文件
    pub fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 用配置文件中出现的字段覆盖当前值
    pub fn apply_file(&mut self, file: FileConfig) {
        fn set<T>(target: &mut T, value: Option<T>) {
            if let Some(v) = value {
                *target = v;
            }
        }
        fn set_ms(target: &mut Duration, value: Option<u64>) {
            if let Some(ms) = value {
                *target = Duration::from_millis(ms);
            }
        }

        set(&mut self.concurrency, file.concurrency);
        set(&mut self.app_path, file.app_path);
        set(&mut self.launch_prefix, file.launch_prefix);
        set(&mut self.input_extension, file.input_extension);
        set(&mut self.model_suffix, file.model_suffix);
        set(&mut self.report_file, file.report_file);
        set(&mut self.verbose_logging, file.verbose_logging);
        set(&mut self.main_window_pattern, file.main_window_pattern);
        set(&mut self.error_dialog_pattern, file.error_dialog_pattern);
        set(&mut self.dismiss_key, file.dismiss_key);

        let t = &mut self.timing;
        set_ms(&mut t.launch_settle, file.timing.launch_settle_ms);
        set_ms(&mut t.focus_settle, file.timing.focus_settle_ms);
        set_ms(&mut t.window_timeout, file.timing.window_timeout_ms);
        set_ms(&mut t.window_poll_interval, file.timing.window_poll_interval_ms);
        set(&mut t.dialog_attempts, file.timing.dialog_attempts);
        set_ms(&mut t.dialog_settle, file.timing.dialog_settle_ms);
        set_ms(&mut t.computation_wait, file.timing.computation_wait_ms);
        set_ms(&mut t.clipboard_settle, file.timing.clipboard_settle_ms);
        set_ms(&mut t.close_grace, file.timing.close_grace_ms);
        set_ms(&mut t.tool_timeout, file.timing.tool_timeout_ms);

        set(&mut self.sequences.trigger, file.sequences.trigger);
        set(&mut self.sequences.export_primary, file.sequences.export_primary);
        set(&mut self.sequences.export_model, file.sequences.export_model);
    }

    /// 用环境变量覆盖当前值
    ///
    /// `lookup` 一般是 `std::env::var`，测试时可以替换
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("CONCURRENCY") {
            self.concurrency = parse_env("CONCURRENCY", &v, "usize")?;
        }
        if let Some(v) = lookup("APP_PATH") {
            self.app_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("LAUNCH_PREFIX") {
            self.launch_prefix = v.split_whitespace().map(str::to_string).collect();
        }
        if let Some(v) = lookup("INPUT_EXTENSION") {
            self.input_extension = v;
        }
        if let Some(v) = lookup("VERBOSE_LOGGING") {
            self.verbose_logging = parse_env("VERBOSE_LOGGING", &v, "bool")?;
        }
        if let Some(v) = lookup("COMPUTATION_WAIT_MS") {
            let ms: u64 = parse_env("COMPUTATION_WAIT_MS", &v, "u64")?;
            self.timing.computation_wait = Duration::from_millis(ms);
        }
        Ok(())
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        self.main_window_regex()?;
        self.dialog_regex()?;
        if self.sequences.trigger.is_empty() {
            return Err(ConfigError::EmptySequence("trigger"));
        }
        if self.sequences.export_primary.is_empty() {
            return Err(ConfigError::EmptySequence("export_primary"));
        }
        if self.sequences.export_model.is_empty() {
            return Err(ConfigError::EmptySequence("export_model"));
        }
        Ok(())
    }

    /// 编译错误对话框标题正则
    pub fn dialog_regex(&self) -> Result<Regex, ConfigError> {
        compile_pattern(&self.error_dialog_pattern)
    }

    /// 编译主窗口标题正则
    pub fn main_window_regex(&self) -> Result<Regex, ConfigError> {
        compile_pattern(&self.main_window_pattern)
    }

    /// 运行报告的完整路径
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_file)
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn parse_env<T: std::str::FromStr>(
    var_name: &str,
    value: &str,
    expected_type: &str,
) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: expected_type.to_string(),
        })
}
