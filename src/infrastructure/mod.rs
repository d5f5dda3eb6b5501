//! 基础设施层：持有稀缺资源（进程、输入焦点、剪贴板），只暴露能力

pub mod desktop;
pub mod xdo_desktop;

pub use desktop::{Desktop, LaunchCommand};
pub use xdo_desktop::XdoDesktop;
