pub mod instance_ctx;
pub mod instance_flow;

pub use instance_ctx::InstanceCtx;
pub use instance_flow::InstanceFlow;
