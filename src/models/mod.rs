pub mod loaders;
pub mod outcome;
pub mod process_handle;
pub mod work_item;

pub use loaders::load_work_items;
pub use outcome::{ItemOutcome, ItemStatus, RunReport};
pub use process_handle::{InstanceState, Pid, ProcessHandle, Termination, WindowId};
pub use work_item::WorkItem;
