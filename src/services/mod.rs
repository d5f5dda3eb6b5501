pub mod app_driver;
pub mod command_sequence;
pub mod result_writer;

pub use app_driver::{AppDriver, DialogScan};
pub use command_sequence::{CommandSequence, CommandSequences, ExportTarget, KeyStep};
pub use result_writer::ResultWriter;
