pub mod work_loader;

pub use work_loader::load_work_items;
