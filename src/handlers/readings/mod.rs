pub mod export_handler;
pub mod load_handler;
pub mod summary_handler;

pub use export_handler::export_handler;
pub use load_handler::load_handler;
pub use summary_handler::summary_handler;
