pub mod callback_handler;
pub mod disconnect_handler;
pub mod login_handler;
pub mod refresh_handler;

pub use callback_handler::callback_handler;
pub use disconnect_handler::disconnect_handler;
pub use login_handler::login_handler;
pub use refresh_handler::refresh_handler;
