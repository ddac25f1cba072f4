mod config;
mod init;
mod lock;
mod misc;
mod secrets;

pub use config::{handle_config_get, handle_config_set};
pub use init::handle_init;
pub use lock::handle_lock;
pub use misc::handle_completions;
pub use secrets::{handle_add, handle_get, handle_list, handle_remove};
