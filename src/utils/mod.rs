pub mod logging;

pub use logging::{init_log_file, log_startup, truncate_text};
