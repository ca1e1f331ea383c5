pub mod connection;
pub mod headless;

pub use connection::{
    acquire_browser, connect_remote_browser, connect_to_debug_port, RemoteEndpoint,
};
pub use headless::launch_headless_browser;
