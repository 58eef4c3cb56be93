pub mod config;
pub mod context;
pub mod local_time;
pub mod logging;
pub mod shutdown;
