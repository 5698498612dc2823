pub mod config;
pub mod plugin;
pub mod run;
pub mod task;
pub mod version;
