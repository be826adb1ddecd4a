pub mod config;
pub mod create;
pub mod delete;
pub mod key;
pub mod show;
pub mod ssh;
pub mod start;
pub mod stop;
