pub mod auth_cmd;
pub mod common;
pub mod completions;
pub mod config;
pub mod delete;
pub mod download;
pub mod list;
pub mod subjects;
pub mod upload;
pub mod watch;
