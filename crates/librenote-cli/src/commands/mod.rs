pub mod add;
pub mod auth_cmd;
pub mod common;
pub mod config;
pub mod delete;
pub mod drive;
pub mod edit;
pub mod list;
pub mod search;
pub mod show;
pub mod sync;
