pub mod cache;
pub mod common;
pub mod config;
pub mod directory;
pub mod favorite;
pub mod list;
pub mod review;
pub mod reviews;
pub mod serve;
pub mod show;
pub mod status;
pub mod sync;
