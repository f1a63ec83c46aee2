// src/lib.rs

pub mod db;
pub mod eventbus;
pub mod repositories;
pub mod services;
pub mod test_utils;
pub mod utils;

pub use db::Database;
pub use xplocal_common::error::Error;
