#![allow(dead_code)]

pub mod feed_store;
pub mod generator;
pub mod media_host;
pub mod merger;
pub mod session;

use std::path::PathBuf;

/// Fresh scratch directory under the system temp dir
pub fn scratch_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{prefix}-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
