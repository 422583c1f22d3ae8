use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to access {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
  #[error("malformed world: {0}")]
  Json(#[from] serde_json::Error),
  #[error("failed to write snapshot: {0}")]
  Snapshot(#[source] serde_json::Error),
  #[error("no object with id {0}")]
  UnknownEntity(String),
}

pub type Result<T> = std::result::Result<T, Error>;
