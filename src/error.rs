use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(
        "Please store a perfect square number (>= 4) of video files in the input folder.\ninput_folder: {}",
        .folder.display()
    )]
    NotPerfectSquare { count: usize, folder: PathBuf },
    /// No `_TV` clips were collected, or the first one has no readable size.
    #[error("could not build the grid command from {count} input clip(s)")]
    EmptyCommand { count: usize },
    #[error("{program} returned error status {status}\n{stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("output file already exists: {} (pass -y to overwrite)", .0.display())]
    OutputExists(PathBuf),
    #[error("can't read config file {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no answer on stdin")]
    NoInput,
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
