use std::path::PathBuf;

use thiserror::Error;

pub type LcResult<T> = Result<T, LcError>;

/// Errors that abort a run
#[derive(Debug, Error)]
pub enum LcError {
    #[error("input path {} does not exist", .path.display())]
    InputNotFound { path: PathBuf },

    #[error("no .txt data files found in {}", .path.display())]
    NoDataFiles { path: PathBuf },

    #[error("could not parse {}{}: {message}", .path.display(), fmt_line(.line))]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },

    #[error("invalid moving average window {0}, it must be odd and at least 3")]
    InvalidWindow(usize),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not draw plot {}: {message}", .path.display())]
    Plot { path: PathBuf, message: String },
}

impl LcError {
    pub fn parse<P: Into<PathBuf>, S: Into<String>>(path: P, line: Option<usize>, message: S) -> Self {
        LcError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    pub fn io<P: Into<PathBuf>>(path: P, source: std::io::Error) -> Self {
        LcError::Io {
            path: path.into(),
            source,
        }
    }
}

fn fmt_line(line: &Option<usize>) -> String {
    match line {
        Some(l) => format!(" at line {}", l),
        None => String::new(),
    }
}
