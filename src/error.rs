/*
 * Copyright (c) 2017, Alan Chen
 * See LICENCE file for BSD-2 terms
 */

//! fatal errors of a sorting run

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit status for transfer failures, everything else fatal exits with 1
pub const TRANSFER_EXIT_CODE: i32 = 255;

#[derive(Debug, Error)]
pub enum Error {
    #[error("error reading path {path:?}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: ignore::Error,
    },

    #[error("cannot create directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot inspect destination {path:?}: {source}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no answer from terminal: {0}")]
    Prompt(#[source] io::Error),

    #[error("aborted by user")]
    Aborted,

    #[error("error transferring {src:?} to {dst:?}: {source}")]
    Transfer {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub fn exit_code(&self) -> i32
    {
        match self {
            Error::Transfer { .. } => TRANSFER_EXIT_CODE,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
