use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum Bax2BamError {
    #[error("unknown mode selected")]
    UnknownMode,

    #[error("no input files")]
    NoInputs,

    #[error("input file not found: {0}")]
    InputNotFound(String),

    #[error("unsupported input file for {mode} mode: {path}")]
    UnsupportedInput { mode: String, path: String },

    #[error("input files come from different movies: {0} and {1}")]
    MixedMovies(String, String),

    #[error("invalid movie file name: {0}")]
    InvalidMovieFile(String),

    #[error("output file was not produced: {0}")]
    MissingOutput(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("failed to read dataset XML {path}: {message}")]
    DatasetRead { path: String, message: String },

    #[error("malformed dataset XML: {0}")]
    DatasetParse(String),

    #[error("failed to write dataset XML {path}: {message}")]
    DatasetWrite { path: String, message: String },

    #[error("unrecognized dataset type: {0}")]
    UnknownDataSetType(String),

    #[error("required tool not found: {0}")]
    MissingTool(String),

    #[error("transcoding failed: {0}")]
    Transcode(String),
}
