use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cannot read collection file {path}: {source}")]
    InputFile { path: String, source: io::Error },
    #[error("could not find an index in {0}")]
    MissingIndex(String),
    #[error("corrupt index: {0}")]
    CorruptIndex(String),
    #[error("index exceeds the 32-bit limits of the on-disk format")]
    IndexTooLarge,
    #[error(transparent)]
    Io(#[from] io::Error),
}
