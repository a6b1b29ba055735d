use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("couldn't load shader `{name}` from `{}`", path.display())]
    ShaderIo {
        name: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("shader `{name}` is not a SPIR-V module")]
    InvalidShader { name: &'static str },

    #[error("buffer `{name}` has {actual} elements, but {expected} were expected")]
    BufferSizeMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
}
