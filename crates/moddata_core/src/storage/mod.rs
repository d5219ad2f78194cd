//! Fragment storage: file layout I/O and the JSON serializer adapter.
//!
//! # Responsibility
//! - Read and write single fragments without knowing the mod's data type.
//! - Report failures with the path they happened at.
//!
//! # Invariants
//! - Storage code never decides policy; callers choose whether an error is
//!   logged, recovered or surfaced.
//!
//! # See also
//! - `crate::paths` for where fragments live.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub mod codec;
pub mod fragment;

pub use codec::{decode, encode, CodecError, CodecResult};
pub use fragment::{
    clear_dir, ensure_dir, list_fragment_ids, open_fragment, write_fragment, ClearOutcome,
};

pub type FragmentResult<T> = Result<T, FragmentError>;

/// Failure touching one fragment or directory.
#[derive(Debug)]
pub enum FragmentError {
    Io { path: PathBuf, source: std::io::Error },
    Codec { path: PathBuf, source: CodecError },
}

impl FragmentError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn codec(path: &Path, source: CodecError) -> Self {
        Self::Codec {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Codec { path, .. } => path,
        }
    }
}

impl Display for FragmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "`{}`: {source}", path.display()),
            Self::Codec { path, source } => write!(f, "`{}`: {source}", path.display()),
        }
    }
}

impl Error for FragmentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Codec { source, .. } => Some(source),
        }
    }
}
