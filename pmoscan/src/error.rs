//! Types d'erreurs pour pmoscan

use std::path::PathBuf;

/// Erreurs de scan du répertoire de photos
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("I/O error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Type Result spécialisé pour pmoscan
pub type Result<T> = std::result::Result<T, ScanError>;
