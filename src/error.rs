use std::path::PathBuf;

/// Errors surfaced by the training and persistence paths.
///
/// Matching never returns an error: queries that cannot be matched
/// produce a null [`MatchData`](crate::MatchData) instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `.net` or `.ids` file required to load a trained object is
    /// absent or unreadable. The object must be retrained.
    #[error("missing artifact: {}", .0.display())]
    MissingArtifact(PathBuf),

    /// Entity names are registered bare; braces are added internally.
    #[error("entity name {0:?} must not be wrapped in braces")]
    InvalidEntityName(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("artifact encode/decode failed: {0}")]
    Persist(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
