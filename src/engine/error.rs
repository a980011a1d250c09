use thiserror::Error;

use crate::engine::models::MAX_USERNAME_CHARS;
use crate::engine::state::DownloadKind;
use crate::gateway::GatewayError;

/// Why a user-facing action did not complete.
#[derive(Debug, Error)]
pub enum LauncherError {
    #[error("select a valid GTA San Andreas folder first")]
    InvalidInstallPath,
    #[error("the selected folder does not contain gta_sa.exe")]
    MissingGameExecutable,
    #[error("enter a username first")]
    EmptyUsername,
    #[error("username may be at most {} characters", MAX_USERNAME_CHARS)]
    UsernameTooLong,
    #[error("no mod download link is configured")]
    ModLinkUnavailable,
    #[error("no download link is configured for {}", .0.label())]
    DownloadLinkUnavailable(DownloadKind),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl LauncherError {
    /// Precondition rejections are reported before any backend call is made.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, LauncherError::Gateway(_))
    }
}
