use crate::engine::models::{ModInfo, ServerStatus, Session};

// The central source of truth for the UI.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LauncherSnapshot {
    pub session: Session,
    pub server_status: Option<ServerStatus>,
    pub mod_info: Option<ModInfo>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Follow-up the UI can offer next to a notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeAction {
    UpdateMod,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
    pub action: Option<NoticeAction>,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
            action: None,
        }
    }

    pub fn with_action(mut self, action: NoticeAction) -> Self {
        self.action = Some(action);
        self
    }
}

// One-shot signals for the UI, as opposed to the continuously published snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LauncherEvent {
    Notice(Notice),
    ServerOffline { name: String },
    ModUpdatePrompt { version: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownloadKind {
    GameClient,
    ModPackage,
}

impl DownloadKind {
    pub fn label(self) -> &'static str {
        match self {
            DownloadKind::GameClient => "GTA San Andreas",
            DownloadKind::ModPackage => "mod package",
        }
    }
}

// Actions triggered by the user from the UI layer.
#[derive(Clone, Debug)]
pub enum UserAction {
    BrowsePath,
    SetUsername(String),
    JoinServer,
    UpdateMod,
    DismissUpdatePrompt,
    RefreshServerStatus,
    OpenDownloadPage(DownloadKind),
}
