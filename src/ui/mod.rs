use std::sync::Arc;
use std::time::{Duration, Instant};

use eframe::egui::{self, Align2, Color32, RichText};
use log::{error, warn};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::{mpsc, watch};

use crate::engine::models::{MAX_USERNAME_CHARS, Session};
use crate::engine::state::{
    DownloadKind, LauncherEvent, LauncherSnapshot, Notice, NoticeAction, NoticeLevel, UserAction,
};
use crate::engine::{LauncherController, POLL_INTERVAL};
use crate::gateway::CommandGateway;
use crate::settings::LauncherSettings;

const TOAST_TTL: Duration = Duration::from_secs(6);
const IDLE_REPAINT: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ThemePalette {
    text_muted: Color32,
    accent: Color32,
    success: Color32,
    info: Color32,
    warning: Color32,
    danger: Color32,
}

impl ThemePalette {
    const fn dark() -> Self {
        Self {
            text_muted: Color32::from_rgb(167, 182, 197),
            accent: Color32::from_rgb(232, 140, 48),
            success: Color32::from_rgb(92, 219, 140),
            info: Color32::from_rgb(122, 186, 255),
            warning: Color32::from_rgb(246, 195, 111),
            danger: Color32::from_rgb(239, 117, 117),
        }
    }

    fn for_level(&self, level: NoticeLevel) -> Color32 {
        match level {
            NoticeLevel::Info => self.info,
            NoticeLevel::Success => self.success,
            NoticeLevel::Warning => self.warning,
            NoticeLevel::Error => self.danger,
        }
    }
}

fn build_runtime() -> Arc<Runtime> {
    match Runtime::new() {
        Ok(rt) => Arc::new(rt),
        Err(err) => {
            warn!(
                "ui: failed to create multithreaded runtime ({}); trying single-threaded runtime",
                err
            );
            match Builder::new_current_thread().enable_all().build() {
                Ok(rt) => Arc::new(rt),
                Err(fallback_err) => {
                    error!(
                        "ui: failed to create any Tokio runtime ({}); terminating launcher",
                        fallback_err
                    );
                    std::process::exit(1);
                }
            }
        }
    }
}

// Path and username problems are reported by the controller, so only an
// in-flight join disables the button.
fn join_enabled(session: &Session) -> bool {
    !session.is_joining
}

struct Toast {
    notice: Notice,
    shown_at: Instant,
}

/// Presentation only. Every decision lives in the controller.
pub struct LauncherApp {
    runtime: Arc<Runtime>,
    controller: LauncherController,
    state_rx: watch::Receiver<LauncherSnapshot>,
    events_rx: mpsc::UnboundedReceiver<LauncherEvent>,
    snapshot: LauncherSnapshot,
    toasts: Vec<Toast>,
    update_prompt: Option<String>,
    launcher_version: &'static str,
}

impl LauncherApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        gateway: Arc<dyn CommandGateway>,
        settings: LauncherSettings,
    ) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        let runtime = build_runtime();
        let (controller, events_rx) = LauncherController::new(gateway, settings);
        let state_rx = controller.subscribe();
        let snapshot = state_rx.borrow().clone();

        let bootstrap = controller.clone();
        runtime.spawn(async move {
            bootstrap.initialize().await;
            bootstrap.start_polling(POLL_INTERVAL);
        });

        Self {
            runtime,
            snapshot,
            controller,
            state_rx,
            events_rx,
            toasts: Vec::new(),
            update_prompt: None,
            launcher_version: env!("CARGO_PKG_VERSION"),
        }
    }

    fn trigger_action(&self, action: UserAction) {
        let controller = self.controller.clone();
        self.runtime.spawn(async move {
            controller.handle_action(action).await;
        });
    }

    fn sync_state(&mut self) {
        if self.state_rx.has_changed().unwrap_or(false) {
            self.snapshot = self.state_rx.borrow_and_update().clone();
        }
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                LauncherEvent::Notice(notice) => self.push_toast(notice),
                LauncherEvent::ServerOffline { name } => self.push_toast(Notice::new(
                    NoticeLevel::Warning,
                    "Server offline",
                    format!("{name} is not responding right now."),
                )),
                LauncherEvent::ModUpdatePrompt { version } => self.update_prompt = Some(version),
            }
        }
        self.toasts
            .retain(|toast| toast.shown_at.elapsed() < TOAST_TTL);
    }

    fn push_toast(&mut self, notice: Notice) {
        self.toasts.push(Toast {
            notice,
            shown_at: Instant::now(),
        });
    }

    fn render_server(&self, ui: &mut egui::Ui, colors: &ThemePalette) {
        ui.group(|ui| {
            ui.set_width(ui.available_width());
            let settings = self.controller.settings();
            match &self.snapshot.server_status {
                Some(status) if !self.snapshot.session.is_loading => {
                    ui.heading(&status.name);
                    ui.label(
                        RichText::new(format!("{}:{}", settings.server.host, settings.server.port))
                            .color(colors.text_muted),
                    );
                    if status.online {
                        ui.label(RichText::new("Online").color(colors.success).strong());
                        ui.label(format!(
                            "Players: {}/{}   Ping: {} ms",
                            status.players, status.max_players, status.ping_ms
                        ));
                    } else {
                        ui.label(RichText::new("Offline").color(colors.danger).strong());
                    }
                }
                _ => {
                    ui.heading(&settings.server_name);
                    ui.label(RichText::new("Checking...").color(colors.text_muted));
                }
            }
            if ui.button("Refresh").clicked() {
                self.trigger_action(UserAction::RefreshServerStatus);
            }
        });
    }

    fn render_controls(&self, ui: &mut egui::Ui, colors: &ThemePalette) {
        let session = self.snapshot.session.clone();
        ui.group(|ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new("GTA San Andreas folder").strong());
            ui.horizontal(|ui| {
                let (text, color) = if session.install_path.is_empty() {
                    ("No folder selected".to_owned(), colors.text_muted)
                } else if session.install_path_valid {
                    (session.install_path.clone(), colors.success)
                } else {
                    (session.install_path.clone(), colors.danger)
                };
                ui.label(RichText::new(text).color(color));
                if ui.button("Browse").clicked() {
                    self.trigger_action(UserAction::BrowsePath);
                }
            });

            ui.add_space(8.0);
            ui.label(RichText::new("Username").strong());
            let mut username = session.username.clone();
            let response = ui.add(
                egui::TextEdit::singleline(&mut username)
                    .char_limit(MAX_USERNAME_CHARS)
                    .hint_text("Your in-game name"),
            );
            if response.changed() {
                self.controller.set_username(username);
            }

            ui.add_space(8.0);
            let join_label = if session.is_joining {
                "Joining..."
            } else {
                "Join Server"
            };
            let join = egui::Button::new(RichText::new(join_label).strong())
                .fill(colors.accent)
                .min_size(egui::vec2(ui.available_width(), 40.0));
            if ui.add_enabled(join_enabled(&session), join).clicked() {
                self.trigger_action(UserAction::JoinServer);
            }
        });
    }

    fn render_mod(&self, ui: &mut egui::Ui, colors: &ThemePalette) {
        let session = &self.snapshot.session;
        ui.group(|ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new("Mod package").strong());
            match &self.snapshot.mod_info {
                Some(info) if info.needs_update => {
                    ui.label(
                        RichText::new(format!("Installed {}; update available", info.version))
                            .color(colors.warning),
                    );
                }
                Some(info) => {
                    ui.label(
                        RichText::new(format!("Installed {} (up to date)", info.version))
                            .color(colors.success),
                    );
                }
                None => {
                    ui.label(RichText::new("Select a game folder to check").color(colors.text_muted));
                }
            }
            ui.horizontal(|ui| {
                let update_label = if session.is_updating_mod {
                    "Updating..."
                } else {
                    "Update Mod"
                };
                if ui
                    .add_enabled(!session.is_updating_mod, egui::Button::new(update_label))
                    .clicked()
                {
                    self.trigger_action(UserAction::UpdateMod);
                }
                if ui.button("Download GTA SA").clicked() {
                    self.trigger_action(UserAction::OpenDownloadPage(DownloadKind::GameClient));
                }
                if ui.button("Download Mod").clicked() {
                    self.trigger_action(UserAction::OpenDownloadPage(DownloadKind::ModPackage));
                }
            });
        });
    }

    fn render_toasts(&mut self, ctx: &egui::Context, colors: &ThemePalette) {
        let mut clicked_update = false;
        egui::Area::new(egui::Id::new("toasts"))
            .anchor(Align2::RIGHT_BOTTOM, egui::vec2(-12.0, -12.0))
            .show(ctx, |ui| {
                for toast in &self.toasts {
                    let notice = &toast.notice;
                    ui.group(|ui| {
                        ui.label(
                            RichText::new(&notice.title)
                                .color(colors.for_level(notice.level))
                                .strong(),
                        );
                        ui.label(&notice.message);
                        if notice.action == Some(NoticeAction::UpdateMod)
                            && ui.small_button("Update now").clicked()
                        {
                            clicked_update = true;
                        }
                    });
                }
            });
        if clicked_update {
            self.toasts
                .retain(|toast| toast.notice.action != Some(NoticeAction::UpdateMod));
            self.trigger_action(UserAction::UpdateMod);
        }
    }

    fn render_update_prompt(&mut self, ctx: &egui::Context) {
        let Some(version) = self.update_prompt.clone() else {
            return;
        };
        let mut choice = None;
        egui::Window::new("Mod update available")
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(format!(
                    "Your mod ({version}) is out of date. Update it now?"
                ));
                ui.horizontal(|ui| {
                    if ui.button("Update").clicked() {
                        choice = Some(UserAction::UpdateMod);
                    }
                    if ui.button("Later").clicked() {
                        choice = Some(UserAction::DismissUpdatePrompt);
                    }
                });
            });
        if let Some(action) = choice {
            self.update_prompt = None;
            self.trigger_action(action);
        }
    }
}

impl eframe::App for LauncherApp {
    fn update(&mut self, ctx: &eframe::egui::Context, _frame: &mut eframe::Frame) {
        self.sync_state();
        let colors = ThemePalette::dark();

        egui::TopBottomPanel::bottom("bottom_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(format!("v{}", self.launcher_version))
                        .color(colors.text_muted)
                        .small(),
                );
                ui.label(
                    RichText::new(format!("backend: {}", self.controller.gateway_name()))
                        .color(colors.text_muted)
                        .small(),
                );
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading(RichText::new("SA-MP Launcher").color(colors.accent));
                ui.add_space(8.0);
                self.render_server(ui, &colors);
                ui.add_space(8.0);
                self.render_controls(ui, &colors);
                ui.add_space(8.0);
                self.render_mod(ui, &colors);
            });
        });

        self.render_toasts(ctx, &colors);
        self.render_update_prompt(ctx);
        ctx.request_repaint_after(IDLE_REPAINT);
    }
}

impl Drop for LauncherApp {
    fn drop(&mut self) {
        let controller = self.controller.clone();
        self.runtime.block_on(controller.shutdown());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_stays_clickable_without_valid_path() {
        let mut session = Session {
            install_path_valid: false,
            ..Session::default()
        };
        assert!(join_enabled(&session));

        session.is_joining = true;
        assert!(!join_enabled(&session));
    }
}
