use clap::Parser;
use env_logger::Env;
use tokio::runtime::Builder;

mod engine;
mod env;
mod gateway;
mod mods;
mod networking;
mod process;
mod settings;
mod storage;
mod ui;
mod util;

use crate::settings::LauncherSettings;

#[derive(Parser, Debug)]
#[command(
    name = "SA-MP Launcher",
    author,
    version,
    about = "Launcher for a single SA-MP roleplay server with mod updates"
)]
struct Cli {
    /// Print launcher version and exit without starting the UI.
    #[arg(long)]
    version_only: bool,

    /// Use the deterministic stand-in backend instead of the native one.
    #[arg(long, env = "LAUNCHER_STANDIN")]
    standin: bool,

    /// Query the configured server once, print its status and exit.
    #[arg(long)]
    status: bool,
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if cli.version_only {
        println!("SA-MP Launcher {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let settings = LauncherSettings::from_env();
    let gateway = gateway::select(&settings, cli.standin);

    if cli.status {
        print_server_status(gateway.as_ref(), &settings);
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_icon(default_icon())
            .with_inner_size(eframe::egui::vec2(560.0, 640.0))
            .with_min_inner_size(eframe::egui::vec2(480.0, 560.0)),
        ..Default::default()
    };
    eframe::run_native(
        "SA-MP Launcher",
        options,
        Box::new(move |cc| Ok(Box::new(ui::LauncherApp::new(cc, gateway, settings)))),
    )
}

fn print_server_status(gateway: &dyn gateway::CommandGateway, settings: &LauncherSettings) {
    let runtime = match Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            std::process::exit(1);
        }
    };
    let server = &settings.server;
    let result = runtime.block_on(gateway.fetch_server_status(&server.host, server.port));
    match result {
        Ok(status) if status.online => println!(
            "{} ({}:{}) online, {}/{} players, {} ms",
            status.name, server.host, server.port, status.players, status.max_players, status.ping_ms
        ),
        Ok(status) => println!("{} ({}:{}) offline", status.name, server.host, server.port),
        Err(err) => {
            println!(
                "{} ({}:{}) offline: {err}",
                settings.server_name, server.host, server.port
            );
        }
    }
}

fn default_icon() -> eframe::egui::IconData {
    // 2x2 icon: dark background with an orange accent.
    let rgba: Vec<u8> = vec![
        24, 20, 18, 255, 232, 140, 48, 255, //
        24, 20, 18, 255, 196, 104, 30, 255,
    ];
    eframe::egui::IconData {
        rgba,
        width: 2,
        height: 2,
    }
}
