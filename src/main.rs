#![cfg_attr(all(feature = "windows_gui", target_os = "windows"), windows_subsystem = "windows")]

use anyhow::{anyhow, Result};
use eframe::egui;
use hunt_overlay::controller::OverlayController;
use hunt_overlay::files::{self, RuntimePaths};
use hunt_overlay::gui::OverlayApp;
use hunt_overlay::settings::{self, ConfigStore};
use hunt_overlay::style::StyleCatalog;
use hunt_overlay::{catalog, logging, win_util};

const FALLBACK_SCREEN: (i32, i32) = (1920, 1080);

fn main() -> Result<()> {
    let dir = files::runtime_dir();
    let debug_logging = settings::peek_debug_logging(&dir.join(files::CONFIG_FILE));
    logging::init(debug_logging, debug_logging.then(|| dir.join(files::LOG_FILE)));
    tracing::info!(dir = %dir.display(), debug = debug_logging, "starting hunt overlay");

    let paths = RuntimePaths::prepare(dir, &files::bundle_dirs())?;
    let styles = StyleCatalog::load_file(&paths.style_data)?;
    let points = catalog::load_file(&paths.poi_data)?;
    let store = ConfigStore::new(&paths.config, styles.palette());

    let (width, height) = win_util::screen_size().unwrap_or(FALLBACK_SCREEN);
    let controller = OverlayController::new(store, styles, points, width, height);
    tracing::info!("controls:\n{}", controller.help_text());

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Hunt Overlay")
            .with_transparent(true)
            .with_decorations(false)
            .with_always_on_top()
            .with_mouse_passthrough(true)
            .with_taskbar(false)
            .with_position([0.0, 0.0])
            .with_fullscreen(true),
        ..Default::default()
    };

    eframe::run_native(
        "Hunt Overlay",
        native_options,
        Box::new(move |_cc| {
            Box::new(OverlayApp::new(controller, Box::new(win_util::SystemInput)))
        }),
    )
    .map_err(|e| anyhow!("overlay window failed: {e}"))
}
