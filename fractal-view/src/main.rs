//! Application entry point for the fractal tree viewer.
//!
//! This binary sets up logging and eframe/egui, and delegates all
//! interactive logic and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use viewer::Viewer;

/// Starts the native eframe application.
///
/// Logging goes through `env_logger`; set `RUST_LOG=fractal_core=debug`
/// to see hierarchy rebuilds.
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop,
///   or the initial fractal cannot be built.
fn main() -> eframe::Result<()> {
    env_logger::init();

    let viewer = Viewer::new().map_err(|e| eframe::Error::AppCreation(Box::new(e)))?;
    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "Fractal Tree",
        options,
        Box::new(move |_cc| Ok(Box::new(viewer))),
    )
}
