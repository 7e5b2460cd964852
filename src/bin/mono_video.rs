//! mono_video - play a video file or webcam stream into the tracker
//!
//! ```bash
//! mono_video ORBvoc.txt settings.toml video.mp4
//! mono_video ORBvoc.txt settings.toml 0
//! mono_video ORBvoc.txt settings.toml "stub://demo?frames=90&fps=30"
//! ```

use std::io::IsTerminal;
use std::process::ExitCode;

use mono_video::{
    run_cli, ConsoleDisplay, Driver, DriverConfig, SystemOpener, TrajectoryRecorder, Ui,
};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match DriverConfig::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {:#}", err);
            return ExitCode::from(1);
        }
    };
    let catalog = match config.catalog() {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("invalid backend list: {:#}", err);
            return ExitCode::from(1);
        }
    };
    log::debug!("backend probe order: {}", catalog.names().join(", "));

    let ui = Ui::new(config.ui, std::io::stderr().is_terminal());
    let display = match ConsoleDisplay::install(ui.is_pretty()) {
        Ok(display) => display,
        Err(err) => {
            eprintln!("{:#}", err);
            return ExitCode::from(1);
        }
    };

    let mut driver = Driver::new(config, catalog, SystemOpener, display).with_ui(ui);
    let code = run_cli(std::env::args_os(), &mut driver, TrajectoryRecorder::open);
    ExitCode::from(code)
}
