//! Interactive four-viewport window.
//!
//! Left drag orbits the perspective view, right drag pans, the wheel zooms.
//! Keys: D measure distance, A measure angle, P point annotation (Enter to
//! place it), S select, F fullscreen the view under the cursor, R reset
//! cameras, G grid, C crosshair, Z/Y undo/redo.
//!
//! Run with: cargo run --example window_viewer -- [model.stl|.ply|.obj]

use dentiscope::{SessionCommand, Viewer, ViewerOptions};

fn main() {
    dentiscope::init_logging();

    let options = ViewerOptions {
        default_viewport_size: (1280, 960),
        ..ViewerOptions::default()
    };
    let mut viewer = Viewer::new(options);
    if let Some(path) = std::env::args().nth(1) {
        let bytes = std::fs::read(&path).expect("Failed to read model file");
        viewer.enqueue(SessionCommand::LoadModel { name: path, bytes });
    }

    if let Err(e) = dentiscope::window::run(viewer) {
        eprintln!("viewer stopped: {e}");
        std::process::exit(1);
    }
}
