#![allow(clippy::cast_precision_loss)]
//! Headless viewer demonstration.
//!
//! Loads a model (or a generated crown-like shape), measures across it in
//! the coronal view and writes every viewport to PNG. Needs a GPU adapter
//! (a software one such as lavapipe or WARP works).
//!
//! Run with: cargo run --example headless_viewer -- [model.stl|.ply|.obj] [out-dir]

use std::f32::consts::PI;
use std::fmt::Write as _;
use std::time::Duration;

use dentiscope::{
    ExportConfig, SessionCommand, Tool, Vec3, Viewer, ViewerOptions, ViewportKind,
};

/// A squashed sphere standing in for a molar crown, 12 mm wide.
fn crown_obj() -> Result<String, std::fmt::Error> {
    let (rings, segments) = (16, 24);
    let mut obj = String::new();
    for ring in 0..=rings {
        let phi = PI * ring as f32 / rings as f32;
        for segment in 0..segments {
            let theta = 2.0 * PI * segment as f32 / segments as f32;
            let bump = 1.0 + 0.08 * (4.0 * theta).cos() * phi.sin();
            let p = Vec3::new(
                6.0 * bump * phi.sin() * theta.cos(),
                4.5 * phi.cos(),
                5.5 * bump * phi.sin() * theta.sin(),
            );
            writeln!(obj, "v {} {} {}", p.x, p.y, p.z)?;
        }
    }
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * segments + segment + 1;
            let b = ring * segments + (segment + 1) % segments + 1;
            let c = a + segments;
            let d = b + segments;
            writeln!(obj, "f {a} {c} {b}\nf {b} {c} {d}")?;
        }
    }
    Ok(obj)
}

fn main() {
    dentiscope::init_logging();

    let mut args = std::env::args().skip(1);
    let (name, bytes) = match args.next() {
        Some(path) => {
            let bytes = std::fs::read(&path).expect("Failed to read model file");
            (path, bytes)
        }
        None => (
            "crown.obj".to_string(),
            crown_obj().expect("Failed to generate crown").into_bytes(),
        ),
    };
    let out_dir = args.next().unwrap_or_else(|| "dentiscope-frames".to_string());
    std::fs::create_dir_all(&out_dir).expect("Failed to create output directory");

    let options = ViewerOptions {
        default_viewport_size: (800, 600),
        ..ViewerOptions::default()
    };
    let mut viewer = Viewer::new(options);
    viewer.enqueue(SessionCommand::LoadModel { name, bytes });
    viewer
        .settle(Duration::from_secs(30))
        .expect("Failed to render first frame");

    // Measure straight across the model in the coronal (bottom-left) view.
    let (width, height) = viewer.surface();
    let (cx, cy) = (width as f32 / 4.0, height as f32 * 0.75);
    viewer.enqueue(SessionCommand::SetTool(Some(Tool::MeasureDistance)));
    viewer.apply_queued();
    for dx in [-60.0, 60.0] {
        if !viewer.click(cx + dx, cy) {
            log::warn!("pick at offset {dx} missed the model");
        }
    }
    viewer.enqueue(SessionCommand::Orbit {
        viewport: ViewportKind::Perspective,
        delta_x: 0.4,
        delta_y: 0.1,
    });

    let frames = viewer.frame().expect("Failed to render");
    for rendered in &frames {
        let path = format!("{out_dir}/{}.png", rendered.rect.kind);
        rendered.frame.save(&path).expect("Failed to save frame");
        println!("wrote {path}");
    }

    for measurement in viewer.session().records().measurements() {
        println!("measured {}", measurement.display_text());
    }

    let assets = viewer
        .session_mut()
        .export(&ExportConfig::default())
        .expect("Failed to export");
    let written = dentiscope::export::write_assets(&out_dir, &assets).expect("Failed to write export");
    for path in written {
        println!("exported {}", path.display());
    }
    for notice in viewer.session_mut().drain_notices() {
        println!("[{:?}] {}", notice.level, notice.message);
    }
}
