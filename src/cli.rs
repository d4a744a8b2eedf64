// Copyright 2026 the Turbo Eraser Authors
// SPDX-License-Identifier: Apache-2.0

//! Headless front end.
//!
//! Replays brush strokes given on the command line against an image,
//! waits for the debounced inference round trip, and writes the result:
//!
//! ```text
//! turbo-eraser -i photo.png -o clean.png --stroke "120,80 180,80 180,140"
//! turbo-eraser -i photo.png -o clean.png --canvas-size 1024 --no-crop \
//!     --stroke "40,40" --stroke "300,310 320,330" --brush-size 60
//! ```

use crate::config::EraserConfig;
use crate::driver::{self, UiCommand};
use crate::editing::{EditSession, SessionStatus, SessionUpdate};
use crate::image_io;
use crate::inference::{HttpInferenceClient, InferenceBackend};
use anyhow::{Context, bail};
use clap::Parser;
use image::RgbaImage;
use kurbo::Point;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Grace period for abandoned workers when the runtime shuts down
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Erase regions of an image with a local image-edit model.
#[derive(Parser, Debug)]
#[command(name = "turbo-eraser", version, about)]
pub struct CliArgs {
    /// Image to edit.
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Where to write the edited image; format follows the extension.
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// One brush stroke as space-separated "x,y" canvas points.
    /// Repeat for several strokes.
    #[arg(short, long = "stroke", value_name = "POINTS", value_parser = parse_stroke, required = true)]
    pub strokes: Vec<StrokePath>,

    /// Brush diameter in canvas pixels (5-150).
    #[arg(short, long)]
    pub brush_size: Option<f64>,

    /// TOML config file; flags below override it.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    #[arg(long)]
    pub model: Option<String>,

    #[arg(long)]
    pub prompt: Option<String>,

    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<f64>,

    /// Letterbox the input onto a square canvas of this size first.
    #[arg(long, value_name = "PX")]
    pub canvas_size: Option<u32>,

    /// Always send the whole canvas instead of a crop around the mask.
    #[arg(long)]
    pub no_crop: bool,

    /// Also write the mask overlay preview to this file.
    #[arg(long, value_name = "FILE")]
    pub mask_preview: Option<PathBuf>,

    /// Debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Points of one stroke, in drag order
#[derive(Debug, Clone, PartialEq)]
pub struct StrokePath(pub Vec<Point>);

impl CliArgs {
    /// Config file (or defaults) with command line overrides applied.
    pub fn resolve_config(&self) -> anyhow::Result<EraserConfig> {
        let mut config = match &self.config {
            Some(path) => EraserConfig::load(path)?,
            None => EraserConfig::default(),
        };

        if let Some(endpoint) = &self.endpoint {
            config.inference.endpoint = endpoint.clone();
        }
        if let Some(model) = &self.model {
            config.inference.model = model.clone();
        }
        if let Some(prompt) = &self.prompt {
            config.inference.prompt = prompt.clone();
        }
        if let Some(timeout) = self.timeout_secs {
            config.inference.timeout_secs = timeout;
        }
        if let Some(size) = self.canvas_size {
            config.editor.canvas_size = Some(size);
        }
        if let Some(size) = self.brush_size {
            config.editor.brush_size = size;
        }
        if self.no_crop {
            config.editor.crop_to_mask = false;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_point(text: &str) -> Result<Point, String> {
    let (x, y) = text
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {text:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid coordinate {v:?}"))
    };
    Ok(Point::new(parse(x)?, parse(y)?))
}

/// Parse `"x,y x,y ..."`; `;` also separates points.
pub fn parse_stroke(text: &str) -> Result<StrokePath, String> {
    let points = text
        .split(|c: char| c.is_whitespace() || c == ';')
        .filter(|s| !s.is_empty())
        .map(parse_point)
        .collect::<Result<Vec<_>, _>>()?;
    if points.is_empty() {
        return Err("a stroke needs at least one point".to_string());
    }
    Ok(StrokePath(points))
}

/// Run the headless erase.
pub fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = args.resolve_config()?;
    let image = image_io::load_image(&args.input)?;
    let backend: Arc<dyn InferenceBackend> =
        Arc::new(HttpInferenceClient::from_config(&config.inference));
    tracing::info!(
        "Using {} ({}) at {}",
        config.inference.model,
        config.inference.prompt,
        config.inference.endpoint
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start async runtime")?;
    let erased = runtime.block_on(erase(
        EditSession::new(&config),
        backend,
        image,
        &args.strokes,
        args.mask_preview.is_some(),
    ));
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    let Erased { session, preview } = erased?;

    if let (Some(path), Some(preview)) = (&args.mask_preview, preview) {
        image_io::save_image(&preview, path)?;
        tracing::info!("Wrote mask preview to {}", path.display());
    }

    if let SessionStatus::Error(message) = session.status() {
        bail!("Inference failed: {message}");
    }
    let result = session.image().context("No image loaded")?;
    image_io::save_image(result, &args.output)?;
    println!(
        "{} ({}) -> {}",
        session.status().label(),
        session.status().latency_label().unwrap_or_default(),
        args.output.display()
    );
    Ok(())
}

struct Erased {
    session: EditSession,
    /// Image with the mask overlay, captured before the request was sent
    preview: Option<RgbaImage>,
}

async fn erase(
    mut session: EditSession,
    backend: Arc<dyn InferenceBackend>,
    image: RgbaImage,
    strokes: &[StrokePath],
    want_preview: bool,
) -> anyhow::Result<Erased> {
    // Paint directly so the preview reflects the mask before it is sent;
    // the driver takes over the pending debounce.
    session.open_image(image);
    let now = tokio::time::Instant::now();
    for StrokePath(points) in strokes {
        let Some((first, rest)) = points.split_first() else {
            continue;
        };
        let last = rest.last().copied().unwrap_or(*first);
        session.drag_begin(*first);
        for point in rest {
            session.drag_update(*point);
        }
        session.drag_end(last, now);
    }
    if session.mask().is_empty() {
        bail!("Strokes do not touch the image");
    }
    let preview = if want_preview { session.preview() } else { None };
    session.take_events();

    let (commands, command_rx) = mpsc::unbounded_channel::<UiCommand>();
    let (update_tx, mut updates) = mpsc::unbounded_channel();
    let driver = tokio::spawn(driver::run(session, backend, command_rx, update_tx));
    drop(commands);

    while let Some(update) = updates.recv().await {
        if let SessionUpdate::StatusChanged(status) = update {
            tracing::info!("{}", status.label());
        }
    }

    let session = driver.await.context("Session task failed")?;
    Ok(Erased { session, preview })
}
