use anyhow::{anyhow, bail, Context, Result};
use crabsnap::{
    AspectRatio, CaptureView, CrabSnapConfig, CropRect, Facing, SessionEvent, SyntheticBackend,
};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};

const USAGE: &str = "Usage: crabsnap-cli <ratios|crop|session> [args]
  ratios [--config <path>] [--json]
  crop <width> <height> <ratio> [--config <path>] [--json]
  session [--facing front|back] [--ratio <label>] [--zoom <z>] [--captures <n>]
          [--switch] [--delete <index>] [--config <path>] [--json]";

#[tokio::main]
async fn main() -> Result<()> {
    crabsnap::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("{}", USAGE);
        std::process::exit(1);
    }

    match args[1].as_str() {
        "ratios" => cmd_ratios(&args[2..]),
        "crop" => cmd_crop(&args[2..]),
        "session" => cmd_session(&args[2..]).await,
        other => {
            eprintln!("Unknown command: {}\n{}", other, USAGE);
            std::process::exit(1);
        }
    }
}

/// Options shared by every command, plus the positional arguments left over.
#[derive(Default)]
struct Options {
    config: Option<PathBuf>,
    json: bool,
    facing: Option<Facing>,
    ratio: Option<String>,
    zoom: Option<f64>,
    captures: usize,
    switch: bool,
    delete: Option<usize>,
    positional: Vec<String>,
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut options = Options {
        captures: 1,
        ..Options::default()
    };

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| anyhow!("{} requires a value", name))
        };
        match arg.as_str() {
            "--config" => options.config = Some(PathBuf::from(value("--config")?)),
            "--json" => options.json = true,
            "--facing" => {
                options.facing = Some(value("--facing")?.parse().map_err(|e: String| anyhow!(e))?)
            }
            "--ratio" => options.ratio = Some(value("--ratio")?),
            "--zoom" => options.zoom = Some(value("--zoom")?.parse().context("invalid --zoom")?),
            "--captures" => {
                options.captures = value("--captures")?.parse().context("invalid --captures")?
            }
            "--switch" => options.switch = true,
            "--delete" => {
                options.delete = Some(value("--delete")?.parse().context("invalid --delete")?)
            }
            _ => options.positional.push(arg.clone()),
        }
    }

    Ok(options)
}

fn load_config(options: &Options) -> Result<CrabSnapConfig> {
    let config = match &options.config {
        Some(path) => CrabSnapConfig::load_from_file(path)?,
        None => CrabSnapConfig::load_or_default(),
    };
    Ok(config)
}

fn find_ratio(config: &CrabSnapConfig, label: &str) -> Result<AspectRatio> {
    config
        .aspect_ratios
        .iter()
        .find(|r| r.label == label)
        .cloned()
        .ok_or_else(|| anyhow!("unknown aspect ratio: {}", label))
}

fn cmd_ratios(args: &[String]) -> Result<()> {
    let options = parse_options(args)?;
    let config = load_config(&options)?;
    if options.json {
        println!("{}", serde_json::to_string(&config.aspect_ratios)?);
    } else {
        for ratio in &config.aspect_ratios {
            println!("{} ({}x{})", ratio.label, ratio.width, ratio.height);
        }
    }
    Ok(())
}

fn cmd_crop(args: &[String]) -> Result<()> {
    let options = parse_options(args)?;
    let [width, height, label] = options.positional.as_slice() else {
        bail!("Usage: crabsnap-cli crop <width> <height> <ratio>");
    };
    let width: u32 = width.parse().context("invalid width")?;
    let height: u32 = height.parse().context("invalid height")?;
    if width == 0 || height == 0 {
        bail!("frame dimensions must be positive");
    }

    let config = load_config(&options)?;
    let ratio = find_ratio(&config, label)?;
    let rect = CropRect::centered(width, height, &ratio)?;
    let pixels = rect.to_pixels(width, height);

    if options.json {
        println!(
            "{}",
            serde_json::json!({ "ratio": ratio, "rect": rect, "pixels": pixels })
        );
    } else {
        println!(
            "{}x{} @ {} -> crop {:.1}x{:.1} at ({:.1}, {:.1}), output {}x{}",
            width,
            height,
            ratio,
            rect.width,
            rect.height,
            rect.offset_x,
            rect.offset_y,
            pixels.width,
            pixels.height
        );
    }
    Ok(())
}

async fn cmd_session(args: &[String]) -> Result<()> {
    let options = parse_options(args)?;
    let mut config = load_config(&options)?;
    if let Some(facing) = options.facing {
        config.camera.default_facing = facing;
    }

    let backend = SyntheticBackend::new();
    let mut view = CaptureView::new(Arc::new(backend.clone()), config);
    let mut events = view.subscribe_events();

    // Failures are printed as events; the script carries on like the UI would.
    let _ = view.mount().await;
    if options.switch {
        let _ = view.switch_camera().await;
    }
    if let Some(label) = &options.ratio {
        view.select_aspect_ratio(label)?;
    }
    if let Some(zoom) = options.zoom {
        let _ = view.set_zoom(zoom).await;
    }
    for _ in 0..options.captures {
        let _ = view.capture();
    }
    if let Some(index) = options.delete {
        view.delete_image(index);
    }

    print_events(&mut events, options.json)?;

    let summaries: Vec<_> = view.gallery().list().iter().map(|img| img.summary()).collect();
    let state = view.snapshot();
    if options.json {
        println!(
            "{}",
            serde_json::json!({ "state": state, "gallery": summaries })
        );
    } else {
        println!(
            "Camera: {} (live: {}), zoom {} {:?}, ratio {}",
            state.facing, state.live, state.zoom_level, state.zoom_range, state.selected_ratio
        );
        if summaries.is_empty() {
            println!("{}", crabsnap::GalleryStore::EMPTY_PLACEHOLDER);
        }
        for (entry, image) in view.gallery().entries().zip(&summaries) {
            println!(
                "{}: {}x{} {} ({} bytes)",
                entry.label, image.width, image.height, image.mime_type, image.size_bytes
            );
        }
    }

    view.teardown();
    if backend.live_streams() != 0 {
        bail!("camera stream still live after teardown");
    }
    Ok(())
}

fn print_events(events: &mut broadcast::Receiver<SessionEvent>, json: bool) -> Result<()> {
    loop {
        let event = match events.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Lagged(skipped)) => {
                eprintln!("({} earlier events dropped)", skipped);
                continue;
            }
            Err(_) => break,
        };
        if json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            match &event {
                SessionEvent::Warning { error } => println!("warning: {}", error),
                other => println!("event: {:?}", other),
            }
        }
    }
    Ok(())
}
