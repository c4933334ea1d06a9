use clap::Parser;
use std::path::{Path, PathBuf};
use std::time::Instant;
use windstream_core::{
    CanvasSurface, FrameOutcome, FrameStats, GeoPoint, GridLayout, RasterCanvas, RowOrder,
    StaticWindSource, StreamlineConfig, StreamlineLayer, UpdateStatus, ViewState, WindGrid,
};

/// Wind streamline demo rendering to an in-memory canvas
#[derive(Parser, Debug)]
#[command(name = "windstream-demo")]
#[command(about = "Headless wind streamline animation over a synthetic vortex", long_about = None)]
struct Args {
    /// Number of frames to animate
    #[arg(short, long, default_value_t = 200)]
    frames: u32,

    /// Map centre latitude
    #[arg(long, default_value_t = -32.0, allow_hyphen_values = true)]
    lat: f64,

    /// Map centre longitude
    #[arg(long, default_value_t = 116.0, allow_hyphen_values = true)]
    lng: f64,

    /// Map zoom level
    #[arg(short, long, default_value_t = 5)]
    zoom: u8,

    /// Viewport width in logical pixels
    #[arg(long, default_value_t = 640)]
    width: u32,

    /// Viewport height in logical pixels
    #[arg(long, default_value_t = 480)]
    height: u32,

    /// Device pixel ratio
    #[arg(long, default_value_t = 1.0)]
    dpr: f32,

    /// Particle density multiplier
    #[arg(short, long, default_value_t = 1.0)]
    density: f32,

    /// Peak vortex wind speed in m/s
    #[arg(short, long, default_value_t = 15.0)]
    wind_speed: f32,

    /// Radius in degrees of a no-data hole at the vortex eye (0 = none)
    #[arg(long, default_value_t = 1.0)]
    hole_radius: f64,

    /// Disable the colour mask under the particles
    #[arg(long)]
    no_mask: bool,

    /// Pace frames at the configured frame period
    #[arg(long)]
    realtime: bool,

    /// Seed for particle placement
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Report interval in frames
    #[arg(short, long, default_value_t = 25)]
    report_interval: u32,

    /// Write the final composited frame to this PNG
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    println!("=== Wind Streamline Demo ===\n");

    let centre = GeoPoint::new(args.lat, args.lng);
    let view = match ViewState::centered(centre, args.zoom, (args.width, args.height)) {
        Ok(view) => view,
        Err(e) => {
            eprintln!("Invalid view: {e}");
            std::process::exit(1);
        }
    };
    println!(
        "View: zoom {} centred on ({:.2}, {:.2}), bounds S{:.2} W{:.2} N{:.2} E{:.2}",
        view.zoom,
        args.lat,
        args.lng,
        view.bounds.south,
        view.bounds.west,
        view.bounds.north,
        view.bounds.east
    );

    let mut config = StreamlineConfig::default().for_device_pixel_ratio(args.dpr);
    if args.no_mask {
        config.mask = None;
    }
    let (width, height) = view.device_size(config.retina_scale);
    println!("Canvas: {}x{} device pixels (dpr {:.1})", width, height, config.retina_scale);

    let grid = match vortex_grid(&view, args.wind_speed, args.hole_radius) {
        Ok(grid) => grid,
        Err(e) => {
            eprintln!("Failed to build wind grid: {e}");
            std::process::exit(1);
        }
    };
    let layout = grid.layout();
    println!(
        "Wind grid: {}x{} cells at {:.2} deg, peak {:.1} m/s\n",
        layout.nlng, layout.nlat, layout.dlat, args.wind_speed
    );

    let mut layer = StreamlineLayer::with_seed(
        RasterCanvas::new(width, height),
        RasterCanvas::new(width, height),
        config,
        args.seed,
    );
    layer.start_animation(args.density);

    let started = Instant::now();
    if layer.set_wind_data(Box::new(StaticWindSource::new(grid)), &view) != UpdateStatus::Applied {
        eprintln!("Wind field was not applied");
        std::process::exit(1);
    }
    if let Some(field) = layer.current_field() {
        let (cols, rows) = field.grid_size();
        println!(
            "Sampled field: {}/{} cells with data (built in {:.1} ms)",
            field.defined_cells(),
            cols * rows,
            started.elapsed().as_secs_f64() * 1000.0
        );
    }

    if args.realtime {
        println!(
            "Running {} frames at {} ms per frame...",
            args.frames,
            layer.config().frame_period_ms
        );
        let ran = layer.animation_mut().run(Some(u64::from(args.frames)));
        println!("Ran {} frames", ran);
    } else {
        run_frames(&mut layer, &args);
    }

    println!("\n=== Animation Complete ===");
    println!("Particles: {}", layer.animation().particle_count());
    println!("Frames rendered: {}", layer.animation().frames_rendered());
    println!("Lit trail pixels: {}", layer.trail_canvas().painted_pixels());
    println!("Elapsed: {:.2}s", started.elapsed().as_secs_f64());

    if let Some(path) = &args.output {
        match save_png(path, layer.mask_canvas(), layer.trail_canvas()) {
            Ok(()) => println!("Saved final frame to {}", path.display()),
            Err(e) => eprintln!("Failed to save {}: {e}", path.display()),
        }
    }
}

fn run_frames(layer: &mut StreamlineLayer<RasterCanvas>, args: &Args) {
    println!("Frame | Drawn | Coasting | Stalled | Respawned | Failed");
    println!("------|-------|----------|---------|-----------|-------");

    let mut window = FrameStats::default();
    let mut failed = 0;
    for frame in 1..=args.frames {
        match layer.frame() {
            FrameOutcome::Rendered(stats) => window.merge(stats),
            FrameOutcome::Failed(_) => failed += 1,
            FrameOutcome::Idle | FrameOutcome::Cancelled => {
                println!("Animation stopped at frame {frame}");
                break;
            }
        }
        if frame % args.report_interval.max(1) == 0 {
            println!(
                "{:5} | {:5} | {:8} | {:7} | {:9} | {:6}",
                frame, window.drawn, window.coasting, window.stalled, window.respawned, failed
            );
            window = FrameStats::default();
            failed = 0;
        }
    }
}

/// Counter-clockwise vortex centred on the view, with an optional hole of
/// missing data at its eye
fn vortex_grid(
    view: &ViewState,
    peak: f32,
    hole_radius: f64,
) -> Result<WindGrid, windstream_core::GridError> {
    let bounds = view.bounds;
    let margin = 1.0;
    let step = 0.25;
    let nlng = ((bounds.east - bounds.west + 2.0 * margin) / step).ceil() as usize + 1;
    let nlat = ((bounds.north - bounds.south + 2.0 * margin) / step).ceil() as usize + 1;
    let origin = GeoPoint::new(bounds.north + margin, bounds.west - margin);
    let centre = GeoPoint::new(
        (bounds.north + bounds.south) / 2.0,
        (bounds.east + bounds.west) / 2.0,
    );
    let radius = ((bounds.north - bounds.south).max(bounds.east - bounds.west) / 3.0).max(step);

    let mut u = Vec::with_capacity(nlng * nlat);
    let mut v = Vec::with_capacity(nlng * nlat);
    for row in 0..nlat {
        for col in 0..nlng {
            let lat = origin.lat - row as f64 * step;
            let lng = origin.lng + col as f64 * step;
            let (dx, dy) = (lng - centre.lng, lat - centre.lat);
            let r = dx.hypot(dy);
            if r < hole_radius {
                u.push(f32::NAN);
                v.push(f32::NAN);
                continue;
            }
            // Rankine profile: solid body inside the radius, decaying outside
            let profile = if r < radius { r / radius } else { radius / r };
            let speed = profile * f64::from(peak);
            let (su, sv) = if r > 0.0 { (-dy / r, dx / r) } else { (0.0, 0.0) };
            u.push((su * speed) as f32);
            v.push((sv * speed) as f32);
        }
    }

    let layout = GridLayout {
        nlng,
        nlat,
        origin,
        dlat: step,
        dlng: step,
        row_order: RowOrder::NorthToSouth,
    };
    WindGrid::new(layout, u, v)
}

/// Trails over mask, source-over
fn composite(mask: &[u8], trails: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(mask.len());
    for (m, t) in mask.chunks_exact(4).zip(trails.chunks_exact(4)) {
        let ta = u32::from(t[3]);
        let ma = u32::from(m[3]);
        let out_a = ta + ma * (255 - ta) / 255;
        for c in 0..3 {
            let value = if out_a == 0 {
                0
            } else {
                (u32::from(t[c]) * ta + u32::from(m[c]) * ma * (255 - ta) / 255) / out_a
            };
            out.push(value.min(255) as u8);
        }
        out.push(out_a.min(255) as u8);
    }
    out
}

fn save_png(
    path: &Path,
    mask: &RasterCanvas,
    trails: &RasterCanvas,
) -> Result<(), Box<dyn std::error::Error>> {
    let pixels = composite(mask.pixels(), trails.pixels());
    let image = image::RgbaImage::from_raw(mask.width(), mask.height(), pixels)
        .ok_or("canvas buffer does not match its dimensions")?;
    image.save(path)?;
    Ok(())
}
