use clap::Parser;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{
        disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use valedrive_world::{
    export::{self, ExportError},
    ChunkKey, DecorationBatch, DecorationCatalog, MeshData, RoadChunk, Scene, TerrainChunk,
    Vertex3, World, WorldConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to world.toml configuration file
    #[arg(short, long, default_value = "./world.toml")]
    config: String,

    /// Override log level (trace|debug|info|warn|error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Override the world seed from the configuration file
    #[arg(short, long)]
    seed: Option<u32>,

    /// Drive a fixed number of ticks without the terminal UI, then exit
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Write all resident terrain and road meshes to an OBJ file on exit
    #[arg(short, long)]
    export: Option<String>,
}

const ACCELERATION: f32 = 15.0;
const DECELERATION: f32 = 8.0;
const BRAKING: f32 = 25.0;
const MAX_SPEED: f32 = 60.0;
const TURN_RATE: f32 = 2.5;
const RIDE_HEIGHT: f32 = 1.5;
const ROAD_PULL: f32 = 0.05;
const STEER_RESPONSE: f32 = 0.1;
const TILT_RESPONSE: f32 = 0.1;
const TILT_SAMPLE_DISTANCE: f32 = 2.0;
const MAX_FRAME_DT: f32 = 0.1;

#[derive(Debug, Clone, Copy, Default)]
struct DriveInput {
    accelerate: bool,
    brake: bool,
    steer_left: bool,
    steer_right: bool,
}

struct Vehicle {
    position: Vertex3,
    yaw: f32,
    pitch: f32,
    roll: f32,
    velocity: f32,
    steering: f32,
}

impl Vehicle {
    fn at_road_start(world: &World) -> Self {
        let mut position = world.road_center(0.0);
        position.y += RIDE_HEIGHT;
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
            velocity: 0.0,
            steering: 0.0,
        }
    }

    fn update(&mut self, world: &World, input: DriveInput, dt: f32) {
        // Long frames (window drag, suspend) would otherwise launch the car.
        let dt = dt.min(MAX_FRAME_DT);

        if input.accelerate {
            self.velocity += ACCELERATION * dt;
        } else if input.brake {
            self.velocity -= BRAKING * dt;
        } else if self.velocity > 0.0 {
            self.velocity -= DECELERATION * dt;
        }
        self.velocity = self.velocity.clamp(0.0, MAX_SPEED);

        let target_steering = if input.steer_left {
            1.0
        } else if input.steer_right {
            -1.0
        } else {
            0.0
        };
        self.steering = lerp(self.steering, target_steering, STEER_RESPONSE);
        self.yaw += self.steering * TURN_RATE * dt;

        self.position.x += self.yaw.sin() * self.velocity * dt;
        self.position.z += self.yaw.cos() * self.velocity * dt;

        // The road owns the route; drift back toward its centerline.
        let center = world.road_center(self.position.z);
        self.position.x = lerp(self.position.x, center.x, ROAD_PULL);
        self.position.y = world.elevation(self.position.x, self.position.z) + RIDE_HEIGHT;

        let (sin, cos) = (self.yaw.sin(), self.yaw.cos());
        let ahead = world.elevation(
            self.position.x + sin * TILT_SAMPLE_DISTANCE,
            self.position.z + cos * TILT_SAMPLE_DISTANCE,
        );
        let behind = world.elevation(
            self.position.x - sin * TILT_SAMPLE_DISTANCE,
            self.position.z - cos * TILT_SAMPLE_DISTANCE,
        );
        let left = world.elevation(
            self.position.x + cos * TILT_SAMPLE_DISTANCE,
            self.position.z - sin * TILT_SAMPLE_DISTANCE,
        );
        let right = world.elevation(
            self.position.x - cos * TILT_SAMPLE_DISTANCE,
            self.position.z + sin * TILT_SAMPLE_DISTANCE,
        );

        let target_pitch = (ahead - behind).atan2(TILT_SAMPLE_DISTANCE * 2.0);
        self.pitch = lerp(self.pitch, target_pitch, TILT_RESPONSE);
        let target_roll = (right - left).atan2(TILT_SAMPLE_DISTANCE * 2.0);
        self.roll = lerp(self.roll, target_roll, TILT_RESPONSE);
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Counts what the streams hand over. Stands in for a real scene graph in
/// this terminal demo.
#[derive(Debug, Default)]
struct TallyScene {
    terrain_chunks: usize,
    terrain_triangles: usize,
    road_chunks: usize,
    road_triangles: usize,
    decoration_batches: usize,
    decorations: usize,
}

impl Scene<TerrainChunk> for TallyScene {
    fn register(&mut self, _key: ChunkKey, chunk: &TerrainChunk) {
        self.terrain_chunks += 1;
        self.terrain_triangles += chunk.mesh.triangle_count();
    }

    fn unregister(&mut self, _key: ChunkKey, chunk: &TerrainChunk) {
        self.terrain_chunks -= 1;
        self.terrain_triangles -= chunk.mesh.triangle_count();
    }
}

impl Scene<RoadChunk> for TallyScene {
    fn register(&mut self, _key: ChunkKey, chunk: &RoadChunk) {
        self.road_chunks += 1;
        self.road_triangles += chunk.mesh.triangle_count();
    }

    fn unregister(&mut self, _key: ChunkKey, chunk: &RoadChunk) {
        self.road_chunks -= 1;
        self.road_triangles -= chunk.mesh.triangle_count();
    }
}

impl Scene<DecorationBatch> for TallyScene {
    fn register(&mut self, _key: ChunkKey, batch: &DecorationBatch) {
        self.decoration_batches += 1;
        self.decorations += batch.placements.len();
    }

    fn unregister(&mut self, _key: ChunkKey, batch: &DecorationBatch) {
        self.decoration_batches -= 1;
        self.decorations -= batch.placements.len();
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = WorldConfig::load_or_default(&args.config);

    // Apply CLI overrides
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    // Initialize tracing
    let log_level = args.log_level.as_deref().unwrap_or(&config.logging.level);

    if config.logging.console_enabled {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
            )
            .init();
    }

    info!("Starting Valedrive world driver v0.1.0");
    info!("Configuration loaded from: {}", args.config);

    let catalog = match config.decoration.catalog_path.as_deref() {
        Some(path) => {
            info!("Loading decoration catalog from {}", path);
            DecorationCatalog::load(path)?
        }
        None => DecorationCatalog::standard(),
    };

    let mut world = World::with_catalog(config, catalog)?;
    let mut scene = TallyScene::default();
    let mut vehicle = Vehicle::at_road_start(&world);

    let report = world.advance(vehicle.position, &mut scene);
    info!("Initial stream: {} chunks resident", report.created());

    match args.ticks {
        Some(ticks) => run_headless(&mut world, &mut scene, &mut vehicle, ticks),
        None => run_interactive(&mut world, &mut scene, &mut vehicle)?,
    }

    if let Some(path) = &args.export {
        export_resident_meshes(&world, path)?;
        info!("Exported resident meshes to {}", path);
    }

    Ok(())
}

fn run_headless(world: &mut World, scene: &mut TallyScene, vehicle: &mut Vehicle, ticks: u64) {
    let input = DriveInput {
        accelerate: true,
        ..DriveInput::default()
    };
    let dt = 1.0 / 60.0;

    for tick in 0..ticks {
        vehicle.update(world, input, dt);
        let report = world.advance(vehicle.position, scene);

        if !report.is_quiet() {
            debug!(
                "tick {}: +{} chunks, -{} chunks",
                tick,
                report.created(),
                report.evicted()
            );
        }
        if tick % 600 == 599 {
            info!(
                "t={:.0}s z={:.0} speed={:.0} resident: {} terrain / {} road / {} decoration batches",
                (tick + 1) as f32 * dt,
                vehicle.position.z,
                vehicle.velocity,
                scene.terrain_chunks,
                scene.road_chunks,
                scene.decoration_batches,
            );
        }
    }

    info!(
        "drove to z={:.0} in {} ticks; scene holds {} triangles and {} decorations",
        vehicle.position.z,
        ticks,
        scene.terrain_triangles + scene.road_triangles,
        scene.decorations,
    );
}

fn run_interactive(
    world: &mut World,
    scene: &mut TallyScene,
    vehicle: &mut Vehicle,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, Hide)?;

    let result = drive_loop(world, scene, vehicle);

    execute!(stdout, Show, LeaveAlternateScreen)?;
    disable_raw_mode()?;

    result
}

fn drive_loop(world: &mut World, scene: &mut TallyScene, vehicle: &mut Vehicle) -> io::Result<()> {
    let mut last_frame = Instant::now();
    let mut last_change = (0usize, 0usize);

    loop {
        // The car cruises on its own; arrow keys nudge it for a frame.
        let mut input = DriveInput {
            accelerate: true,
            ..DriveInput::default()
        };

        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Left => input.steer_left = true,
                    KeyCode::Right => input.steer_right = true,
                    KeyCode::Down | KeyCode::Char(' ') => {
                        input.accelerate = false;
                        input.brake = true;
                    }
                    _ => {}
                }
            }
        }

        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        vehicle.update(world, input, dt);
        let report = world.advance(vehicle.position, scene);
        if !report.is_quiet() {
            last_change = (report.created(), report.evicted());
        }

        draw_hud(world, scene, vehicle, last_change)?;

        let elapsed = last_frame.elapsed();
        if elapsed < Duration::from_millis(33) {
            std::thread::sleep(Duration::from_millis(33) - elapsed);
        }
    }
}

fn draw_hud(
    world: &World,
    scene: &TallyScene,
    vehicle: &Vehicle,
    last_change: (usize, usize),
) -> io::Result<()> {
    let mut stdout = io::stdout();

    let center = world.road_center(vehicle.position.z);
    let offset = vehicle.position.x - center.x;
    let ground = world.sample_ground(vehicle.position.x, vehicle.position.z);

    execute!(
        stdout,
        Clear(ClearType::All),
        MoveTo(0, 0),
        SetForegroundColor(Color::Cyan),
        Print(format!("Valedrive  seed {}", world.config().seed)),
        ResetColor,
        MoveTo(0, 2),
        Print(format!(
            "pos      x {:8.1}   y {:8.1}   z {:8.1}",
            vehicle.position.x, vehicle.position.y, vehicle.position.z
        )),
        MoveTo(0, 3),
        Print(format!(
            "speed    {:5.1} u/s   heading {:6.1} deg   pitch {:5.1}   roll {:5.1}",
            vehicle.velocity,
            vehicle.yaw.to_degrees(),
            vehicle.pitch.to_degrees(),
            vehicle.roll.to_degrees()
        )),
        MoveTo(0, 4),
        Print(format!(
            "road     offset {:6.1}   elevation {:7.1}   slope {:4.1} deg",
            offset, ground.elevation, ground.slope_deg
        )),
        MoveTo(0, 6),
        Print(format!(
            "terrain      {:3} chunks   {:7} triangles",
            scene.terrain_chunks, scene.terrain_triangles
        )),
        MoveTo(0, 7),
        Print(format!(
            "road         {:3} chunks   {:7} triangles",
            scene.road_chunks, scene.road_triangles
        )),
        MoveTo(0, 8),
        Print(format!(
            "decorations  {:3} batches  {:7} sprites",
            scene.decoration_batches, scene.decorations
        )),
        MoveTo(0, 9),
        Print(format!(
            "last delta   +{} chunks, -{} chunks",
            last_change.0, last_change.1
        )),
        MoveTo(0, 11),
        SetForegroundColor(Color::DarkGrey),
        Print("Left/Right: steer   Down/Space: brake   Q: quit"),
        ResetColor
    )?;

    stdout.flush()?;
    Ok(())
}

fn export_resident_meshes(world: &World, path: &str) -> Result<(), ExportError> {
    let mut meshes: Vec<(String, &MeshData)> = world
        .terrain_chunks()
        .iter()
        .map(|(key, chunk)| (format!("terrain_{}_{}", key.x, key.z), &chunk.mesh))
        .chain(
            world
                .road_chunks()
                .iter()
                .map(|(key, chunk)| (format!("road_{}_{}", key.x, key.z), &chunk.mesh)),
        )
        .collect();
    meshes.sort_by(|a, b| a.0.cmp(&b.0));

    export::write_obj(path, &meshes)
}
