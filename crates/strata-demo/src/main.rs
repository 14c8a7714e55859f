//! Headless walkthrough: builds a small camp in an in-memory world, packs it
//! into a file, and unpacks it somewhere else.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use strata_config::{CliArgs, Config};
use strata_schematic::PackedSchematic;
use strata_voxel::{
    AttachmentId, Layer, MaterialCode, MaterialDef, MaterialId, MaterialRegistry, Position,
    VoxelWorld, WorldRead,
};
use strata_workflow::{
    ActorId, ActorVitals, AllowAll, HostProbe, Interaction, LogFeedback, SchematicTool,
    WorkflowError,
};
use tracing::{error, info};

struct HeadlessHost;

impl HostProbe for HeadlessHost {
    fn supports_dimensions(&self) -> bool {
        true
    }
}

struct DemoVitals {
    saturation: f32,
}

impl ActorVitals for DemoVitals {
    fn saturation(&self) -> f32 {
        self.saturation
    }

    fn set_saturation(&mut self, value: f32) {
        self.saturation = value;
    }

    fn reset_sprint_counter(&mut self) {}
}

fn material(world: &VoxelWorld, name: &str) -> Result<MaterialId, Box<dyn Error>> {
    let code = MaterialCode::parse(name)?;
    world
        .registry()
        .lookup(&code)
        .ok_or_else(|| format!("{code} is not registered").into())
}

fn build_world() -> Result<VoxelWorld, Box<dyn Error>> {
    let mut registry = MaterialRegistry::new();
    for name in ["stone", "planks-oak", "glass", "chest", "moss"] {
        registry.register(MaterialDef::solid(MaterialCode::parse(name)?))?;
    }
    registry.register(MaterialDef::fluid(MaterialCode::parse("springwater")?))?;
    registry.register(MaterialDef::soft(MaterialCode::parse("tallgrass")?))?;

    let mut world = VoxelWorld::new(registry);
    let stone = material(&world, "stone")?;
    for x in -20..=40 {
        for z in -20..=40 {
            world.put(Position::new(x, 0, z), Layer::Base, stone);
        }
    }
    Ok(world)
}

/// A 3×3 planked hut with a glass roof, a chest, a basin and some moss.
fn build_camp(world: &mut VoxelWorld, anchor: Position) -> Result<(), Box<dyn Error>> {
    let planks = material(world, "planks-oak")?;
    let glass = material(world, "glass")?;
    let chest = material(world, "chest")?;
    let moss = material(world, "moss")?;
    let water = material(world, "springwater")?;

    for x in -1..=1 {
        for z in -1..=1 {
            let edge = x != 0 || z != 0;
            for y in 1..=2 {
                if edge && !(x == 0 && z == -1) {
                    world.put(anchor.add_xyz(x, y, z), Layer::Base, planks);
                }
            }
            world.put(anchor.add_xyz(x, 3, z), Layer::Base, glass);
        }
    }
    world.put(anchor.add_xyz(0, 1, 0), Layer::Base, chest);
    world.put_aux(anchor.add_xyz(0, 1, 0), vec![moss, glass], vec![3, 1, 4]);
    world.put(anchor.add_xyz(2, 1, 2), Layer::Fluid, water);
    world.put_decor(anchor.add_xyz(-1, 2, -1), AttachmentId::new(4, 0), moss);
    Ok(())
}

fn demonstrate_tent_cycle(config: &Config, data_dir: &Path) -> Result<(), Box<dyn Error>> {
    let mut world = build_world()?;
    let camp = Position::new(0, 0, 0);
    build_camp(&mut world, camp)?;
    info!("Built camp: {} occupied cells", world.occupied_cells());

    let mut tool = SchematicTool::new(config.tool.clone(), &HeadlessHost);
    let actor = ActorId::new("demo");
    let mut feedback = LogFeedback;
    let mut vitals = DemoVitals { saturation: 1200.0 };

    let outcome = tool.pack(
        Interaction {
            world: &mut world,
            actor: &actor,
            permissions: &AllowAll,
            feedback: &mut feedback,
            vitals: &mut vitals,
            now: Instant::now(),
        },
        camp,
    )?;
    info!(
        "Packed {:?}: {} cells, {} palette entries, {} bytes",
        outcome.schematic.size,
        outcome.schematic.cells.len(),
        outcome.schematic.palette.len(),
        outcome.bytes.len()
    );

    std::fs::create_dir_all(data_dir)?;
    let path = data_dir.join("camp.stsc");
    std::fs::write(&path, &outcome.bytes)?;
    info!("Wrote {}", path.display());

    let stored = std::fs::read(&path)?;
    let target = Position::new(25, 0, 25);
    let report = tool.unpack(
        Interaction {
            world: &mut world,
            actor: &actor,
            permissions: &AllowAll,
            feedback: &mut feedback,
            vitals: &mut vitals,
            now: Instant::now(),
        },
        target,
        &stored,
    )?;
    info!(
        "Unpacked at {:?}: {} cells, {} decor, {} payloads; saturation now {}",
        report.origin, report.cells_written, report.decor_written, report.payloads_restored,
        vitals.saturation
    );

    let json = outcome.schematic.to_json()?;
    let reparsed = PackedSchematic::from_json(&json)?;
    info!(
        "JSON form: {} bytes, round trip {}",
        json.len(),
        if reparsed == outcome.schematic { "matches" } else { "differs" }
    );
    Ok(())
}

fn demonstrate_claimed_land(config: &Config) -> Result<(), Box<dyn Error>> {
    let mut world = build_world()?;
    let camp = Position::new(0, 0, 0);
    build_camp(&mut world, camp)?;

    // Everything west of x = 0 belongs to someone else.
    let claims = |_: &ActorId, p: Position| p.x >= 0;
    let mut tool = SchematicTool::new(config.tool.clone(), &HeadlessHost);
    let actor = ActorId::new("demo");
    let mut feedback = LogFeedback;
    let mut vitals = DemoVitals { saturation: 1200.0 };
    let now = Instant::now();

    match tool.pack(
        Interaction {
            world: &mut world,
            actor: &actor,
            permissions: &claims,
            feedback: &mut feedback,
            vitals: &mut vitals,
            now,
        },
        camp,
    ) {
        Ok(_) => info!("Unexpected success packing claimed land"),
        Err(WorkflowError::Rejected(report)) => {
            info!(
                "Correctly refused: {} cells denied",
                report.denied().count()
            );
        }
        Err(e) => return Err(e.into()),
    }

    let expiry = now + std::time::Duration::from_millis(config.tool.highlight_duration_ms);
    tool.poll_highlight(&mut feedback, expiry);
    Ok(())
}

fn main() {
    let args = CliArgs::parse();

    let config_dir = args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("strata")
    });

    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    strata_log::init_logging(
        Some(&config_dir.join("logs")),
        cfg!(debug_assertions),
        Some(&config),
    );

    if let Err(e) = demonstrate_tent_cycle(&config, &config_dir.join("schematics")) {
        error!("Tent cycle failed: {e}");
    }
    if let Err(e) = demonstrate_claimed_land(&config) {
        error!("Claimed land demonstration failed: {e}");
    }

    info!("Schematic demonstration completed");
}
