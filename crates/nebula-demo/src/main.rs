//! Headless demo: a camera flies over a grid of terrain tiles while a LOD
//! scheduler streams their requirements to a simulated loader.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p nebula-demo -- --frames 240 --log-level debug`.

mod distance_policy;

use std::rc::Rc;

use clap::Parser;
use glam::{Vec3, Vec4};
use nebula_config::{CliArgs, Config};
use nebula_lod::{LodScheduler, MasterLodScheduler, ViewParams, properties};
use nebula_scene::{NodeId, Renderer, SceneError, SceneGraph, SceneManager, Surface};
use tracing::info;

use crate::distance_policy::{BOUNDING_CENTER, DistancePolicy};

const DEFAULT_FRAMES: u32 = 120;
const FRAME_DELTA: f32 = 1.0 / 60.0;
const GRID: i32 = 4;
const TILE_SIZE: f32 = 100.0;
const CAMERA_SPEED: f32 = 240.0;

struct DemoScene {
    graph: Rc<SceneGraph>,
    manager: Rc<SceneManager>,
    master: Rc<MasterLodScheduler>,
    camera: NodeId,
    tiles: Vec<String>,
}

fn build_scene(config: &Config) -> Result<(DemoScene, Rc<LodScheduler>), SceneError> {
    let graph = SceneGraph::new();
    let root = graph.create_node("root");
    let manager = SceneManager::new();
    let master = MasterLodScheduler::new();
    graph.add_component(root, manager.clone())?;
    graph.add_component(root, master.clone())?;
    if let Some(root_data) = graph.data(root) {
        root_data.set(properties::VIEWPORT, Vec4::new(0.0, 0.0, 1280.0, 720.0));
    }

    let camera = graph.create_node("camera");
    graph.add_child(root, camera)?;
    graph.add_component(camera, Renderer::new())?;

    let terrain = graph.create_node("terrain");
    graph.add_child(root, terrain)?;
    let mut tiles = Vec::new();
    for x in 0..GRID {
        for z in 0..GRID {
            let key = format!("terrain/tile_{x}_{z}.geometry");
            let center = Vec3::new(x as f32 * TILE_SIZE, 0.0, -(z as f32) * TILE_SIZE);
            master.register_resource(&key).set(BOUNDING_CENTER, center);

            let tile = graph.create_node(format!("tile_{x}_{z}"));
            graph.add_child(terrain, tile)?;
            graph.add_component(tile, Surface::new(format!("tile_{x}_{z}"), key.clone()))?;
            tiles.push(key);
        }
    }

    let policy = DistancePolicy::new(vec![400.0, 200.0, 80.0]);
    let scheduler = LodScheduler::from_config(policy, &config.scheduler);
    graph.add_component(root, scheduler.clone())?;

    let scene = DemoScene {
        graph,
        manager,
        master,
        camera,
        tiles,
    };
    Ok((scene, scheduler))
}

/// A loader that streams one LOD per frame towards each requirement.
fn simulate_loader(scene: &DemoScene) {
    for key in &scene.tiles {
        let Some(data) = scene.master.resource_data(key) else {
            continue;
        };
        let required = data.get::<i32>(properties::REQUIRED_LOD).unwrap_or_default();
        let available = data.get::<i32>(properties::MAX_AVAILABLE_LOD).unwrap_or_default();
        if available < required {
            data.set(properties::MAX_AVAILABLE_LOD, available + 1);
        }
    }
}

fn run(scene: &DemoScene, scheduler: &LodScheduler, frames: u32) {
    let Some(camera_data) = scene.graph.data(scene.camera) else {
        return;
    };

    for frame in 0..frames {
        let travelled = frame as f32 * FRAME_DELTA * CAMERA_SPEED;
        let eye = Vec3::new(150.0, 60.0, 200.0 - travelled);
        let view = ViewParams::perspective(eye, eye + Vec3::new(0.0, -0.3, -1.0), 1.0, 16.0 / 9.0, 0.1, 2000.0);
        view.publish(&camera_data);

        scene.manager.next_frame(FRAME_DELTA);
        simulate_loader(scene);

        if frame % 30 == 0 {
            info!(
                frame,
                eye = ?eye,
                resources = scheduler.resource_count(),
                pending = scheduler.pending_additions(),
                "scheduler state"
            );
        }
    }
}

fn main() {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = match args.config.clone() {
        Some(dir) => dir,
        None => Config::default_dir().unwrap_or_else(|e| {
            eprintln!("{e}, using ./nebula-lod");
            std::path::PathBuf::from("nebula-lod")
        }),
    };

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    nebula_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    let (scene, scheduler) = match build_scene(&config) {
        Ok(built) => built,
        Err(e) => {
            tracing::error!(error = %e, "failed to build demo scene");
            std::process::exit(1);
        }
    };
    info!(
        tiles = scene.tiles.len(),
        enabled = scheduler.enabled(),
        layout_mask = ?scheduler.layout_mask(),
        "demo scene ready"
    );

    run(&scene, &scheduler, args.frames.unwrap_or(DEFAULT_FRAMES));

    // Pick up anything a disabled scheduler skipped.
    scheduler.force_update();
    for key in &scene.tiles {
        if let Some(data) = scene.master.resource_data(key) {
            info!(
                tile = key.as_str(),
                required_lod = data.get::<i32>(properties::REQUIRED_LOD).unwrap_or_default(),
                max_available_lod = data.get::<i32>(properties::MAX_AVAILABLE_LOD).unwrap_or_default(),
                priority = data.get::<f32>(properties::PRIORITY).unwrap_or_default(),
                "final requirement"
            );
        }
    }
}
