//! Octree Simulation Demo
//!
//! Headless fleet simulation driving a dynamic octree:
//! - Ships drift through space, occasionally leaving the root region
//!   (triggering growth and a full rebuild)
//! - Every step each ship is moved and a proximity query is issued
//! - A camera frustum is culled against the tree once per report
//!
//! Usage: `tree_demo [config.toml|config.ron]`

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use spatial_tree::foundation::math::Point3;
use spatial_tree::prelude::*;

// Fleet settings
const NUM_SMALL_SHIPS: usize = 200;
const NUM_LARGE_SHIPS: usize = 20;
const SMALL_SHIP_SPEED: f32 = 6.0;
const LARGE_SHIP_SPEED: f32 = 3.0;
const SPAWN_EXTENT: f32 = 50.0;

// Simulation settings
const STEPS: usize = 600;
const DELTA_TIME: f32 = 1.0 / 60.0;
const REPORT_INTERVAL: usize = 100;
const SENSOR_RANGE: f32 = 8.0;

/// Class of ship, stored as the entity tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShipClass {
    Small = 0,
    Large = 1,
}

/// Per-ship payload stored in the tree
#[derive(Debug, Clone)]
struct Ship {
    velocity: Vec3,
    contacts: usize,
}

struct FleetSimulation {
    tree: Octree<Ship>,
    names: Vec<String>,
    rng: StdRng,
    queries: usize,
    candidates: usize,
}

impl FleetSimulation {
    fn new(config: TreeConfig) -> Result<Self, TreeError> {
        let mut simulation = Self {
            tree: Octree::new(config)?,
            names: Vec::new(),
            rng: StdRng::seed_from_u64(0x5eed),
            queries: 0,
            candidates: 0,
        };

        simulation.spawn(ShipClass::Small, NUM_SMALL_SHIPS, SMALL_SHIP_SPEED)?;
        simulation.spawn(ShipClass::Large, NUM_LARGE_SHIPS, LARGE_SHIP_SPEED)?;

        log::info!(
            "Spawned {} ships, root {:?}..{:?}, max depth {}",
            simulation.tree.len(),
            simulation.tree.root_region().min,
            simulation.tree.root_region().max,
            simulation.tree.node_depth_max()
        );
        Ok(simulation)
    }

    fn spawn(&mut self, class: ShipClass, count: usize, speed: f32) -> Result<(), TreeError> {
        for i in 0..count {
            let name = format!("{:?}-{}", class, i).to_lowercase();
            let position = self.random_vector(SPAWN_EXTENT);
            let velocity = self.random_vector(1.0).try_normalize(1.0e-6).unwrap_or_else(Vec3::x) * speed;

            self.tree.add_entity(
                name.clone(),
                position,
                class as i32,
                Ship { velocity, contacts: 0 },
            )?;
            self.names.push(name);
        }
        Ok(())
    }

    fn random_vector(&mut self, extent: f32) -> Vec3 {
        Vec3::new(
            self.rng.gen_range(-extent..extent),
            self.rng.gen_range(-extent..extent),
            self.rng.gen_range(-extent..extent),
        )
    }

    fn update(&mut self, delta_time: f32) -> Result<(), TreeError> {
        for name in &self.names {
            let (position, velocity) = match self.tree.entity(name) {
                Some(ship) => (ship.position(), ship.payload().velocity),
                None => continue,
            };
            self.tree.set_entity_position(name, position + velocity * delta_time)?;
        }

        // Broad-phase: count neighbours within sensor range
        for name in &self.names {
            let position = self.tree.entity_position(name)?;
            let contacts = self
                .tree
                .entities_within_range(position, SENSOR_RANGE)
                .into_iter()
                .filter(|other| other.name() != name.as_str())
                .count();

            self.queries += 1;
            self.candidates += contacts;
            if let Some(ship) = self.tree.entity_mut(name) {
                ship.payload_mut().contacts = contacts;
            }
        }

        Ok(())
    }

    fn report(&self, step: usize) {
        let view = Mat4::look_at_rh(
            &Point3::new(0.0, 40.0, -120.0),
            &Point3::origin(),
            &Vec3::y(),
        );
        let projection = Mat4::new_perspective(16.0 / 9.0, std::f32::consts::FRAC_PI_3, 0.1, 500.0);
        // Remap nalgebra's [-1, 1] clip depth to the [0, 1] range the frustum expects
        let depth_remap = Mat4::new(
            1.0, 0.0, 0.0, 0.0,
            0.0, 1.0, 0.0, 0.0,
            0.0, 0.0, 0.5, 0.5,
            0.0, 0.0, 0.0, 1.0,
        );
        let frustum = Frustum::from_matrix(&(depth_remap * projection * view));
        let visible = self.tree.entities_within_frustum(&frustum).len();

        let busiest = self
            .tree
            .iter()
            .max_by_key(|ship| ship.payload().contacts)
            .map(|ship| (ship.name().to_string(), ship.payload().contacts));

        log::info!(
            "Step {}: {} nodes, {} leaves, depth {}/{}, {} visible, busiest {:?}",
            step,
            self.tree.node_count(),
            self.tree.leaves().len(),
            self.tree.node_depth_current(),
            self.tree.node_depth_max(),
            visible,
            busiest
        );
    }
}

fn load_config() -> Result<TreeConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => TreeConfig::load_from_file(path),
        None => Ok(TreeConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    spatial_tree::foundation::logging::init();

    println!("=== Octree Simulation Demo ===");

    let config = load_config()?;
    log::info!("Using {:?}", config);

    let mut simulation = FleetSimulation::new(config)?;
    let start_time = Instant::now();

    for step in 1..=STEPS {
        simulation.update(DELTA_TIME)?;
        if step % REPORT_INTERVAL == 0 {
            simulation.report(step);
        }
    }

    let elapsed = start_time.elapsed();
    println!(
        "Simulated {} steps in {:.2?} ({} range queries, {:.1} candidates per query)",
        STEPS,
        elapsed,
        simulation.queries,
        simulation.candidates as f64 / simulation.queries.max(1) as f64
    );

    Ok(())
}
