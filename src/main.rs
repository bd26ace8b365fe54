mod simulation;

#[cfg(feature = "ui")]
mod ui;

use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::PathBuf;

use simulation::{RawControls, SessionConfig, SimWorld, VehicleConfiguration};

#[derive(Parser)]
#[command(name = "drivetrain_sim")]
#[command(about = "Vehicle drivetrain simulation with optional UI")]
struct Cli {
    /// Run with the Bevy game engine UI
    #[arg(long)]
    ui: bool,

    /// Number of simulation ticks to run in headless mode
    #[arg(long, default_value = "1500")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.02")]
    delta: f32,

    /// YAML vehicle configuration; the prototype car when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for reproducible shift points and engine noise
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let world = build_world(&cli)?;

    if cli.ui {
        #[cfg(feature = "ui")]
        {
            run_with_ui(world);
        }
        #[cfg(not(feature = "ui"))]
        {
            drop(world);
            anyhow::bail!("UI feature is not enabled. Rebuild with --features ui");
        }
    } else {
        run_headless(world, cli.ticks, cli.delta);
    }
    Ok(())
}

fn build_world(cli: &Cli) -> Result<SimWorld> {
    let session = SessionConfig::default();
    match &cli.config {
        Some(path) => SimWorld::from_config_file(path, session, cli.seed),
        None => match cli.seed {
            Some(seed) => SimWorld::new_with_seed(VehicleConfiguration::default(), session, seed),
            None => SimWorld::new(VehicleConfiguration::default(), session),
        },
    }
}

/// Scripted driver for headless runs: launch, hold, lift, brake, reverse
fn scripted_controls(time: f32) -> RawControls {
    let (throttle, steer, hand_brake) = match time {
        t if t < 12.0 => (1.0, 0.0, false),
        t if t < 16.0 => (0.6, 0.3, false),
        t if t < 19.0 => (0.0, 0.0, false),
        t if t < 23.0 => (-1.0, 0.0, false),
        t if t < 26.0 => (-0.5, -0.2, false),
        _ => (0.0, 0.0, true),
    };
    RawControls {
        throttle,
        steer,
        clutch_pedal: false,
        hand_brake,
    }
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(mut world: SimWorld, ticks: u32, delta: f32) {
    info!("Running drivetrain simulation in headless mode...");
    info!("Ticks: {}, Delta: {}s", ticks, delta);

    // Calculate how many ticks equal 1 second of simulation time
    let ticks_per_second = (1.0 / delta).ceil().max(1.0) as u32;
    let checkpoint_spacing = 4.0;
    let start_hold = world.session_config().countdown + world.session_config().go_duration;
    let mut next_checkpoint_at = start_hold + checkpoint_spacing;

    info!("Initial state:");
    world.print_summary();

    let mut tick = 0;
    while tick < ticks {
        let ticks_to_run = ticks_per_second.min(ticks - tick);

        for _ in 0..ticks_to_run {
            tick += 1;
            let controls = scripted_controls(world.time);
            world.tick(&controls, delta);

            // Stand-in for the track's trigger volumes
            if world.session.gameplay_active && world.time >= next_checkpoint_at {
                let index = world.checkpoints.next_index();
                world.reach_checkpoint(index);
                if world.checkpoints.passed % 3 == 0 {
                    world.collect_boost();
                }
                next_checkpoint_at += checkpoint_spacing;
            }
        }

        info!(
            "--- After tick {} ({:.1}s simulated time) ---",
            tick,
            tick as f32 * delta
        );
        world.print_summary();
    }

    info!("=== SIMULATION COMPLETE ===");
    world.print_statistics();
}

#[cfg(feature = "ui")]
fn run_with_ui(world: SimWorld) {
    use bevy::log::LogPlugin;
    use bevy::prelude::*;

    info!("Starting Drivetrain Sim UI...");
    info!("Controls:");
    info!("  W/S or Up/Down     - Throttle / brake / reverse");
    info!("  A/D or Left/Right  - Steer");
    info!("  Left Shift         - Clutch");
    info!("  Space              - Handbrake");
    info!("  C / B              - Trigger next checkpoint / boost");
    info!("  ESC                - Exit");

    App::new()
        .add_plugins(
            DefaultPlugins
                .build()
                .disable::<LogPlugin>()
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Drivetrain Sim - Bevy Game".into(),
                        resolution: (1280, 720).into(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .insert_resource(Time::<Fixed>::from_hz(50.0))
        .insert_resource(ui::SimWorldResource(world))
        .add_plugins(ui::DrivetrainUIPlugin)
        .run();
}
