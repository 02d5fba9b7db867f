use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use flipside::engine::events::PhysicsEvent;
use flipside::engine::input::{InputScript, MovementInput};
use flipside::scene::level::Level;
use flipside::scene::test_scene::{load_test_scene, TEST_SCENE_BODY_SIZE};
use flipside::{ObstacleWorld, PhysicsConfig, Simulation, SpikeTest};

#[derive(Parser)]
#[command(name = "flipside", about = "Headless gravity-flip physics runner")]
struct Args {
    /// Physics tuning file (TOML). Defaults apply to anything it omits.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Level file (TOML). Runs the built-in test scene when absent.
    #[arg(long)]
    level: Option<PathBuf>,

    /// Simulated seconds to run.
    #[arg(long, default_value_t = 8.0)]
    seconds: f32,

    /// Render frames per simulated second; physics ticks stay fixed.
    #[arg(long, default_value_t = 144.0)]
    render_hz: f32,

    /// Use the exact separating-axis test for spikes.
    #[arg(long)]
    exact_spikes: bool,

    /// Print the interpolated render position every N frames (0 = never).
    #[arg(long, default_value_t = 0)]
    trace_every: u64,
}

/// Scripted run through the test scene: run right, hop the pit, ride the
/// platform, flip under the low ceiling and back.
fn demo_script(hz: f32) -> (InputScript, Vec<u64>) {
    let frame = |secs: f32| (secs * hz) as u64;
    let script = InputScript::new()
        .hold(frame(0.5), frame(7.5), MovementInput::MOVE_RIGHT)
        .press(frame(1.05), MovementInput::JUMP)
        .press(frame(2.4), MovementInput::JUMP)
        .press(frame(3.1), MovementInput::JUMP)
        // Pressed mid-air: buffered until the landing.
        .press(frame(5.9), MovementInput::JUMP);
    let flips = vec![frame(4.2), frame(5.4)];
    (script, flips)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PhysicsConfig::from_file(path)?,
        None => PhysicsConfig::default(),
    };
    if args.exact_spikes {
        config.spike_test = SpikeTest::Separating;
    }

    let mut world = ObstacleWorld::new();
    let (spawn, body_size) = match &args.level {
        Some(path) => {
            let level = Level::from_file(path)?;
            level.populate(&mut world);
            (level.spawn_point(), level.body_size())
        }
        None => (load_test_scene(&mut world), TEST_SCENE_BODY_SIZE),
    };

    let mut sim = Simulation::new(config, world, spawn, body_size);
    let render_hz = if args.render_hz.is_finite() && args.render_hz > 0.0 {
        args.render_hz
    } else {
        log::warn!("render rate {} is unusable, falling back to 60 Hz", args.render_hz);
        60.0
    };
    let frame_dt = 1.0 / render_hz;
    let frames = (args.seconds.max(0.0) * render_hz) as u64;
    let (script, flips) = demo_script(render_hz);

    let mut hazard_hits = 0u32;
    for frame in 0..frames {
        if flips.contains(&frame) {
            sim.invert_gravity();
        }

        let alpha = sim.advance(frame_dt, script.at(frame));

        let mut respawn = false;
        for event in sim.drain_events() {
            match event {
                PhysicsEvent::HazardContact { id } => {
                    log::info!("frame {frame}: hazard {:#x} touched, respawning", id.to_bits());
                    respawn = true;
                }
                other => log::info!("frame {frame}: {other:?}"),
            }
        }
        if respawn {
            hazard_hits += 1;
            sim.respawn();
        }

        if args.trace_every > 0 && frame % args.trace_every == 0 {
            let p = sim.render_position(alpha);
            log::info!("frame {frame}: render position ({:.1}, {:.1})", p.x, p.y);
        }
    }

    let body = sim.body();
    println!(
        "{} ticks in {:.2}s: position ({:.1}, {:.1}), velocity ({:.1}, {:.1}), hazards {}",
        sim.ticks(),
        args.seconds,
        body.position.x,
        body.position.y,
        body.velocity.x,
        body.velocity.y,
        hazard_hits,
    );
    Ok(())
}
