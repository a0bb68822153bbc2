//! Headless demo: a player, some drifting particles, and a fixed-timestep loop.
//!
//! Run with `cargo run -p ember-engine --example headless_demo [config.json]`.
//! Set `RUST_LOG=debug` to see registration, deletion, and input logs.

use std::path::PathBuf;

use anyhow::Context;
use ember_engine::prelude::*;
use tracing::info;

#[derive(Debug, Clone, PartialEq)]
struct Position {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, PartialEq)]
struct Velocity {
    dx: f64,
    dy: f64,
}

#[derive(Debug)]
struct Lifetime(u32);

#[derive(Debug)]
struct Player;

fn movement() -> impl System {
    FnSystem::new("movement", component_set![Position, Velocity], |entities, world| {
        let dt = world.timestep_ms() / 1000.0;
        for &e in entities {
            let vel = world.get_components(e)?.fetch::<Velocity>()?.clone();
            let pos = world.get_component_mut::<Position>(e)?;
            pos.x += vel.dx * dt;
            pos.y += vel.dy * dt;
        }
        Ok(())
    })
}

fn lifetime() -> impl System {
    FnSystem::new("lifetime", component_set![Lifetime], |entities, world| {
        for &e in entities {
            let life = world.get_component_mut::<Lifetime>(e)?;
            life.0 = life.0.saturating_sub(1);
            if life.0 == 0 {
                world.delete_entity(e);
            }
        }
        Ok(())
    })
}

fn steering(input: InputState) -> impl System {
    FnSystem::new("steering", component_set![Player, Velocity], move |entities, world| {
        let held = input.latched();
        let axis = |neg: &str, pos: &str| {
            let n = held.iter().any(|k| k == neg);
            let p = held.iter().any(|k| k == pos);
            f64::from(u8::from(p)) - f64::from(u8::from(n))
        };
        let dx = axis("ArrowLeft", "ArrowRight") * 60.0;
        let dy = axis("ArrowUp", "ArrowDown") * 60.0;
        for &e in entities {
            *world.get_component_mut::<Velocity>(e)? = Velocity { dx, dy };
        }
        Ok(())
    })
}

fn load_config() -> anyhow::Result<TickConfig> {
    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        return Ok(TickConfig {
            headless: true,
            ..Default::default()
        });
    };
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading {}", path.display()))?;
    TickConfig::from_json(&text)
        .with_context(|| format!("parsing {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    info!(?config, "starting demo");

    let input = InputState::new();
    let mut ecs = Ecs::new();
    ecs.add_system(PlayerInputSystem::new(input.clone()));
    ecs.add_system(steering(input.clone()));
    ecs.add_system(movement());
    ecs.add_system(lifetime());

    let player = ecs.create_entity();
    ecs.add_components(
        player,
        ComponentBundle::new()
            .with(Player)
            .with(Position { x: 0.0, y: 0.0 })
            .with(Velocity { dx: 0.0, dy: 0.0 }),
    )?;

    for i in 0..32u32 {
        let particle = ecs.create_entity();
        let f = f64::from(i);
        ecs.add_components(
            particle,
            ComponentBundle::new()
                .with(Position { x: f, y: 0.0 })
                .with(Velocity {
                    dx: f.sin() * 20.0,
                    dy: f.cos() * 20.0,
                })
                .with(Lifetime(15 + i * 3)),
        )?;
    }

    let mut game = GameLoop::new(ecs, config);
    let mut view = TraceView::new();

    // Synthetic frame times with some jitter; a scripted key sequence stands
    // in for a real keyboard.
    let frames = [16.0, 17.0, 33.0, 16.0, 8.0, 50.0, 16.0, 16.0];
    for frame in 0..240usize {
        match frame {
            20 => input.key_down("ArrowRight"),
            80 => input.key_down("ArrowDown"),
            120 => input.key_up("ArrowRight"),
            180 => input.clear(),
            _ => {}
        }
        game.frame(frames[frame % frames.len()], &mut view)?;
    }

    let world = game.ecs().world();
    let pos = world.get_components(player)?.fetch::<Position>()?.clone();
    info!(
        ticks = game.tick_count(),
        sim_time_ms = game.sim_time_ms(),
        frames_drawn = view.frames_drawn(),
        entities = world.entity_count(),
        player_x = pos.x,
        player_y = pos.y,
        "demo finished"
    );
    Ok(())
}
