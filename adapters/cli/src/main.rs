#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the invaders engine headlessly.
//!
//! A scripted autopilot stands in for the keyboard, the pacing system
//! turns wall time into tick commands, and frames print as ASCII grids.
//! Useful for smoke-testing the engine and for watching a full session
//! unfold without a graphical frontend.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use invaders_core::{Command, Event, Lateral};
use invaders_system_pacing::Pacing;
use invaders_world::{self as world, query, Session};

mod tuning;

const STEP: Duration = Duration::from_millis(10);

#[derive(Debug, Parser)]
#[command(name = "invaders", about = "Headless driver for the invaders engine")]
struct Args {
    /// Simulated play time in seconds.
    #[arg(long, default_value_t = 30)]
    seconds: u64,

    /// Canvas side length in cells.
    #[arg(long)]
    scale: Option<u32>,

    /// Seed for enemy-fire selection and the autopilot.
    #[arg(long)]
    seed: Option<u64>,

    /// TOML tuning file adjusting the session and its cadences.
    #[arg(long)]
    tuning: Option<std::path::PathBuf>,

    /// Print an ASCII frame every this many simulated milliseconds.
    #[arg(long, default_value_t = 1000)]
    frame_every_ms: u64,

    /// Suppress frames and print only the final summary.
    #[arg(long)]
    quiet: bool,
}

/// Scripted stand-in for a player: jitters sideways and pulls the trigger
/// on every step, letting the cooldown meter the actual fire rate.
#[derive(Debug)]
struct Autopilot {
    rng: ChaCha8Rng,
}

impl Autopilot {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn drive(&mut self, pacing: &mut Pacing) {
        match self.rng.gen_range(0..4u8) {
            0 => pacing.steer(Lateral::Left),
            1 => pacing.steer(Lateral::Right),
            _ => {}
        }
        pacing.request_fire();
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let tuning = match args.tuning.as_deref() {
        Some(path) => tuning::load(path)?,
        None => tuning::Tuning::default(),
    };
    let config = tuning.session.session_config(args.scale, args.seed);
    let mut session = Session::new(config);
    let mut pacing = Pacing::new(tuning.cadence.pacing_config());
    let mut autopilot = Autopilot::new(args.seed.unwrap_or(config.rng_seed()));

    log::info!(
        "starting session: scale {} seed {} for {}s",
        config.scale(),
        config.rng_seed(),
        args.seconds
    );

    let frame_every_ms = args.frame_every_ms.max(STEP.as_millis() as u64);
    let mut events: Vec<Event> = Vec::new();
    let mut commands: Vec<Command> = Vec::new();
    let mut elapsed_ms: u64 = 0;

    for _ in 0..args.seconds * 100 {
        autopilot.drive(&mut pacing);

        commands.clear();
        pacing.handle(&events, STEP, &mut commands);

        events.clear();
        for command in &commands {
            world::apply(&mut session, *command, &mut events);
        }
        report(&events);
        for effect in session.drain_effects() {
            log::debug!("effect {:?} at ({}, {})", effect.kind, effect.at.column(), effect.at.row());
        }

        elapsed_ms += STEP.as_millis() as u64;
        if !args.quiet && elapsed_ms % frame_every_ms == 0 {
            print_frame(&session, elapsed_ms);
        }
        if query::is_over(&session) {
            break;
        }
    }

    println!(
        "score {}  lives {}  game over: {}",
        query::score(&session),
        query::lives(&session),
        query::is_over(&session)
    );
    Ok(())
}

fn report(events: &[Event]) {
    for event in events {
        match event {
            Event::ScoreChanged { score } => log::debug!("score {score}"),
            Event::LivesChanged { lives } => log::info!("tank hit, {lives} lives left"),
            Event::GameOver => log::info!("game over"),
            Event::EnemyDestroyed { id, .. } => log::debug!("destroyed {id}"),
            Event::BonusShipDestroyed { id, .. } => log::info!("bonus ship {id} destroyed"),
            Event::BaseDamaged { id, at } => {
                log::debug!("{id} chipped at ({}, {})", at.column(), at.row());
            }
            Event::TankDestroyed { .. } => log::debug!("tank destroyed"),
            Event::FormationReversed { next } => log::debug!("formation turns {next:?}"),
            Event::SessionReset => log::info!("session reset"),
        }
    }
}

fn print_frame(session: &Session, elapsed_ms: u64) {
    let canvas = query::canvas(session);
    let (columns, _) = canvas.dimensions();

    let mut frame = String::with_capacity((columns as usize + 1) * columns as usize);
    for row in canvas.iter_rows() {
        for &code in row {
            frame.push(glyph(code));
        }
        frame.push('\n');
    }

    println!(
        "t={}ms score={} lives={}",
        elapsed_ms,
        query::score(session),
        query::lives(session)
    );
    print!("{frame}");
}

const fn glyph(code: u8) -> char {
    match code {
        0 => ' ',
        1 => '^',
        2 => '@',
        3 => '|',
        4 => '#',
        5 => '!',
        6 => '=',
        _ => '?',
    }
}
