#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic pacing system that converts elapsed time into tick
//! commands.
//!
//! The session core is cadence-agnostic; this system owns the cadences.
//! Each tick source accrues simulated time in its own accumulator and
//! drains whole intervals into commands. Player intents are queued through
//! [`Pacing::steer`] and [`Pacing::request_fire`]; firing is gated by a
//! cooldown so the trigger can be held down safely. After observing
//! [`Event::GameOver`] the system idles until [`Event::SessionReset`].

use std::time::Duration;

use invaders_core::{Command, Event, Lateral};

const PARTICLE_INTERVAL: Duration = Duration::from_millis(10);
const FORMATION_INTERVAL: Duration = Duration::from_millis(100);
const ENEMY_FIRE_INTERVAL: Duration = Duration::from_secs(4);
const BONUS_INTERVAL: Duration = Duration::from_millis(250);
const FIRE_COOLDOWN: Duration = Duration::from_millis(500);

/// Configuration parameters required to construct the pacing system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    particle_interval: Duration,
    formation_interval: Duration,
    enemy_fire_interval: Duration,
    bonus_interval: Duration,
    fire_cooldown: Duration,
}

impl Config {
    /// Creates a configuration with explicit cadences. A zero interval
    /// disables its tick source.
    #[must_use]
    pub const fn new(
        particle_interval: Duration,
        formation_interval: Duration,
        enemy_fire_interval: Duration,
        bonus_interval: Duration,
        fire_cooldown: Duration,
    ) -> Self {
        Self {
            particle_interval,
            formation_interval,
            enemy_fire_interval,
            bonus_interval,
            fire_cooldown,
        }
    }

    /// Cadence of bullet movement and collision resolution.
    #[must_use]
    pub const fn particle_interval(&self) -> Duration {
        self.particle_interval
    }

    /// Cadence of formation row advancement.
    #[must_use]
    pub const fn formation_interval(&self) -> Duration {
        self.formation_interval
    }

    /// Cadence of enemy fire.
    #[must_use]
    pub const fn enemy_fire_interval(&self) -> Duration {
        self.enemy_fire_interval
    }

    /// Cadence of bonus-ship movement and spawning.
    #[must_use]
    pub const fn bonus_interval(&self) -> Duration {
        self.bonus_interval
    }

    /// Minimum delay between player shots.
    #[must_use]
    pub const fn fire_cooldown(&self) -> Duration {
        self.fire_cooldown
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            PARTICLE_INTERVAL,
            FORMATION_INTERVAL,
            ENEMY_FIRE_INTERVAL,
            BONUS_INTERVAL,
            FIRE_COOLDOWN,
        )
    }
}

/// Pure system that deterministically emits tick and input commands.
#[derive(Debug)]
pub struct Pacing {
    config: Config,
    particle_accumulator: Duration,
    formation_accumulator: Duration,
    enemy_fire_accumulator: Duration,
    bonus_accumulator: Duration,
    cooldown_remaining: Duration,
    queued_steering: Vec<Lateral>,
    fire_requested: bool,
    halted: bool,
}

impl Pacing {
    /// Creates a new pacing system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            particle_accumulator: Duration::ZERO,
            formation_accumulator: Duration::ZERO,
            enemy_fire_accumulator: Duration::ZERO,
            bonus_accumulator: Duration::ZERO,
            cooldown_remaining: Duration::ZERO,
            queued_steering: Vec::new(),
            fire_requested: false,
            halted: false,
        }
    }

    /// Queues a one-cell steering intent for the next batch.
    pub fn steer(&mut self, direction: Lateral) {
        self.queued_steering.push(direction);
    }

    /// Requests a shot. The request is dropped silently while the cooldown
    /// is still running, matching fire-and-forget input semantics.
    pub fn request_fire(&mut self) {
        self.fire_requested = true;
    }

    /// Consumes session events and elapsed time to emit the next command
    /// batch, ordered so particle movement resolves before formation
    /// decisions within the same instant.
    pub fn handle(&mut self, events: &[Event], dt: Duration, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::GameOver => self.halt(),
                Event::SessionReset => self.resume(),
                _ => {}
            }
        }

        if self.halted {
            self.queued_steering.clear();
            self.fire_requested = false;
            return;
        }

        for direction in self.queued_steering.drain(..) {
            out.push(Command::MoveTank { direction });
        }

        self.cooldown_remaining = self.cooldown_remaining.saturating_sub(dt);
        if self.fire_requested {
            if self.cooldown_remaining.is_zero() {
                out.push(Command::FireTank);
                self.cooldown_remaining = self.config.fire_cooldown;
            }
            self.fire_requested = false;
        }

        self.particle_accumulator = self.particle_accumulator.saturating_add(dt);
        self.formation_accumulator = self.formation_accumulator.saturating_add(dt);
        self.enemy_fire_accumulator = self.enemy_fire_accumulator.saturating_add(dt);
        self.bonus_accumulator = self.bonus_accumulator.saturating_add(dt);

        for _ in 0..drain_intervals(&mut self.particle_accumulator, self.config.particle_interval)
        {
            out.push(Command::TickParticles);
        }
        for _ in 0..drain_intervals(&mut self.formation_accumulator, self.config.formation_interval)
        {
            out.push(Command::TickFormation);
        }
        for _ in
            0..drain_intervals(&mut self.enemy_fire_accumulator, self.config.enemy_fire_interval)
        {
            out.push(Command::TickEnemyFire);
        }
        for _ in 0..drain_intervals(&mut self.bonus_accumulator, self.config.bonus_interval) {
            out.push(Command::TickBonusShip);
        }
    }

    fn halt(&mut self) {
        self.halted = true;
    }

    fn resume(&mut self) {
        self.halted = false;
        self.particle_accumulator = Duration::ZERO;
        self.formation_accumulator = Duration::ZERO;
        self.enemy_fire_accumulator = Duration::ZERO;
        self.bonus_accumulator = Duration::ZERO;
        self.cooldown_remaining = Duration::ZERO;
        self.queued_steering.clear();
        self.fire_requested = false;
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn drain_intervals(accumulator: &mut Duration, interval: Duration) -> usize {
    if interval.is_zero() {
        return 0;
    }

    let mut count = 0;
    while *accumulator >= interval {
        *accumulator -= interval;
        count += 1;
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drains_whole_intervals_only() {
        let mut accumulator = Duration::from_millis(25);
        assert_eq!(drain_intervals(&mut accumulator, Duration::from_millis(10)), 2);
        assert_eq!(accumulator, Duration::from_millis(5));
    }

    #[test]
    fn zero_interval_disables_the_source() {
        let mut accumulator = Duration::from_secs(10);
        assert_eq!(drain_intervals(&mut accumulator, Duration::ZERO), 0);
    }

    #[test]
    fn fire_requests_respect_the_cooldown() {
        let mut pacing = Pacing::default();
        let mut out = Vec::new();

        pacing.request_fire();
        pacing.handle(&[], Duration::from_millis(1), &mut out);
        assert!(out.contains(&Command::FireTank));

        out.clear();
        pacing.request_fire();
        pacing.handle(&[], Duration::from_millis(1), &mut out);
        assert!(!out.contains(&Command::FireTank), "cooldown still running");

        out.clear();
        pacing.request_fire();
        pacing.handle(&[], Duration::from_millis(600), &mut out);
        assert!(out.contains(&Command::FireTank), "cooldown has lapsed");
    }
}
