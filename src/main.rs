//! Tap Rush headless demo
//!
//! Plays one round with a simple autoplay bot and logs the outcome. The real
//! game drives the same [`Engine`] from its UI frame loop.

use std::env;
use std::process::ExitCode;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use tap_rush::sim::{Engine, RoundEvent, RoundStatus, TargetId};
use tap_rush::{Config, Difficulty};

/// Frame step for the demo loop (~60 Hz)
const FRAME_MS: u64 = 16;
/// Safety cap when both lives and duration are infinite
const MAX_DEMO_MS: u64 = 120_000;

/// Parsed command-line arguments
#[derive(Debug)]
struct CliArgs {
    config: Config,
    config_path: Option<String>,
    seed: u64,
    /// Chance the bot's tap lands on the target
    accuracy: f64,
    show_help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        Self {
            config: Config::default(),
            config_path: None,
            seed: 1,
            accuracy: 0.9,
            show_help: false,
        }
    }
}

impl CliArgs {
    fn parse() -> Self {
        let mut args = Self::default();
        let mut iter = env::args().skip(1);
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-h" | "--help" => args.show_help = true,
                "--difficulty" => {
                    if let Some(v) = iter.next() {
                        args.config.difficulty = Difficulty::from_name(&v);
                    }
                }
                "--lives" => {
                    if let Some(v) = iter.next() {
                        args.config.max_lives = Config::parse_lives_input(&v);
                    }
                }
                "--duration" => {
                    if let Some(v) = iter.next() {
                        args.config.duration_sec = Config::parse_duration_input(&v);
                    }
                }
                "--infinite-lives" => args.config.infinite_lives = true,
                "--infinite-duration" => args.config.infinite_duration = true,
                "--seed" => {
                    if let Some(seed) = iter.next().and_then(|v| v.parse().ok()) {
                        args.seed = seed;
                    }
                }
                "--accuracy" => {
                    if let Some(acc) = iter.next().and_then(|v| v.parse::<f64>().ok()) {
                        args.accuracy = acc.clamp(0.0, 1.0);
                    }
                }
                "--config" => args.config_path = iter.next(),
                other => log::warn!("Ignoring unknown argument {:?}", other),
            }
        }
        args
    }

    fn print_help() {
        println!("tap-rush - headless autoplay round");
        println!();
        println!("Usage: tap-rush [options]");
        println!("  --difficulty <name>   Easy, Medium, Hard, Extreme, Agony");
        println!("  --lives <n>           Max lives (>= 1)");
        println!("  --duration <secs>     Round length, 5-30");
        println!("  --infinite-lives      Misses cost nothing");
        println!("  --infinite-duration   No countdown");
        println!("  --seed <u64>          RNG seed for placement and the bot");
        println!("  --accuracy <0..1>     Bot tap accuracy");
        println!("  --config <path>       JSON settings file (overrides flags)");
    }
}

/// Autoplay: taps each target after a human-ish reaction delay
struct Bot {
    rng: Pcg32,
    accuracy: f64,
    /// (target, clock time to tap at)
    plans: Vec<(TargetId, u64)>,
}

impl Bot {
    fn new(seed: u64, accuracy: f64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed ^ 0x5eed),
            accuracy,
            plans: Vec::new(),
        }
    }

    fn observe(&mut self, event: &RoundEvent, now_ms: u64) {
        if let RoundEvent::TargetSpawned { id } = event {
            let reaction = self.rng.random_range(180..900);
            self.plans.push((*id, now_ms + reaction));
        }
    }

    fn act(&mut self, engine: &mut Engine) {
        let now = engine.now_ms();
        let (due, later): (Vec<_>, Vec<_>) = self.plans.drain(..).partition(|(_, at)| *at <= now);
        self.plans = later;

        let snapshot = engine.snapshot();
        for (id, _) in due {
            let Some(target) = snapshot.live_targets.iter().find(|t| t.id == id) else {
                continue;
            };
            let r = target.size as f32 / 2.0;
            let center = target.pos + glam::Vec2::splat(r);
            if self.rng.random_bool(self.accuracy) {
                engine.tap_at(center.x, center.y);
            } else {
                // Fumbled: just outside the circle
                engine.tap_at(center.x + r + 2.0, center.y);
            }
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let mut args = CliArgs::parse();
    if args.show_help {
        CliArgs::print_help();
        return ExitCode::SUCCESS;
    }

    if let Some(path) = &args.config_path {
        match Config::load(path) {
            Ok(config) => args.config = config,
            Err(e) => log::warn!("{} - using defaults", e),
        }
    }

    log::info!("Tap Rush (native) starting...");
    let mut engine = Engine::with_seed(args.config.clone(), args.seed);
    let mut bot = Bot::new(args.seed, args.accuracy);

    engine.start();
    let mut last_report = 0;
    while engine.status() == RoundStatus::Playing && engine.now_ms() < MAX_DEMO_MS {
        for event in engine.drain_events() {
            bot.observe(&event, engine.now_ms());
        }
        bot.act(&mut engine);
        engine.advance(FRAME_MS);

        if engine.now_ms() - last_report >= 1000 {
            last_report = engine.now_ms();
            let snap = engine.snapshot();
            log::info!(
                "t={} score={} lives={} targets={}",
                snap.time_label(),
                snap.score,
                snap.lives_label(),
                snap.live_targets.len()
            );
        }
    }

    let snap = engine.snapshot();
    println!(
        "{} on {}: score {}, lives {}, time left {}",
        snap.status.as_str(),
        args.config.difficulty,
        snap.score,
        snap.lives_label(),
        snap.time_label()
    );
    ExitCode::SUCCESS
}
