//! Dot Reflex headless runner
//!
//! A scripted bot plays sessions against a simulated clock, results go
//! through the full rating/persistence path, then the leaderboard is printed.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use dot_reflex::leaderboard::reaction_category;
use dot_reflex::persistence::{FileStore, MemoryStore, ProfileStore};
use dot_reflex::platform::{
    AdNetwork, Haptics, Identity, LogAds, LogHaptics, StaticIdentity,
};
use dot_reflex::sim::{GameStatus, SessionInput};
use dot_reflex::{App, Settings};

#[derive(Parser, Debug)]
#[command(name = "dot-reflex", about = "Play scripted dot-reflex sessions headlessly")]
struct Args {
    /// RNG seed (overrides the settings file)
    #[arg(long)]
    seed: Option<u64>,
    /// Number of sessions to play
    #[arg(long, default_value_t = 10)]
    games: u32,
    /// JSON profile store (in-memory when omitted)
    #[arg(long)]
    store: Option<PathBuf>,
    /// Settings file
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Player id to submit results as
    #[arg(long, default_value = "bot")]
    player: String,
    /// Bot mean reaction time in ms
    #[arg(long, default_value_t = 450)]
    reaction_ms: u64,
    /// Chance the bot taps a decoy (0-1)
    #[arg(long, default_value_t = 0.04)]
    miss_rate: f64,
    /// Rounds after which the bot stops tapping and lets the timer run out
    #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
    max_rounds: u32,
}

/// Simulated player
struct Bot {
    rng: Pcg32,
    reaction_ms: u64,
    miss_rate: f64,
}

impl Bot {
    /// Delay before the next tap and the dot it lands on
    fn next_tap(&mut self, board: usize, target: usize) -> (u64, usize) {
        let jitter = self.reaction_ms / 3;
        let delay = self
            .rng
            .random_range(self.reaction_ms - jitter..=self.reaction_ms + jitter);
        let index = if board > 1 && self.rng.random_bool(self.miss_rate) {
            (target + self.rng.random_range(1..board)) % board
        } else {
            target
        };
        (delay, index)
    }
}

/// Let the bot play one started game to the end. Returns the clock.
///
/// Past `max_rounds` the bot stops tapping, so the round countdown ends
/// the game even when the bot never misses or runs late.
fn play_game<S, I, H, A>(
    app: &mut App<S, I, H, A>,
    bot: &mut Bot,
    start_ms: u64,
    max_rounds: u32,
) -> u64
where
    S: ProfileStore,
    I: Identity,
    H: Haptics,
    A: AdNetwork,
{
    let mut now = start_ms;
    while app.session().state().status == GameStatus::Started {
        let state = app.session().state();
        if state.round > max_rounds {
            now += app.session().time_remaining_ms(now);
            app.update(now);
            break;
        }
        let Some(target) = state.target_index() else {
            break;
        };
        let (delay, index) = bot.next_tap(state.dots.len(), target);
        now += delay;
        app.input(now, SessionInput::Tap { index });
        app.update(now);
    }
    now
}

fn run<S: ProfileStore>(args: &Args, settings: Settings, store: S) -> Result<(), Box<dyn Error>> {
    let seed = settings.effective_seed();
    let settings = Settings {
        seed: Some(seed),
        ..settings
    };
    let mut bot = Bot {
        rng: Pcg32::seed_from_u64(seed.wrapping_add(1)),
        reaction_ms: args.reaction_ms.max(3),
        miss_rate: args.miss_rate.clamp(0.0, 1.0),
    };
    let mut app = App::new(
        settings,
        store,
        StaticIdentity(Some(args.player.clone())),
        LogHaptics,
        LogAds::default(),
    );

    let mut now = 0u64;
    for game in 1..=args.games {
        now += 1000;
        app.input(now, SessionInput::StartNewGame);
        app.update(now);

        now = play_game(&mut app, &mut bot, now, args.max_rounds);

        let state = app.session().state();
        println!(
            "game {:>3}: score {:>3}, board {:>2}, avg reaction {:>4}ms ({})",
            game,
            state.score,
            state.max_dots,
            state.avg_reaction_time_ms,
            reaction_category(state.avg_reaction_time_ms)
        );
    }

    let board = app.rankings()?;
    println!("\nLeaderboard:");
    for (rank, profile) in board.top(10).iter().enumerate() {
        println!(
            "{:>2}. {:<12} rating {:>5}  games {:>4}  avg score {:>3}  best {:>3}",
            rank + 1,
            profile.id,
            profile.rating,
            profile.games_played,
            profile.average_score,
            profile.max_score
        );
    }
    if let (Some(rank), Some(me)) = (board.rank_of(&args.player), board.find(&args.player)) {
        println!(
            "\n{} is #{} with rating {} ({})",
            me.id,
            rank,
            me.rating,
            reaction_category(me.avg_reaction_time_ms)
        );
    }
    println!("Interstitials shown: {}", app.ads().shown);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut settings = args
        .settings
        .as_deref()
        .map(Settings::load_from)
        .unwrap_or_default();
    if args.seed.is_some() {
        settings.seed = args.seed;
    }
    log::info!("Dot Reflex (native) starting...");

    match &args.store {
        Some(path) => run(&args, settings, FileStore::open(path)?),
        None => run(&args, settings, MemoryStore::new()),
    }
}
