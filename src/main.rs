//! World Awareness - Demo Entry Point
//!
//! Loads the world data, spawns a crowd around a starting point and lets the
//! players wander, printing how knowledge and zone state evolve.

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

use world_awareness::core::types::{ObjectId, ObjectKind, Position};
use world_awareness::entity::{NpcBehavior, PlayerBehavior, Vitals, WorldObject};
use world_awareness::transport::{OutboundMessage, Transport};
use world_awareness::world::loader::default_world_path;
use world_awareness::world::{World, WorldData};

/// Random-walk demo of the awareness core
#[derive(Parser, Debug)]
#[command(name = "world-awareness")]
#[command(about = "Spawn a crowd and watch knowledge and zone state evolve")]
struct Args {
    /// World data file
    #[arg(long, default_value_os_t = default_world_path())]
    world: PathBuf,

    /// Number of wandering players
    #[arg(long, default_value_t = 200)]
    players: u32,

    /// Number of stationary NPCs
    #[arg(long, default_value_t = 400)]
    npcs: u32,

    /// Movement steps to simulate
    #[arg(long, default_value_t = 50)]
    steps: u32,

    /// Wall-clock delay between steps in milliseconds
    #[arg(long, default_value_t = 100)]
    step_ms: u64,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,
}

/// Counts outbound messages instead of encoding them
#[derive(Default)]
struct CountingTransport {
    sent: AtomicU64,
    zone_messages: AtomicU64,
}

impl Transport for CountingTransport {
    fn send(&self, recipient: ObjectId, message: OutboundMessage) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        if matches!(message, OutboundMessage::System(_) | OutboundMessage::CompassZone(_)) {
            self.zone_messages.fetch_add(1, Ordering::Relaxed);
        }
        tracing::trace!(%recipient, ?message, "send");
    }
}

/// Start of the crowd, inside the first peace zone of the bundled data
const ORIGIN: Position = Position::new(-84_000, 243_500, -3_100);
const SPREAD: i32 = 12_000;
const STRIDE: i32 = 600;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "world_awareness=info".into()),
        )
        .init();

    let args = Args::parse();
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, "world awareness demo starting");

    let rt = Runtime::new()?;
    rt.block_on(run(args, seed))
}

async fn run(args: Args, seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    let data = WorldData::load_file(&args.world)?;
    let transport = Arc::new(CountingTransport::default());
    let world = World::from_data(&data, transport.clone(), tokio::runtime::Handle::current())?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut players = Vec::with_capacity(args.players as usize);
    for i in 0..args.players {
        let mut vitals = Vitals::full(1_000.0, 400.0, 600.0);
        vitals.reduce_hp(rng.gen_range(0.0..900.0));
        let object = WorldObject::new(
            ObjectId(i + 1),
            ObjectKind::Player,
            scatter(&mut rng, ORIGIN, SPREAD),
            PlayerBehavior::new(format!("Wanderer_{}", i)),
        )
        .with_vitals(vitals);

        let player = world.spawn(object)?;
        world.revalidate_zones(&player);
        world.scheduler().start(&player);
        players.push(player);
    }

    for i in 0..args.npcs {
        let npc = world.spawn(WorldObject::new(
            ObjectId(100_000 + i),
            ObjectKind::Npc,
            scatter(&mut rng, ORIGIN, SPREAD * 2),
            NpcBehavior::new(30_000 + rng.gen_range(0..50)),
        ))?;
        world.revalidate_zones(&npc);
    }

    print_stats(&world, &players, transport.as_ref(), "spawned");

    let step = Duration::from_millis(args.step_ms);
    for n in 0..args.steps {
        for player in &players {
            let target = scatter(&mut rng, player.position(), STRIDE);
            world.move_to(player, target)?;
            world.revalidate_zones(player);
        }
        tokio::time::sleep(step).await;

        if n % 10 == 9 {
            print_stats(&world, &players, transport.as_ref(), &format!("step {}", n + 1));
        }
    }

    world.shutdown();
    print_stats(&world, &players, transport.as_ref(), "shut down");
    Ok(())
}

fn scatter(rng: &mut ChaCha8Rng, around: Position, spread: i32) -> Position {
    Position::new(
        around.x + rng.gen_range(-spread..=spread),
        around.y + rng.gen_range(-spread..=spread),
        around.z,
    )
}

fn print_stats(world: &World, players: &[Arc<WorldObject>], transport: &CountingTransport, label: &str) {
    let known: usize = players.iter().map(|p| p.known_count()).sum();
    let in_peace = players.iter().filter(|p| p.is_in_peace()).count();
    let in_battle = players.iter().filter(|p| p.is_in_battle()).count();
    let avg_hp = players.iter().map(|p| p.vitals().cur_hp).sum::<f64>() / players.len().max(1) as f64;

    println!("=== {} ===", label);
    println!(
        "  objects: {}  active regions: {}/{}",
        world.index().len(),
        world.grid().active_regions(),
        world.grid().len()
    );
    println!(
        "  known per player: {:.1}  peace: {}  battle: {}  avg hp: {:.0}",
        known as f64 / players.len().max(1) as f64,
        in_peace,
        in_battle,
        avg_hp
    );
    println!(
        "  messages: {} ({} zone)",
        transport.sent.load(Ordering::Relaxed),
        transport.zone_messages.load(Ordering::Relaxed)
    );
}
