//! Booking Simulator CLI Tool
//!
//! Drives the booking lifecycle in-process to demonstrate and stress the
//! transition rules without an HTTP server.
//!
//! Usage:
//!   cargo run --bin booking-sim -- --help
//!   cargo run --bin booking-sim scenario
//!   cargo run --bin booking-sim race --workers 16 --rounds 10
//!   cargo run --bin booking-sim load --customers 8 --bookings 50

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use doovo_bookings::lifecycle::{successor, STATUS_CHAIN};
use doovo_bookings::{
    BookingError, BookingService, BookingStatus, BookingType, Identity, InMemoryBookingStore,
};
use tokio::sync::Barrier;

#[derive(Parser)]
#[command(name = "booking-sim")]
#[command(about = "In-process simulator for the laundry booking lifecycle")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk one booking through the documented happy path and a denied skip
    Scenario,
    /// Many workers race to advance the same booking
    Race {
        /// Concurrent workers per round
        #[arg(short, long, default_value = "16")]
        workers: usize,
        /// Number of fresh bookings to race on
        #[arg(short, long, default_value = "10")]
        rounds: usize,
    },
    /// Customers create bookings concurrently; each is driven to complete
    Load {
        /// Concurrent customers
        #[arg(short, long, default_value = "8")]
        customers: usize,
        /// Bookings created per customer
        #[arg(short, long, default_value = "50")]
        bookings: usize,
    },
}

#[derive(Debug, Default)]
struct RaceOutcome {
    winners: usize,
    conflicts: usize,
    denials: usize,
    other: usize,
}

fn new_service() -> BookingService {
    BookingService::new(Arc::new(InMemoryBookingStore::new()))
}

fn run_scenario() -> Result<()> {
    let service = new_service();
    let customer = Identity::customer("customer-1");
    let worker = Identity::worker("worker-1");

    let booking = service.create_booking(Some(&customer), BookingType::Dropoff)?;
    println!(
        "1. created booking {} ({}) owned by '{}' -> {}",
        booking.id, booking.booking_type, booking.owner, booking.status
    );

    let booking = service.update_status(Some(&worker), booking.id, BookingStatus::Accepted)?;
    println!("2. worker advanced booking {} -> {}", booking.id, booking.status);

    match service.update_status(Some(&worker), booking.id, BookingStatus::Washing) {
        Err(e @ BookingError::InvalidTransition { .. }) => {
            println!("3. skip to washing denied: {}", e)
        }
        other => anyhow::bail!("expected skip to washing to be denied, got {:?}", other),
    }

    match service.update_status(Some(&customer), booking.id, BookingStatus::OnTheWay) {
        Err(e @ BookingError::Forbidden { .. }) => println!("4. customer update denied: {}", e),
        other => anyhow::bail!("expected customer update to be forbidden, got {:?}", other),
    }

    let mut current = service.get_booking(booking.id)?;
    let mut step = 5;
    while let Some(next) = successor(current.status) {
        current = service.update_status(Some(&worker), current.id, next)?;
        println!("{}. worker advanced booking {} -> {}", step, current.id, current.status);
        step += 1;
    }

    println!("✅ Scenario completed: booking {} is {}", current.id, current.status);
    Ok(())
}

async fn run_race(workers: usize, rounds: usize) -> Result<()> {
    let service = new_service();
    let customer = Identity::customer("customer-1");
    let mut total = RaceOutcome::default();

    println!("🏁 Racing {} workers over {} bookings", workers, rounds);

    for round in 1..=rounds {
        let booking = service.create_booking(Some(&customer), BookingType::PickupReturn)?;
        let barrier = Arc::new(Barrier::new(workers));

        let handles: Vec<_> = (0..workers)
            .map(|i| {
                let service = service.clone();
                let barrier = barrier.clone();
                let worker = Identity::worker(format!("worker-{}", i));
                tokio::spawn(async move {
                    barrier.wait().await;
                    service.update_status(Some(&worker), booking.id, BookingStatus::Accepted)
                })
            })
            .collect();

        let mut outcome = RaceOutcome::default();
        for handle in handles {
            match handle.await? {
                Ok(_) => outcome.winners += 1,
                Err(BookingError::Conflict { .. }) => outcome.conflicts += 1,
                Err(BookingError::InvalidTransition { .. }) => outcome.denials += 1,
                Err(_) => outcome.other += 1,
            }
        }

        println!(
            "  round {:>3}: booking {} winners={} conflicts={} denials={} other={}",
            round, booking.id, outcome.winners, outcome.conflicts, outcome.denials, outcome.other
        );

        if outcome.winners != 1 {
            anyhow::bail!("round {} produced {} winners", round, outcome.winners);
        }

        total.winners += outcome.winners;
        total.conflicts += outcome.conflicts;
        total.denials += outcome.denials;
        total.other += outcome.other;
    }

    println!(
        "📊 Results: {} winners, {} conflicts, {} denials, {} other",
        total.winners, total.conflicts, total.denials, total.other
    );
    Ok(())
}

async fn run_load(customers: usize, bookings: usize) -> Result<()> {
    let service = new_service();
    let start = Instant::now();

    println!(
        "🚚 {} customers creating {} bookings each",
        customers, bookings
    );

    let handles: Vec<_> = (0..customers)
        .map(|c| {
            let service = service.clone();
            tokio::spawn(async move {
                let customer = Identity::customer(format!("customer-{}", c));
                let worker = Identity::worker(format!("worker-{}", c));
                let mut transitions = 0usize;

                for n in 0..bookings {
                    let booking_type = if n % 2 == 0 {
                        BookingType::Dropoff
                    } else {
                        BookingType::PickupReturn
                    };
                    let mut booking = service.create_booking(Some(&customer), booking_type)?;

                    while let Some(next) = successor(booking.status) {
                        booking = service.update_status(Some(&worker), booking.id, next)?;
                        transitions += 1;
                    }
                }

                Ok::<usize, BookingError>(transitions)
            })
        })
        .collect();

    let mut transitions = 0;
    for handle in handles {
        transitions += handle.await??;
    }

    let elapsed = start.elapsed();
    let all = service.list_bookings(None)?;
    let complete = all
        .iter()
        .filter(|b| b.status == BookingStatus::Complete)
        .count();
    let operations = all.len() + transitions;

    println!("📊 Load results:");
    println!("  Bookings created: {}", all.len());
    println!("  Bookings complete: {}", complete);
    println!(
        "  Transitions applied: {} ({} per booking)",
        transitions,
        STATUS_CHAIN.len() - 1
    );
    println!("  Elapsed: {:?}", elapsed);
    println!(
        "  Throughput: {:.0} ops/s",
        operations as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );

    if complete != customers * bookings {
        anyhow::bail!("only {} of {} bookings completed", complete, customers * bookings);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scenario => run_scenario(),
        Commands::Race { workers, rounds } => run_race(workers.max(1), rounds).await,
        Commands::Load {
            customers,
            bookings,
        } => run_load(customers, bookings).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Simulation failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}
