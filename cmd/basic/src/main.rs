//! Basic cofiber example
//!
//! Spawns a few fibers that sleep and yield, plus a fork-on-block handler,
//! with a background thread standing in for the periodic timer interrupt.
//!
//! # Environment Variables
//!
//! - `BASIC_FIBERS=<n>` - Number of worker fibers (default: 3)
//! - `BASIC_ROUNDS=<n>` - Sleep rounds per fiber (default: 3)
//! - `COFIBER_LOG_LEVEL=<level>` - off, error, warn, info, debug
//! - `COFIBER_TICK_MS=<ms>` - Tick period

use cofiber::{
    create_fiber_param, env_get, fiber_sleep, fork_on_block, init_logging, kinfo, schedule,
    scheduler_init, scheduler_tick, SchedulerConfig,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

static DONE: AtomicUsize = AtomicUsize::new(0);

fn worker(index: usize) {
    let rounds: usize = env_get("BASIC_ROUNDS", 3);
    for round in 0..rounds {
        kinfo!("fiber {} round {}", index, round);
        fiber_sleep(10 * index as u32 + 5);
    }
    DONE.fetch_add(1, Ordering::SeqCst);
}

fn quick_handler() {
    kinfo!("quick handler ran inline");
}

fn main() {
    init_logging();
    println!("=== cofiber basic example ===");

    let config = SchedulerConfig::from_env();
    let tick_ms = config.tick_period_ms;
    scheduler_init(config).expect("scheduler init");

    // Stand-in for the timer interrupt.
    std::thread::spawn(move || loop {
        std::thread::sleep(Duration::from_millis(tick_ms as u64));
        scheduler_tick();
    });

    let fibers: usize = env_get("BASIC_FIBERS", 3);
    for i in 0..fibers {
        let id = create_fiber_param(worker, i);
        println!("spawned fiber {} (id={})", i, id);
    }

    // Handlers that do not block cost no fiber at all.
    fork_on_block(quick_handler);

    while DONE.load(Ordering::SeqCst) < fibers {
        schedule();
    }
    println!("=== all {} fibers finished ===", fibers);
}
