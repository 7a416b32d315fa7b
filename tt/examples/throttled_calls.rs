//! Simulated outbound calls through one shared throttle
//!
//! Run with: `cargo run --example throttled_calls`
//!
//! Ten calls arrive in a burst; the throttle admits at most four per second
//! and two at a time, and calls to "slow-host" additionally go one by one.

use std::time::Duration;

use taskthrottle::{Throttle, ThrottleConfig, ThrottleError, ThrottleEvent};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ThrottleError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let throttle = Throttle::spawn(ThrottleConfig {
        rate: 4,
        rate_per_ms: 1_000,
        concurrent: 2,
        ..Default::default()
    });
    let mut events = throttle.subscribe();

    for call in 0..10u32 {
        let group = (call % 3 == 0).then(|| "slow-host".to_string());
        throttle.run(group, async move {
            // Stand-in for the actual outbound request
            tokio::time::sleep(Duration::from_millis(150)).await;
            info!(call, "call finished");
        });
    }

    loop {
        match events.recv().await {
            Ok(ThrottleEvent::Drained) => break,
            Ok(event) => info!(?event, "throttle event"),
            Err(_) => break,
        }
    }

    let state = throttle.snapshot().await?;
    info!(
        dispatched = state.stats.total_dispatched,
        peak_in_flight = state.stats.peak_in_flight,
        "burst drained"
    );
    Ok(())
}
