use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nearby_transit::replay;
use nearby_transit::snapshot::Loadable;

fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only the cards
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: nearby-transit <bundle.json>");
        return ExitCode::from(2);
    };

    let bundle = match replay::load(&path) {
        Ok(bundle) => bundle,
        Err(e) => {
            tracing::error!(path = %path, "{e}");
            return ExitCode::FAILURE;
        }
    };

    let result = bundle.run();
    tracing::info!(
        cards = result.stats.cards,
        leaves = result.stats.leaves,
        hidden_leaves = result.stats.hidden_leaves,
        skipped_trips = result.stats.skipped_trips.total(),
        "Replayed bundle"
    );

    let json = match &result.cards {
        Loadable::Loading => serde_json::to_string_pretty("loading"),
        Loadable::Loaded(cards) => serde_json::to_string_pretty(cards),
    };
    match json {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Failed to serialize cards: {e}");
            ExitCode::FAILURE
        }
    }
}
