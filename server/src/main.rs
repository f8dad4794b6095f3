use application::service::{StatsProjectionService, STATS_CONSUMER_GROUP};
use kernel::interface::mq::{DependOnRentEventStream, RentEventStream};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::error::StackTrace;
use crate::handler::AppModule;

mod error;
mod handler;

// The rental services are the library surface for the (external) transport
// layer; this binary runs the stats consumer that keeps the counters fresh.
#[tokio::main]
async fn main() -> Result<(), StackTrace> {
    let appender = tracing_appender::rolling::daily(std::path::Path::new("./logs/"), "stats.log");
    let (non_blocking_appender, _guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer().with_filter(tracing_subscriber::EnvFilter::new(
                std::env::var("RUST_LOG")
                    .unwrap_or_else(|_| "driver=info,server=info,application=info,sqlx=warn".into()),
            )),
        )
        .with(
            tracing_subscriber::fmt::Layer::default()
                .with_writer(non_blocking_appender)
                .with_ansi(false)
                .with_filter(tracing_subscriber::filter::LevelFilter::INFO),
        )
        .init();

    let module = AppModule::new().await?;
    tracing::info!(group = STATS_CONSUMER_GROUP, "starting stats consumer");

    let worker = module.clone();
    module
        .rent_event_stream()
        .subscribe(STATS_CONSUMER_GROUP, move |event| {
            let module = worker.clone();
            async move { module.apply(event).await }
        })
        .await;

    Ok(())
}
