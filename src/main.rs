use dotenv::dotenv;
use portfolio_ledger::{run, Settings};
use tracing::subscriber::set_global_default;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv();
    let _guard = std::env::var("SENTRY_DSN").ok().map(|dsn| sentry::init(dsn.as_str()));
    let subscriber = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer());
    set_global_default(subscriber)?;
    let settings = Settings::new()?;
    run(settings).await
}
