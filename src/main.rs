//! Looping Agent - interactive command-line entry point.

use looping_agent::{agent::Agent, cli, config::Config};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they do not interleave with the chat on stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "looping_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    info!(
        model = %config.default_model,
        window = config.history_window,
        max_iterations = config.max_iterations,
        "Loaded configuration"
    );

    let agent = Agent::new(config)?;

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    tokio::select! {
        result = cli::run_repl(&agent, stdin, stdout) => result?,
        _ = tokio::signal::ctrl_c() => {
            println!("\nBot: Goodbye!");
        }
    }

    Ok(())
}
