//! Prints the current stats and availability report without caching or notifying.

use haxmon::{monitor::Availability, report::stats_report};

#[derive(clap::Parser)]
#[command(about = "Print the current Hax / Woiden report")]
struct Args {
    /// Timeout of every HTTP request, in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", value_name = "secs", default_value_t = 10)]
    request_timeout: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;

    pretty_env_logger::init_timed();

    let args = Args::parse();
    let client = haxmon::scrape::client(core::time::Duration::from_secs(args.request_timeout))?;

    let stats = haxmon::monitor::stats_snapshot(&client).await;
    let availability = Availability::collect(&client).await;

    tracing::info!(target: "main", "\n{}{}", stats_report(&stats), availability.report());

    Ok(())
}
