use haxmon::{
    config::{NotifyConfig, StoreConfig},
    monitor::{STATS_KEY, check_stats},
};

#[derive(clap::Parser)]
#[command(about = "Notify when the Hax data-center statistics change")]
struct Args {
    #[command(flatten)]
    notify: NotifyConfig,
    #[command(flatten)]
    store: StoreConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;

    pretty_env_logger::init_timed();

    let args = Args::parse();
    let client = haxmon::scrape::client(args.notify.timeout())?;
    let store = args.store.open(&client);
    let notifiers = args.notify.notifiers(&client);

    let outcome = check_stats(&client, &store, &notifiers).await;
    tracing::info!(target: "main", "{STATS_KEY}: {outcome:?}");

    Ok(())
}
