use haxmon::{
    config::{NotifyConfig, StoreConfig},
    monitor::{AVAILABLE_KEY, check_available},
};

#[derive(clap::Parser)]
#[command(about = "Notify when the Hax / Woiden available centers change")]
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

    let outcome = check_available(&client, &store, &notifiers).await;
    tracing::info!(target: "main", "{AVAILABLE_KEY}: {outcome:?}");

    Ok(())
}
