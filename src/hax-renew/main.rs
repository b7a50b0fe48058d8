use haxmon::{
    config::{CalendarConfig, NotifyConfig, StoreConfig},
    renew::{record, reschedule},
};

#[derive(clap::Parser)]
#[command(about = "Record a manual Hax renewal and remind before the next deadline")]
struct Args {
    #[command(flatten)]
    notify: NotifyConfig,
    #[command(flatten)]
    store: StoreConfig,
    #[command(flatten)]
    calendar: CalendarConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    use clap::Parser;

    pretty_env_logger::init_timed();

    let args = Args::parse();
    let client = haxmon::scrape::client(args.notify.timeout())?;
    let store = args.store.open(&client);
    let notifiers = args.notify.notifiers(&client);

    let now = chrono::Local::now().naive_local();
    let Some(renewal) = record(&store, &notifiers, now).await else {
        return Ok(());
    };

    match args.calendar.calendar(&client) {
        Some(calendar) => {
            if let Some(id) = reschedule(&store, &calendar, &renewal).await {
                tracing::info!(target: "main", "reminder {id} scheduled");
            }
        }
        None => tracing::debug!(target: "main", "calendar not configured, no reminder"),
    }

    Ok(())
}
