use std::ops::ControlFlow;
use std::pin::pin;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use wsk::WskClient;
use wsk::config::Config;
use wsk::data_models::{DATE_FORMAT, SearchRequest};
use wsk::db::{Database, ResultRepo};
use wsk::sink::{MongoResultSink, ResultSink};

#[derive(Parser, Debug)]
#[command(name = "wsk", about = "Search a WSK source over a date range")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a query and print every matching document as a JSON line
    Search {
        #[arg(long)]
        query: String,
        #[arg(long)]
        source_id: i64,
        #[arg(long, value_parser = parse_date)]
        start_date: NaiveDate,
        #[arg(long, value_parser = parse_date)]
        end_date: NaiveDate,
        #[arg(long, default_value_t = 10)]
        per_page: u64,
        /// Also retrieve each document's full text
        #[arg(long)]
        full_text: bool,
        /// Store results in MongoDB
        #[arg(long)]
        save: bool,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Command::Search {
            query,
            source_id,
            start_date,
            end_date,
            per_page,
            full_text,
            save,
        } => {
            let request =
                SearchRequest::new(query, source_id, start_date, end_date, per_page, full_text)?;
            let client = WskClient::from_config(&config);

            let mut store = if save {
                let db = Database::init_global(&config).await?;
                Some(MongoResultSink::new(
                    ResultRepo::new(db),
                    client.session(),
                    &request,
                ))
            } else {
                None
            };

            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("interrupt received, stopping after the current page");
                    on_signal.cancel();
                }
            });

            let traversal = client.search(request)?.with_cancellation(cancel);
            let mut batches = pin!(traversal.into_stream());
            let mut total = 0usize;
            let mut abandoned = 0usize;
            while let Some(batch) = batches.next().await {
                let batch = match batch {
                    Ok(batch) => batch,
                    Err(e @ wsk::Error::QueryTooBroad { .. }) => {
                        let flow = match store.as_mut() {
                            Some(store) => store.on_fatal(&e.to_string()),
                            None => {
                                log::error!("skipping window: {e}");
                                ControlFlow::Continue(())
                            }
                        };
                        abandoned += 1;
                        if flow.is_break() {
                            return Err(e.into());
                        }
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };
                for doc in &batch.documents {
                    println!("{}", serde_json::to_string(doc)?);
                }
                total += batch.documents.len();
                if let Some(store) = store.as_mut() {
                    store.emit_batch(&batch.documents).await?;
                }
            }
            log::info!("found {total} documents");
            if abandoned > 0 {
                anyhow::bail!("{abandoned} one-day windows were too broad to search");
            }
        }
    }
    Ok(())
}
