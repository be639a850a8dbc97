use super::ui;
use crate::core::config::AppConfig;
use crate::core::{ConversionResult, CurrencyConverter};
use crate::providers::CoinMarketCapProvider;
use crate::providers::util::http_client;
use anyhow::{Context, Result};
use comfy_table::Cell;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// How a successful conversion is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One line: `100 USD = 0.0025 BTC`.
    Plain,
    /// A table with rate and timestamps.
    Detailed,
    Json,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvertArgs {
    pub amount: f64,
    pub from: String,
    pub to: String,
    pub format: OutputFormat,
}

pub async fn run(config: &AppConfig, args: &ConvertArgs) -> Result<()> {
    let result = convert(config, args).await?;

    let output = match args.format {
        OutputFormat::Plain => render_plain(&result),
        OutputFormat::Detailed => render_table(&result),
        OutputFormat::Json => {
            serde_json::to_string_pretty(&result).context("Failed to serialize result")?
        }
    };
    println!("{output}");
    Ok(())
}

/// Runs one conversion under the configured deadline; Ctrl-C cancels it too.
pub async fn convert(config: &AppConfig, args: &ConvertArgs) -> Result<ConversionResult> {
    let api_key = config.api_key()?;
    // A single request never outlives the overall deadline.
    let client = http_client(config.deadline())?;
    let provider = CoinMarketCapProvider::new(client, &config.api.base_url, api_key)
        .with_retry_policy(config.retry_policy());
    let converter = CurrencyConverter::new(provider);

    info!(
        amount = args.amount,
        from = %args.from,
        to = %args.to,
        "Converting"
    );

    let cancel = CancellationToken::new();
    let watchdog = cancel_on_deadline_or_interrupt(cancel.clone(), config.deadline());

    let pb = ui::new_spinner("Fetching conversion...");
    let outcome = converter
        .convert(args.amount, &args.from, &args.to, &cancel)
        .await;
    pb.finish_and_clear();
    watchdog.abort();

    Ok(outcome?)
}

fn cancel_on_deadline_or_interrupt(cancel: CancellationToken, deadline: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(deadline) => {
                debug!(?deadline, "Deadline reached, cancelling conversion");
            }
            Ok(()) = tokio::signal::ctrl_c() => {
                debug!("Interrupted, cancelling conversion");
            }
        }
        cancel.cancel();
    })
}

pub fn render_plain(result: &ConversionResult) -> String {
    format!(
        "{} {} = {} {}",
        ui::format_amount(result.original_amount()),
        result.from(),
        ui::format_amount(result.converted_amount()),
        result.to()
    )
}

pub fn render_table(result: &ConversionResult) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Field"), ui::header_cell("Value")]);

    let rows = [
        (
            "Original Amount",
            format!(
                "{} {}",
                ui::format_amount(result.original_amount()),
                result.from()
            ),
        ),
        (
            "Converted Amount",
            format!(
                "{} {}",
                ui::format_amount(result.converted_amount()),
                result.to()
            ),
        ),
        (
            "Exchange Rate",
            format!(
                "1 {} = {} {}",
                result.from(),
                ui::format_amount(result.exchange_rate()),
                result.to()
            ),
        ),
        (
            "Last Updated",
            result.source_updated_at().format(TIMESTAMP_FORMAT).to_string(),
        ),
        (
            "Query Time",
            result.fetched_at().format(TIMESTAMP_FORMAT).to_string(),
        ),
    ];
    for (label, value) in rows {
        table.add_row(vec![Cell::new(label), ui::value_cell(value)]);
    }

    let mut output = format!(
        "{}\n\n",
        ui::style_text("Currency Conversion Result", ui::StyleType::Title)
    );
    output.push_str(&table.to_string());
    output
}
