use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use orderbook::{Side, TimeInForce};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "matchx-cli")]
#[command(about = "Command line client for the matching engine gateway")]
struct Cli {
    #[arg(long, env = "MATCHX_SERVER", default_value = "http://localhost:8080")]
    server: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place a limit order
    Place {
        #[arg(short = 's', long, default_value = "XBT.USD")]
        symbol: String,
        #[arg(long)]
        id: String,
        #[arg(short = 'a', long)]
        attribution: i32,
        #[arg(long, value_parser = parse_side)]
        side: Side,
        #[arg(short = 'p', long)]
        price: Decimal,
        #[arg(short = 'q', long)]
        quantity: Decimal,
        #[arg(long, value_parser = parse_time_in_force, default_value = "gtc")]
        tif: TimeInForce,
    },
    /// Replace a resting order with a new price and quantity
    Replace {
        #[arg(short = 's', long, default_value = "XBT.USD")]
        symbol: String,
        #[arg(long)]
        id: String,
        #[arg(short = 'a', long)]
        attribution: i32,
        #[arg(long)]
        cancel_id: String,
        #[arg(short = 'p', long)]
        price: Decimal,
        #[arg(short = 'q', long)]
        quantity: Decimal,
    },
    /// Cancel a resting order
    Cancel {
        #[arg(short = 's', long, default_value = "XBT.USD")]
        symbol: String,
        #[arg(long)]
        id: String,
        #[arg(short = 'a', long)]
        attribution: i32,
        #[arg(long)]
        cancel_id: String,
    },
    /// Query a resting order
    Status {
        #[arg(short = 's', long, default_value = "XBT.USD")]
        symbol: String,
        #[arg(long)]
        id: String,
        #[arg(short = 'a', long)]
        attribution: i32,
        #[arg(long)]
        status_id: String,
    },
    /// Best prices and resting order count
    Book,
    Depth {
        #[arg(short, long, default_value = "10")]
        levels: usize,
    },
    Health,
}

#[derive(Serialize)]
struct PlaceOrderRequest {
    id: String,
    attribution_id: i32,
    side: Side,
    price: Decimal,
    quantity: Decimal,
    time_in_force: TimeInForce,
}

#[derive(Serialize)]
struct ReplaceOrderRequest {
    id: String,
    attribution_id: i32,
    price: Decimal,
    quantity: Decimal,
}

#[derive(Deserialize)]
struct FrameResponse {
    executions: Vec<Value>,
}

#[derive(Deserialize)]
struct DepthResponse {
    symbol: String,
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
}

#[derive(Deserialize)]
struct PriceLevel {
    price: Decimal,
    quantity: Decimal,
    orders: usize,
}

fn parse_side(s: &str) -> Result<Side, String> {
    match s.to_lowercase().as_str() {
        "bid" | "buy" => Ok(Side::Buy),
        "ask" | "sell" => Ok(Side::Sell),
        _ => Err(format!("invalid side: {s}, use 'buy' or 'sell'")),
    }
}

fn parse_time_in_force(s: &str) -> Result<TimeInForce, String> {
    match s.to_lowercase().as_str() {
        "gtc" => Ok(TimeInForce::GoodTillCancel),
        "gfd" => Ok(TimeInForce::GoodForDay),
        "ioc" => Ok(TimeInForce::ImmediateOrCancel),
        "fok" => Ok(TimeInForce::FillOrKill),
        _ => Err(format!("invalid time in force: {s}, use gtc, gfd, ioc or fok")),
    }
}

async fn read<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> anyhow::Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("server returned {status}: {body}");
    }
    response.json().await.context("malformed response body")
}

/// One execution per line.
fn print_frame(frame: &FrameResponse) -> anyhow::Result<()> {
    for execution in &frame.executions {
        println!("{}", serde_json::to_string(execution)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let server = cli.server.trim_end_matches('/');

    match cli.command {
        Commands::Place {
            symbol,
            id,
            attribution,
            side,
            price,
            quantity,
            tif,
        } => {
            let request = PlaceOrderRequest {
                id,
                attribution_id: attribution,
                side,
                price,
                quantity,
                time_in_force: tif,
            };
            let response = client
                .post(format!("{server}/symbols/{symbol}/orders"))
                .json(&request)
                .send()
                .await?;
            print_frame(&read(response).await?)?;
        }

        Commands::Replace {
            symbol,
            id,
            attribution,
            cancel_id,
            price,
            quantity,
        } => {
            let request = ReplaceOrderRequest {
                id,
                attribution_id: attribution,
                price,
                quantity,
            };
            let response = client
                .put(format!("{server}/symbols/{symbol}/orders/{cancel_id}"))
                .json(&request)
                .send()
                .await?;
            print_frame(&read(response).await?)?;
        }

        Commands::Cancel {
            symbol,
            id,
            attribution,
            cancel_id,
        } => {
            let response = client
                .delete(format!("{server}/symbols/{symbol}/orders/{cancel_id}"))
                .query(&[("id", id), ("attribution_id", attribution.to_string())])
                .send()
                .await?;
            print_frame(&read(response).await?)?;
        }

        Commands::Status {
            symbol,
            id,
            attribution,
            status_id,
        } => {
            let response = client
                .get(format!("{server}/symbols/{symbol}/orders/{status_id}"))
                .query(&[("id", id), ("attribution_id", attribution.to_string())])
                .send()
                .await?;
            print_frame(&read(response).await?)?;
        }

        Commands::Book => {
            let response = client.get(format!("{server}/book")).send().await?;
            let book: Value = read(response).await?;
            println!("{}", serde_json::to_string_pretty(&book)?);
        }

        Commands::Depth { levels } => {
            let response = client
                .get(format!("{server}/book/depth"))
                .query(&[("levels", levels)])
                .send()
                .await?;
            let depth: DepthResponse = read(response).await?;

            println!("Market depth for {}", depth.symbol);
            println!("\nAsks:");
            for (i, level) in depth.asks.iter().enumerate() {
                println!("  {}: {} @ {} ({} orders)", i + 1, level.quantity, level.price, level.orders);
            }

            println!("\nBids:");
            for (i, level) in depth.bids.iter().enumerate() {
                println!("  {}: {} @ {} ({} orders)", i + 1, level.quantity, level.price, level.orders);
            }
        }

        Commands::Health => {
            let response = client.get(format!("{server}/health")).send().await?;
            let health: Value = read(response).await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
    }

    Ok(())
}
