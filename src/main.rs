//! Matching engine performance lab.
//!
//! Runs the latency suite and a sustained throughput test, then walks through
//! a short trading session showing placement, matching, replace and cancel.

use clap::Parser;
use orderbook::units::{from_lots, from_ticks, to_lots, to_ticks};
use orderbook::{
    CancelOrder, CancelReplaceOrder, Exchange, Execution, ExecutionLog, Instrument, PlaceOrder, Side, TimeInForce,
};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod latency_test;

#[derive(Parser, Debug)]
#[command(name = "matchx", about = "Latency and throughput lab for the matching engine")]
struct Args {
    /// Length of the sustained throughput run, in seconds
    #[arg(long, default_value_t = 10)]
    duration: u64,

    /// Skip the latency suite
    #[arg(long)]
    skip_latency: bool,

    /// Only run the demo session
    #[arg(long)]
    demo_only: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    println!("=== Matching Engine Performance Lab ===");

    if !args.demo_only {
        if !args.skip_latency {
            latency_test::run_latency_tests()?;
        }
        println!("\n=== Sustained Throughput Test ===");
        latency_test::run_throughput_test(Duration::from_secs(args.duration))?;
    }

    println!("\n=== Basic Demo ===");
    run_basic_demo()
}

fn print_frame(log: &ExecutionLog) {
    for execution in log.last_frame().unwrap_or_default() {
        match execution {
            Execution::Trade(trade) => println!(
                "  TRADE   {} {:?} {} @ {}",
                trade.id,
                trade.order.side,
                from_lots(trade.trade_quantity),
                from_ticks(trade.trade_price)
            ),
            other => match other.reject_reason() {
                Some(reason) => println!("  REJECT  {} {:?}", other.id(), reason),
                None => println!("  {:<7} {}", kind(other), other.id()),
            },
        }
    }
}

fn kind(execution: &Execution) -> &'static str {
    match execution {
        Execution::Accept(_) => "ACCEPT",
        Execution::Trade(_) => "TRADE",
        Execution::Replace(_) => "REPLACE",
        Execution::Cancel(_) => "CANCEL",
        Execution::Status(_) => "STATUS",
    }
}

fn print_top(exchange: &Exchange) {
    let book = exchange.order_book();
    println!(
        "  best bid: {:?}, best ask: {:?}",
        book.best_bid().map(from_ticks),
        book.best_ask().map(from_ticks)
    );
}

/// Demonstrates a small session against one book.
fn run_basic_demo() -> anyhow::Result<()> {
    let mut exchange = Exchange::new(Instrument::default());
    let mut log = ExecutionLog::new();

    let order = |id: &str, attribution_id: i32, side: Side, price: f64, quantity: f64| PlaceOrder {
        symbol: "XBT.USD".to_string(),
        id: id.to_string(),
        attribution_id,
        side,
        price: to_ticks(price),
        quantity: to_lots(quantity),
        time_in_force: TimeInForce::GoodTillCancel,
    };

    println!("Resting ask 1.0 @ 150.00 and bid 0.5 @ 149.50");
    exchange.place_order(&order("ask-1", 1, Side::Sell, 150.0, 1.0), &mut log)?;
    print_frame(&log);
    exchange.place_order(&order("bid-1", 2, Side::Buy, 149.5, 0.5), &mut log)?;
    print_frame(&log);
    print_top(&exchange);

    // trades at the resting price
    println!("Crossing bid 0.75 @ 150.00");
    exchange.place_order(&order("bid-2", 3, Side::Buy, 150.0, 0.75), &mut log)?;
    print_frame(&log);
    print_top(&exchange);

    println!("Replace bid-1 with 0.5 @ 149.75");
    let replace = CancelReplaceOrder {
        symbol: "XBT.USD".to_string(),
        id: "bid-1b".to_string(),
        attribution_id: 2,
        cancel_id: "bid-1".to_string(),
        price: to_ticks(149.75),
        quantity: to_lots(0.5),
    };
    exchange.cancel_replace_order(&replace, &mut log)?;
    print_frame(&log);
    print_top(&exchange);

    println!("Cancel the remaining ask");
    let cancel = CancelOrder {
        symbol: "XBT.USD".to_string(),
        id: "cancel-1".to_string(),
        attribution_id: 1,
        cancel_id: "ask-1".to_string(),
    };
    exchange.cancel_order(&cancel, &mut log)?;
    print_frame(&log);
    print_top(&exchange);

    Ok(())
}
