//! Performance testing suite for the matching engine.
//!
//! Measures latency and throughput under various scenarios:
//! - Market data access, order placement, matching, cancellation
//! - Sustained throughput with a mixed workload
//! - Averages over many iterations

use orderbook::{
    BookError, CancelOrder, Exchange, Execution, ExecutionCallback, FixedClock, Instrument, PlaceOrder, Side,
    TimeInForce,
};
use std::hint::black_box;
use std::time::{Duration, Instant};
use tracing::info;

const SYMBOL: &str = "XBT.USD";

/// Counts what an instruction produced without keeping it.
#[derive(Debug, Default)]
pub struct Tally {
    pub executions: u64,
    pub trades: u64,
    pub rejections: u64,
}

impl ExecutionCallback for Tally {
    fn notify(&mut self, execution: Execution) {
        self.executions += 1;
        match execution {
            // each trade is reported once per side
            Execution::Trade(_) => self.trades += 1,
            other if other.reject_reason().is_some() => self.rejections += 1,
            _ => {}
        }
    }
}

fn exchange() -> Exchange {
    Exchange::with_clock(Instrument::default(), Box::new(FixedClock(0)))
}

fn limit(id: u64, attribution_id: i32, side: Side, price: i64, quantity: i64) -> PlaceOrder {
    PlaceOrder {
        symbol: SYMBOL.to_string(),
        id: id.to_string(),
        attribution_id,
        side,
        price,
        quantity,
        time_in_force: TimeInForce::GoodTillCancel,
    }
}

fn place(exchange: &mut Exchange, order: &PlaceOrder, tally: &mut Tally) -> Result<(), BookError> {
    exchange.place_order(order, tally)
}

/// Runs complete latency test suite.
pub fn run_latency_tests() -> Result<(), BookError> {
    println!(" Matching Engine - Latency Tests\n");

    test_market_data_latency()?;
    test_order_submission_latency()?;
    test_order_matching_latency()?;
    test_cancellation_latency()
}

/// Tests best bid/ask lookup performance.
fn test_market_data_latency() -> Result<(), BookError> {
    println!(" Market Data Latency Test");

    let mut ex = exchange();
    let mut tally = Tally::default();
    for i in 0..100u64 {
        place(&mut ex, &limit(i, 1, Side::Sell, 10_000 + i as i64, 100), &mut tally)?;
        place(&mut ex, &limit(i + 100, 1, Side::Buy, 9_999 - i as i64, 100), &mut tally)?;
    }
    let book = ex.order_book();

    let iterations = 1_000_000;

    let start = Instant::now();
    for _ in 0..iterations {
        black_box(book.best_bid());
    }
    let bid_duration = start.elapsed();

    let start = Instant::now();
    for _ in 0..iterations {
        black_box(book.best_ask());
    }
    let ask_duration = start.elapsed();

    println!("  Best bid lookup: {:.2} ns/call", bid_duration.as_nanos() as f64 / iterations as f64);
    println!("  Best ask lookup: {:.2} ns/call", ask_duration.as_nanos() as f64 / iterations as f64);
    println!(
        "  Combined latency: {:.2} ns\n",
        (bid_duration.as_nanos() + ask_duration.as_nanos()) as f64 / iterations as f64
    );
    Ok(())
}

/// Tests placement latency for non-crossing orders into a growing book.
fn test_order_submission_latency() -> Result<(), BookError> {
    println!(" Order Submission Latency Test");

    let iterations = 10_000u64;
    let mut ex = exchange();
    let mut tally = Tally::default();

    let start = Instant::now();
    for i in 0..iterations {
        place(&mut ex, &limit(i, 1, Side::Buy, 10_000 - (i % 500) as i64, 100), &mut tally)?;
    }
    let avg_latency = start.elapsed().as_nanos() as f64 / iterations as f64;

    println!("  Average order submission: {:.2} ns", avg_latency);
    println!("  Throughput: {:.0} orders/second\n", 1_000_000_000.0 / avg_latency);
    Ok(())
}

/// Tests matching latency for an order sweeping several levels.
fn test_order_matching_latency() -> Result<(), BookError> {
    println!(" Order Matching Latency Test");

    let iterations = 1_000u64;
    let mut total_setup_time = 0u128;
    let mut total_match_time = 0u128;

    for i in 0..iterations {
        let mut tally = Tally::default();
        let setup_start = Instant::now();
        let mut ex = exchange();
        for j in 0..10u64 {
            place(&mut ex, &limit(j, 1, Side::Sell, 10_000 + j as i64, 100), &mut tally)?;
        }
        total_setup_time += setup_start.elapsed().as_nanos();

        let crossing = limit(1_000 + i, 2, Side::Buy, 10_005, 500);

        let match_start = Instant::now();
        place(&mut ex, &crossing, &mut tally)?;
        total_match_time += match_start.elapsed().as_nanos();

        black_box(tally);
    }

    println!("  Setup (10 resting orders): {:.2} ns", total_setup_time as f64 / iterations as f64);
    println!("  Crossing order execution: {:.2} ns", total_match_time as f64 / iterations as f64);
    println!(
        "  Total order-to-trade: {:.2} ns\n",
        (total_setup_time + total_match_time) as f64 / iterations as f64
    );
    Ok(())
}

/// Cancels from the middle, head and tail of a single deep level.
fn test_cancellation_latency() -> Result<(), BookError> {
    println!(" Cancellation Latency Test");

    let iterations = 1_000u64;
    let orders_per_test = 100u64;
    let mut total_time = 0u128;

    for _ in 0..iterations {
        let mut ex = exchange();
        let mut tally = Tally::default();
        for j in 0..orders_per_test {
            place(&mut ex, &limit(j, 1, Side::Buy, 10_000, 100), &mut tally)?;
        }

        let start = Instant::now();
        for j in (0..orders_per_test).step_by(2) {
            let cancel = CancelOrder {
                symbol: SYMBOL.to_string(),
                id: format!("c{j}"),
                attribution_id: 1,
                cancel_id: j.to_string(),
            };
            ex.cancel_order(&cancel, &mut tally)?;
        }
        total_time += start.elapsed().as_nanos();
    }

    println!(
        "  Cancel from a shared level: {:.2} ns per order\n",
        total_time as f64 / (iterations * orders_per_test / 2) as f64
    );
    Ok(())
}

/// Outcome of a sustained run.
#[derive(Debug)]
pub struct ThroughputReport {
    pub elapsed: Duration,
    pub orders: u64,
    pub trades: u64,
    pub best_bid: Option<i64>,
    pub best_ask: Option<i64>,
    pub resting: usize,
}

/// Runs a mixed workload for `duration`: a quarter each of passive bids,
/// passive asks, crossing bids and crossing asks.
pub fn run_throughput_test(duration: Duration) -> Result<ThroughputReport, BookError> {
    println!(" Sustained Throughput Test ({} seconds)", duration.as_secs());

    let mut ex = exchange();
    let mut tally = Tally::default();
    let mut order_id = 1u64;
    let mut orders_processed = 0u64;

    let start_time = Instant::now();
    while start_time.elapsed() < duration {
        // two originators so crossing flow is never self-trade skipped
        let attribution_id = (order_id % 2) as i32 + 1;
        let order = match order_id % 4 {
            0 => limit(order_id, attribution_id, Side::Buy, 9_999 - (order_id % 100) as i64, 100),
            1 => limit(order_id, attribution_id, Side::Sell, 10_001 + (order_id % 100) as i64, 100),
            2 => PlaceOrder {
                time_in_force: TimeInForce::ImmediateOrCancel,
                ..limit(order_id, attribution_id, Side::Buy, 10_005, 50)
            },
            _ => PlaceOrder {
                time_in_force: TimeInForce::ImmediateOrCancel,
                ..limit(order_id, attribution_id, Side::Sell, 9_995, 50)
            },
        };
        place(&mut ex, &order, &mut tally)?;

        order_id += 1;
        orders_processed += 1;

        if order_id % 100 == 0 {
            black_box(ex.order_book().best_bid());
            black_box(ex.order_book().best_ask());
        }
    }

    let elapsed = start_time.elapsed();
    let trades = tally.trades / 2;
    let report = ThroughputReport {
        elapsed,
        orders: orders_processed,
        trades,
        best_bid: ex.order_book().best_bid(),
        best_ask: ex.order_book().best_ask(),
        resting: ex.order_book().len(),
    };

    println!("  Duration: {:.1} seconds", report.elapsed.as_secs_f64());
    println!("  Orders processed: {}", report.orders);
    println!("  Trades executed: {}", report.trades);
    println!("  Order throughput: {:.0} orders/second", report.orders as f64 / elapsed.as_secs_f64());
    println!("  Trade throughput: {:.0} trades/second", report.trades as f64 / elapsed.as_secs_f64());
    println!("  Final book state: bid={:?}, ask={:?}", report.best_bid, report.best_ask);
    info!(
        orders = report.orders,
        executions = tally.executions,
        trades = report.trades,
        resting = report.resting,
        rejections = tally.rejections,
        "throughput run finished"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tally_counts_each_trade_leg() {
        let mut ex = exchange();
        let mut tally = Tally::default();
        place(&mut ex, &limit(1, 1, Side::Sell, 100, 10), &mut tally).unwrap();
        place(&mut ex, &limit(2, 2, Side::Buy, 100, 4), &mut tally).unwrap();

        assert_eq!(tally.trades, 2);
        assert_eq!(tally.rejections, 0);
    }

    #[test]
    fn tally_counts_rejections() {
        let mut ex = exchange();
        let mut tally = Tally::default();
        place(&mut ex, &limit(1, 1, Side::Sell, 0, 10), &mut tally).unwrap();

        assert_eq!(tally.rejections, 1);
        assert!(ex.order_book().is_empty());
    }

    #[test]
    fn short_throughput_run_keeps_the_book_uncrossed() {
        let report = run_throughput_test(Duration::from_millis(50)).unwrap();

        assert!(report.orders > 0);
        assert!(report.trades > 0);
        if let (Some(bid), Some(ask)) = (report.best_bid, report.best_ask) {
            assert!(bid < ask);
        }
    }
}
