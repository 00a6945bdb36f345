use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use orderbook::{
    CancelOrder, Exchange, Execution, ExecutionCallback, FixedClock, Instrument, PlaceOrder, Side, TimeInForce,
};

const SYMBOL: &str = "XBT.USD";

/// Swallows executions so only the engine is measured.
struct Discard;

impl ExecutionCallback for Discard {
    fn notify(&mut self, execution: Execution) {
        black_box(execution);
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

fn populated(depth: i64) -> Exchange {
    let mut exchange = exchange();
    for i in 0..depth {
        let ask = limit(i as u64, 1, Side::Sell, 10_000 + i, 100);
        exchange.place_order(&ask, &mut Discard).unwrap();
        let bid = limit((i + depth) as u64, 1, Side::Buy, 9_999 - i, 100);
        exchange.place_order(&bid, &mut Discard).unwrap();
    }
    exchange
}

fn bench_order_submission(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_submission");

    for &num_orders in [100u64, 1_000, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::new("non_crossing_orders", num_orders),
            &num_orders,
            |b, &num_orders| {
                b.iter(|| {
                    let mut exchange = exchange();
                    for i in 0..num_orders {
                        let order = if i % 2 == 0 {
                            limit(i, 1, Side::Buy, 10_000 - i as i64, 100)
                        } else {
                            limit(i, 1, Side::Sell, 10_100 + i as i64, 100)
                        };
                        black_box(exchange.place_order(&order, &mut Discard)).unwrap();
                    }
                })
            },
        );
    }

    group.finish();
}

fn bench_order_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("order_matching");

    for &depth in [10i64, 100, 1_000].iter() {
        group.bench_with_input(BenchmarkId::new("crossing_sweep", depth), &depth, |b, &depth| {
            b.iter_batched(
                || populated(depth),
                |mut exchange| {
                    let crossing = limit((depth * 2) as u64, 2, Side::Buy, 10_000 + depth, depth * 50);
                    black_box(exchange.place_order(&crossing, &mut Discard)).unwrap();
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_market_data_access(c: &mut Criterion) {
    let mut group = c.benchmark_group("market_data");
    let exchange = populated(1_000);
    let book = exchange.order_book();

    group.bench_function("best_bid", |b| b.iter(|| black_box(book.best_bid())));
    group.bench_function("best_ask", |b| b.iter(|| black_box(book.best_ask())));
    group.bench_function("depth_10", |b| b.iter(|| black_box(book.depth(Side::Buy, 10))));

    group.finish();
}

fn bench_order_cancellation(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancellation");

    for &num_orders in [100u64, 1_000].iter() {
        group.bench_with_input(
            BenchmarkId::new("cancel_same_level", num_orders),
            &num_orders,
            |b, &num_orders| {
                b.iter_batched(
                    || {
                        let mut exchange = exchange();
                        for i in 0..num_orders {
                            let order = limit(i, 1, Side::Buy, 10_000, 100);
                            exchange.place_order(&order, &mut Discard).unwrap();
                        }
                        exchange
                    },
                    |mut exchange| {
                        // every other order, leaving holes mid-queue
                        for i in (0..num_orders).step_by(2) {
                            let cancel = CancelOrder {
                                symbol: SYMBOL.to_string(),
                                id: format!("c{i}"),
                                attribution_id: 1,
                                cancel_id: i.to_string(),
                            };
                            black_box(exchange.cancel_order(&cancel, &mut Discard)).unwrap();
                        }
                    },
                    criterion::BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_high_frequency_scenario(c: &mut Criterion) {
    let mut group = c.benchmark_group("hft_scenario");

    group.bench_function("rapid_order_flow", |b| {
        b.iter(|| {
            let mut exchange = exchange();
            let mut order_id = 1u64;

            for _ in 0..100 {
                for i in 0..5 {
                    let ask = limit(order_id, 1, Side::Sell, 10_000 + i, 100);
                    order_id += 1;
                    exchange.place_order(&ask, &mut Discard).unwrap();

                    let bid = limit(order_id, 1, Side::Buy, 9_999 - i, 100);
                    order_id += 1;
                    exchange.place_order(&bid, &mut Discard).unwrap();
                }

                let crossing = limit(order_id, 2, Side::Buy, 10_002, 300);
                order_id += 1;
                black_box(exchange.place_order(&crossing, &mut Discard)).unwrap();

                black_box(exchange.order_book().best_bid());
                black_box(exchange.order_book().best_ask());
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_order_submission,
    bench_order_matching,
    bench_market_data_access,
    bench_order_cancellation,
    bench_high_frequency_scenario
);

criterion_main!(benches);
