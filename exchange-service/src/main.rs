use anyhow::Context;
use axum::{
    extract::{Path, Query, State, WebSocketUpgrade},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use clap::Parser;
use orderbook::units::ticks_to_decimal;
use orderbook::{
    CancelOrder, CancelReplaceOrder, Clock, Exchange, Instruction, Instrument, OrderStatus, PlaceOrder, SystemClock,
};
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod error;
mod sequencer;
mod types;
mod websocket;

use error::AppError;
use sequencer::Sequencer;
use types::*;

/// Order entry gateway for a single instrument's matching engine.
#[derive(Parser, Debug)]
#[command(name = "exchange-service", version)]
struct Config {
    /// Address to listen on
    #[arg(long, env = "MATCHX_BIND", default_value = "0.0.0.0:8080")]
    bind: SocketAddr,

    /// Instrument traded by this gateway
    #[arg(long, env = "MATCHX_SYMBOL", default_value = "XBT.USD")]
    symbol: String,

    /// Price increment, in ticks
    #[arg(long, env = "MATCHX_TICK_SIZE", default_value_t = 1)]
    tick_size: i64,

    /// Quantity increment, in lots
    #[arg(long, env = "MATCHX_LOT_SIZE", default_value_t = 1)]
    lot_size: i64,

    /// Instructions that may wait for the sequencer before senders block
    #[arg(long, env = "MATCHX_QUEUE_CAPACITY", default_value_t = 1024)]
    queue_capacity: usize,

    /// Frames buffered per stream subscriber before it starts lagging
    #[arg(long, env = "MATCHX_BROADCAST_CAPACITY", default_value_t = 1024)]
    broadcast_capacity: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    let instrument = Instrument::new(config.symbol.clone(), config.tick_size, config.lot_size);
    let mut exchange = Exchange::new(instrument);
    exchange.open();

    let (sequencer, task) = Sequencer::spawn(exchange, config.queue_capacity, config.broadcast_capacity);
    tokio::spawn(async move {
        match task.await {
            Ok(Ok(())) => info!("sequencer finished"),
            Ok(Err(e)) => error!(error = %e, "sequencer failed, order entry unavailable"),
            Err(e) => error!(error = %e, "sequencer task aborted"),
        }
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;

    info!(bind = %config.bind, symbol = %config.symbol, "exchange service starting");
    info!("  GET    /health");
    info!("  GET    /book");
    info!("  GET    /book/depth?levels=");
    info!("  POST   /symbols/:symbol/orders");
    info!("  PUT    /symbols/:symbol/orders/:cancel_id");
    info!("  DELETE /symbols/:symbol/orders/:cancel_id?id=&attribution_id=");
    info!("  GET    /symbols/:symbol/orders/:status_id?id=&attribution_id=");
    info!("  WS     /executions/stream");

    axum::serve(listener, router(sequencer)).await.context("server error")?;
    Ok(())
}

fn router(sequencer: Sequencer) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/book", get(get_book))
        .route("/book/depth", get(get_depth))
        .route("/symbols/:symbol/orders", post(place_order))
        .route(
            "/symbols/:symbol/orders/:order_id",
            put(replace_order).delete(cancel_order).get(order_status),
        )
        .route("/executions/stream", get(execution_stream))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(sequencer)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "matchx-exchange",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": SystemClock.now_millis(),
    }))
}

async fn get_book(State(sequencer): State<Sequencer>) -> Result<Json<BookResponse>, AppError> {
    let snapshot = sequencer.snapshot(0).await?;
    Ok(Json(BookResponse {
        symbol: snapshot.symbol,
        open: snapshot.open,
        best_bid: snapshot.best_bid.map(ticks_to_decimal),
        best_ask: snapshot.best_ask.map(ticks_to_decimal),
        orders: snapshot.orders,
    }))
}

async fn get_depth(
    Query(params): Query<DepthQuery>,
    State(sequencer): State<Sequencer>,
) -> Result<Json<DepthResponse>, AppError> {
    let snapshot = sequencer.snapshot(params.levels.unwrap_or(10)).await?;
    Ok(Json(DepthResponse {
        symbol: snapshot.symbol,
        bids: snapshot.bids.iter().map(PriceLevel::from).collect(),
        asks: snapshot.asks.iter().map(PriceLevel::from).collect(),
    }))
}

async fn submit(sequencer: &Sequencer, instruction: Instruction) -> Result<Json<FrameResponse>, AppError> {
    let frame = sequencer.submit(instruction).await?;
    Ok(Json(FrameResponse::from(frame.as_slice())))
}

async fn place_order(
    Path(symbol): Path<String>,
    State(sequencer): State<Sequencer>,
    Json(request): Json<PlaceOrderRequest>,
) -> Result<Json<FrameResponse>, AppError> {
    let instruction = Instruction::Place(PlaceOrder {
        symbol,
        id: request.id,
        attribution_id: request.attribution_id,
        side: request.side,
        price: price_ticks(request.price)?,
        quantity: quantity_lots(request.quantity)?,
        time_in_force: request.time_in_force,
    });
    submit(&sequencer, instruction).await
}

async fn replace_order(
    Path((symbol, cancel_id)): Path<(String, String)>,
    State(sequencer): State<Sequencer>,
    Json(request): Json<ReplaceOrderRequest>,
) -> Result<Json<FrameResponse>, AppError> {
    let instruction = Instruction::CancelReplace(CancelReplaceOrder {
        symbol,
        id: request.id,
        attribution_id: request.attribution_id,
        cancel_id,
        price: price_ticks(request.price)?,
        quantity: quantity_lots(request.quantity)?,
    });
    submit(&sequencer, instruction).await
}

async fn cancel_order(
    Path((symbol, cancel_id)): Path<(String, String)>,
    Query(query): Query<InstructionQuery>,
    State(sequencer): State<Sequencer>,
) -> Result<Json<FrameResponse>, AppError> {
    let instruction = Instruction::Cancel(CancelOrder {
        symbol,
        id: query.id,
        attribution_id: query.attribution_id,
        cancel_id,
    });
    submit(&sequencer, instruction).await
}

async fn order_status(
    Path((symbol, status_id)): Path<(String, String)>,
    Query(query): Query<InstructionQuery>,
    State(sequencer): State<Sequencer>,
) -> Result<Json<FrameResponse>, AppError> {
    let instruction = Instruction::Status(OrderStatus {
        symbol,
        id: query.id,
        attribution_id: query.attribution_id,
        status_id,
    });
    submit(&sequencer, instruction).await
}

async fn execution_stream(ws: WebSocketUpgrade, State(sequencer): State<Sequencer>) -> Response {
    ws.on_upgrade(move |socket| websocket::handle_execution_stream(socket, sequencer))
}
