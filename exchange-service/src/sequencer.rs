//! Single-writer task that owns the exchange.
//!
//! Handlers never touch the book. They send a [`Command`] over a bounded
//! channel and wait for the reply, so instructions are applied one at a time
//! in arrival order and each frame closes before the next instruction starts.
//! Every committed frame is also broadcast to stream subscribers.

use std::sync::Arc;

use orderbook::{BookError, Exchange, Execution, ExecutionLog, Instruction, LevelSummary, Side};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// One frame of executions, shared between stream subscribers.
pub type Frame = Arc<Vec<Execution>>;

#[derive(Debug, Error)]
pub enum SequencerError {
    #[error("sequencer has stopped")]
    Stopped,
}

/// Read-only view of the book taken between two instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct BookSnapshot {
    pub symbol: String,
    pub open: bool,
    pub best_bid: Option<i64>,
    pub best_ask: Option<i64>,
    pub orders: usize,
    pub bids: Vec<LevelSummary>,
    pub asks: Vec<LevelSummary>,
}

impl BookSnapshot {
    fn capture(exchange: &Exchange, levels: usize) -> Self {
        let book = exchange.order_book();
        Self {
            symbol: book.symbol().to_string(),
            open: book.is_open(),
            best_bid: book.best_bid(),
            best_ask: book.best_ask(),
            orders: book.len(),
            bids: book.depth(Side::Buy, levels),
            asks: book.depth(Side::Sell, levels),
        }
    }
}

pub enum Command {
    Submit {
        instruction: Instruction,
        reply: oneshot::Sender<Frame>,
    },
    Snapshot {
        levels: usize,
        reply: oneshot::Sender<BookSnapshot>,
    },
}

/// Cloneable handle to the sequencer task.
#[derive(Clone)]
pub struct Sequencer {
    commands: mpsc::Sender<Command>,
    frames: broadcast::Sender<Frame>,
}

impl Sequencer {
    /// Moves `exchange` into a new task. The task ends when every handle is
    /// dropped, or with the error if the book's protocol is ever violated.
    pub fn spawn(
        exchange: Exchange,
        queue_capacity: usize,
        broadcast_capacity: usize,
    ) -> (Self, JoinHandle<Result<(), BookError>>) {
        let (commands, rx) = mpsc::channel(queue_capacity.max(1));
        let (frames, _) = broadcast::channel(broadcast_capacity.max(1));
        let task = tokio::spawn(run(exchange, rx, frames.clone()));
        (Self { commands, frames }, task)
    }

    pub async fn submit(&self, instruction: Instruction) -> Result<Frame, SequencerError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Submit { instruction, reply })
            .await
            .map_err(|_| SequencerError::Stopped)?;
        response.await.map_err(|_| SequencerError::Stopped)
    }

    pub async fn snapshot(&self, levels: usize) -> Result<BookSnapshot, SequencerError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Snapshot { levels, reply })
            .await
            .map_err(|_| SequencerError::Stopped)?;
        response.await.map_err(|_| SequencerError::Stopped)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.frames.subscribe()
    }
}

async fn run(
    mut exchange: Exchange,
    mut commands: mpsc::Receiver<Command>,
    frames: broadcast::Sender<Frame>,
) -> Result<(), BookError> {
    info!(symbol = %exchange.order_book().symbol(), "sequencer started");

    while let Some(command) = commands.recv().await {
        match command {
            Command::Submit { instruction, reply } => {
                let mut log = ExecutionLog::new();
                if let Err(e) = exchange.submit(&instruction, &mut log) {
                    error!(error = %e, id = %instruction.id(), "order book protocol violated, stopping sequencer");
                    return Err(e);
                }

                let frame: Frame = Arc::new(log.take_frames().into_iter().flatten().collect());
                debug!(id = %instruction.id(), executions = frame.len(), "frame committed");

                // no subscribers is fine
                let _ = frames.send(frame.clone());
                let _ = reply.send(frame);
            }
            Command::Snapshot { levels, reply } => {
                let _ = reply.send(BookSnapshot::capture(&exchange, levels));
            }
        }
    }

    info!("sequencer stopped");
    Ok(())
}
