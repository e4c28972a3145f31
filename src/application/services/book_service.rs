/// Book Service - Single-writer Matching Worker
///
/// Owns one book and applies commands to it strictly in arrival order. Every
/// other component talks to the book through a cloneable [`BookHandle`], so
/// the book itself never needs a lock.
///
/// ## Architecture
/// - Commands arrive on an unbounded MPSC channel, each carrying a oneshot
///   reply sender
/// - `run()` blocks on the channel and stops once every handle is dropped
/// - New orders are validated before they reach the book
/// - Each command updates the Prometheus metrics and is logged with `tracing`
///
/// ## Usage
/// ```rust
/// use orderbook_engine::application::services::{spawn_book_service, ServiceConfig};
/// use orderbook_engine::domain::orderbook::Orderbook;
/// use orderbook_engine::domain::validation::OrderValidator;
/// use orderbook_engine::shared::protocol::{AddOrderRequest, Side};
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let (handle, worker) = spawn_book_service(
///     Orderbook::new("BTC", "USD"),
///     OrderValidator::new(),
///     ServiceConfig::default(),
/// )
/// .unwrap();
///
/// let report = rt
///     .block_on(handle.add_order(AddOrderRequest { order_id: 1, side: Side::Bid, price: 100, quantity: 5 }))
///     .unwrap();
/// assert!(report.resting);
///
/// drop(handle);
/// let book = worker.join().unwrap();
/// assert_eq!(book.best_bid(), Some(100));
/// ```

use crate::domain::errors::OrderbookError;
use crate::domain::orderbook::MatchingBook;
use crate::domain::validation::{OrderValidator, ValidationError};
use crate::shared::metrics::METRICS;
use crate::shared::protocol::{
    AddOrderRequest, AmendOrderRequest, BookSnapshot, ErrorCode, OrderId, OrderReport,
};
use std::io;
use std::thread;
use std::time::Instant;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Errors a caller of the book service can observe
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// The request failed validation and never reached the book.
    #[error("order rejected: {0}")]
    Rejected(#[from] ValidationError),

    #[error(transparent)]
    Book(#[from] OrderbookError),

    /// The worker thread has stopped.
    #[error("book service unavailable")]
    Unavailable,
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Rejected(_) => ErrorCode::InvalidOrder,
            ServiceError::Book(e) => e.code(),
            ServiceError::Unavailable => ErrorCode::Unavailable,
        }
    }
}

type Reply<T> = oneshot::Sender<Result<T, ServiceError>>;

/// Commands the book service can receive
#[derive(Debug)]
pub enum BookCommand {
    AddOrder {
        request: AddOrderRequest,
        reply: Reply<OrderReport>,
    },
    CancelOrder {
        order_id: OrderId,
        reply: Reply<()>,
    },
    AmendOrder {
        request: AmendOrderRequest,
        reply: Reply<()>,
    },
    Snapshot {
        levels: usize,
        reply: oneshot::Sender<BookSnapshot>,
    },
}

/// Worker thread settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub thread_name: String,

    /// Core to pin the worker to. Only honoured with the `cpu-affinity` feature.
    pub core_id: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            thread_name: "book-service".to_string(),
            core_id: None,
        }
    }
}

/// Single-writer book service
///
/// # Type Parameters
/// * `B` - book implementation (must implement `MatchingBook`)
pub struct BookService<B: MatchingBook> {
    book: B,
    validator: OrderValidator,
    commands: UnboundedReceiver<BookCommand>,
    symbol: String,
}

impl<B: MatchingBook> BookService<B> {
    pub fn new(book: B, validator: OrderValidator, commands: UnboundedReceiver<BookCommand>) -> Self {
        let symbol = book.symbol().to_string();
        Self {
            book,
            validator,
            commands,
            symbol,
        }
    }

    /// Creates a service together with a handle connected to it.
    pub fn channel(book: B, validator: OrderValidator) -> (Self, BookHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(book, validator, rx), BookHandle::new(tx))
    }

    pub fn book(&self) -> &B {
        &self.book
    }

    /// Processes commands until every handle is dropped, then returns the book.
    ///
    /// Blocks the calling thread; run it on a dedicated OS thread, never
    /// inside an async task.
    pub fn run(mut self) -> B {
        info!(symbol = %self.symbol, "book service started");
        METRICS.record_book_state(&self.book);
        while let Some(command) = self.commands.blocking_recv() {
            self.handle(command);
        }
        info!(symbol = %self.symbol, resting = self.book.resting_orders(), "book service stopped");
        self.book
    }

    /// Applies a single command and sends its reply.
    pub fn handle(&mut self, command: BookCommand) {
        let start = Instant::now();
        let operation = match command {
            BookCommand::AddOrder { request, reply } => {
                let result = self.process_add(request);
                if reply.send(result).is_err() {
                    debug!("add reply dropped, caller went away");
                }
                "add"
            }
            BookCommand::CancelOrder { order_id, reply } => {
                let result = self.process_cancel(order_id);
                if reply.send(result).is_err() {
                    debug!("cancel reply dropped, caller went away");
                }
                "cancel"
            }
            BookCommand::AmendOrder { request, reply } => {
                let result = self.process_amend(request);
                if reply.send(result).is_err() {
                    debug!("amend reply dropped, caller went away");
                }
                "amend"
            }
            BookCommand::Snapshot { levels, reply } => {
                let _ = reply.send(self.book.snapshot(levels));
                "snapshot"
            }
        };

        METRICS
            .operation_duration
            .with_label_values(&[self.symbol.as_str(), operation])
            .observe(start.elapsed().as_secs_f64() * 1_000_000.0);
        if operation != "snapshot" {
            METRICS.record_book_state(&self.book);
        }
    }

    fn process_add(&mut self, request: AddOrderRequest) -> Result<OrderReport, ServiceError> {
        let kind = if request.price == 0 { "market" } else { "limit" };
        METRICS
            .orders_total
            .with_label_values(&[self.symbol.as_str(), request.side.as_str(), kind])
            .inc();

        if let Err(e) = self.validator.validate_add(&request) {
            warn!(order_id = request.order_id, error = %e, "order rejected by validation");
            METRICS.record_rejection(&self.symbol, "add", ErrorCode::InvalidOrder);
            return Err(e.into());
        }

        let order = self
            .book
            .add_order(request.order_id, request.side, request.price, request.quantity)
            .map_err(|e| self.book_rejection("add", request.order_id, e))?;

        if order.filled_qty() > 0 {
            METRICS
                .matched_quantity_total
                .with_label_values(&[self.symbol.as_str(), request.side.as_str()])
                .inc_by(order.filled_qty() as f64);
        }
        debug!(
            order_id = order.id(),
            side = order.side().as_str(),
            price = order.price(),
            qty = order.qty(),
            filled = order.filled_qty(),
            resting = order.is_resting(),
            "order processed"
        );
        Ok(order.to_report())
    }

    fn process_cancel(&mut self, order_id: OrderId) -> Result<(), ServiceError> {
        self.book
            .cancel_order(order_id)
            .map_err(|e| self.book_rejection("cancel", order_id, e))?;
        METRICS.cancellations_total.with_label_values(&[self.symbol.as_str()]).inc();
        debug!(order_id, "order cancelled");
        Ok(())
    }

    fn process_amend(&mut self, request: AmendOrderRequest) -> Result<(), ServiceError> {
        if let Err(e) = self.validator.validate_amend(&request) {
            warn!(order_id = request.order_id, error = %e, "amend rejected by validation");
            METRICS.record_rejection(&self.symbol, "amend", ErrorCode::InvalidOrder);
            return Err(e.into());
        }

        self.book
            .amend_order(request.order_id, request.quantity)
            .map_err(|e| self.book_rejection("amend", request.order_id, e))?;
        METRICS.amendments_total.with_label_values(&[self.symbol.as_str()]).inc();
        debug!(order_id = request.order_id, qty = request.quantity, "order amended");
        Ok(())
    }

    fn book_rejection(&self, operation: &str, order_id: OrderId, error: OrderbookError) -> ServiceError {
        warn!(order_id, operation, error = %error, "book rejected operation");
        METRICS.record_rejection(&self.symbol, operation, error.code());
        ServiceError::Book(error)
    }
}

/// Cloneable async front end of a running [`BookService`]
#[derive(Debug, Clone)]
pub struct BookHandle {
    commands: UnboundedSender<BookCommand>,
}

impl BookHandle {
    pub fn new(commands: UnboundedSender<BookCommand>) -> Self {
        Self { commands }
    }

    pub async fn add_order(&self, request: AddOrderRequest) -> Result<OrderReport, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(BookCommand::AddOrder { request, reply })?;
        rx.await.map_err(|_| ServiceError::Unavailable)?
    }

    pub async fn cancel_order(&self, order_id: OrderId) -> Result<(), ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(BookCommand::CancelOrder { order_id, reply })?;
        rx.await.map_err(|_| ServiceError::Unavailable)?
    }

    pub async fn amend_order(&self, request: AmendOrderRequest) -> Result<(), ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(BookCommand::AmendOrder { request, reply })?;
        rx.await.map_err(|_| ServiceError::Unavailable)?
    }

    /// Top `levels` levels per side.
    pub async fn snapshot(&self, levels: usize) -> Result<BookSnapshot, ServiceError> {
        let (reply, rx) = oneshot::channel();
        self.send(BookCommand::Snapshot { levels, reply })?;
        rx.await.map_err(|_| ServiceError::Unavailable)
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    fn send(&self, command: BookCommand) -> Result<(), ServiceError> {
        self.commands.send(command).map_err(|_| ServiceError::Unavailable)
    }
}

/// Starts a book service on its own named OS thread.
///
/// The join handle yields the book back once every handle has been dropped.
pub fn spawn_book_service<B>(
    book: B,
    validator: OrderValidator,
    config: ServiceConfig,
) -> io::Result<(BookHandle, thread::JoinHandle<B>)>
where
    B: MatchingBook + Send + 'static,
{
    let (service, handle) = BookService::channel(book, validator);
    let core_id = config.core_id;
    let worker = thread::Builder::new()
        .name(config.thread_name)
        .spawn(move || {
            pin_to_core(core_id);
            service.run()
        })?;
    Ok((handle, worker))
}

fn pin_to_core(core_id: Option<usize>) {
    #[cfg(feature = "cpu-affinity")]
    {
        if let Some(id) = core_id {
            match core_affinity::get_core_ids() {
                Some(core_ids) if id < core_ids.len() => {
                    if core_affinity::set_for_current(core_ids[id]) {
                        info!(core = id, "book service pinned");
                    } else {
                        warn!(core = id, "failed to pin book service");
                    }
                }
                _ => warn!(core = id, "core not available, running unpinned"),
            }
        }
    }

    #[cfg(not(feature = "cpu-affinity"))]
    {
        if let Some(id) = core_id {
            warn!(core = id, "built without cpu-affinity, ignoring core pin");
        }
    }
}
