use crate::models::{DayId, UpdateRequest};
use crate::notify::Notifier;
use crate::page::{Document, NodeId};
use crate::status::{next_status, Status};
use crate::sync::{StatusApi, SyncError};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Shown when the server rejects an update without saying why.
pub const FALLBACK_MESSAGE: &str = "update failed";

/// Most recent click faults kept for [`CalendarView::teardown`]; older ones
/// are only counted.
pub const RECENT_FAULTS: usize = 16;

pub type SharedDocument = Arc<Mutex<Document>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    pub target: NodeId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The click did not land inside a day cell.
    Ignored,
    Updated { day_id: DayId, status: Status },
    Rejected { day_id: DayId, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    #[error("click listener is no longer running")]
    Closed,

    #[error("click listener failed: {0}")]
    Listener(String),
}

/// Turns a click on a day cell into a status transition on the server and,
/// once confirmed, on the cell.
pub struct StatusCycler<A, N> {
    api: A,
    notifier: N,
}

impl<A: StatusApi, N: Notifier> StatusCycler<A, N> {
    pub fn new(api: A, notifier: N) -> Self {
        Self { api, notifier }
    }

    /// Transport and decode faults are returned as-is: they are neither
    /// shown to the user nor applied to the cell.
    pub async fn handle_click(
        &self,
        document: &SharedDocument,
        event: ClickEvent,
    ) -> Result<ClickOutcome, SyncError> {
        let (node, cell) = {
            let document = document.lock().await;
            let Some(node) = document.closest_cell(event.target) else {
                return Ok(ClickOutcome::Ignored);
            };
            let Some(cell) = document.cell(node).cloned() else {
                warn!(
                    raw_id = document.malformed_id(node).unwrap_or_default(),
                    "click on a day cell without a numeric id"
                );
                return Ok(ClickOutcome::Ignored);
            };
            (node, cell)
        };

        let status = next_status(cell.status);
        let request = UpdateRequest {
            day_id: cell.day_id,
            status,
        };
        debug!(day_id = %cell.day_id, %status, "sending status update");

        let response = self.api.update_status(&request).await?;

        if response.ok {
            document.lock().await.set_status(node, status);
            info!(day_id = %cell.day_id, %status, "day status updated");
            Ok(ClickOutcome::Updated {
                day_id: cell.day_id,
                status,
            })
        } else {
            let message = response
                .error
                .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
            self.notifier.alert(&message);
            Ok(ClickOutcome::Rejected {
                day_id: cell.day_id,
                message,
            })
        }
    }
}

/// Calendar page controller. Owns the page's click subscription; dropping
/// the view stops listening for clicks.
pub struct CalendarView<A, N> {
    document: SharedDocument,
    subscription: ClickSubscription,
    cycler: Arc<StatusCycler<A, N>>,
}

impl<A, N> CalendarView<A, N>
where
    A: StatusApi + 'static,
    N: Notifier + 'static,
{
    /// Must be called from within a tokio runtime.
    pub fn mount(document: Document, api: A, notifier: N) -> Self {
        let document = Arc::new(Mutex::new(document));
        let cycler = Arc::new(StatusCycler::new(api, notifier));
        let subscription = ClickSubscription::start(Arc::clone(&document), Arc::clone(&cycler));
        Self {
            document,
            subscription,
            cycler,
        }
    }

    pub fn document(&self) -> SharedDocument {
        Arc::clone(&self.document)
    }

    pub fn cycler(&self) -> &StatusCycler<A, N> {
        &self.cycler
    }

    pub fn click(&self, target: NodeId) -> Result<(), ViewError> {
        self.subscription.dispatch(ClickEvent { target })
    }

    /// Stops listening and waits for clicks already in flight. Reports the
    /// faults clicks ran into over the view's lifetime.
    pub async fn teardown(self) -> Result<ClickFaults, ViewError> {
        self.subscription.close().await
    }
}

/// Faults raised by clicks handled in the background.
#[derive(Debug, Default)]
pub struct ClickFaults {
    pub total: usize,
    /// Up to [`RECENT_FAULTS`] of the latest faults, oldest first.
    pub recent: VecDeque<SyncError>,
}

impl ClickFaults {
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    fn record(&mut self, fault: SyncError) {
        self.total += 1;
        if self.recent.len() == RECENT_FAULTS {
            self.recent.pop_front();
        }
        self.recent.push_back(fault);
    }
}

/// Document-level click listener. Each click runs as its own task; clicks on
/// the same cell are neither de-duplicated nor ordered.
pub struct ClickSubscription {
    sender: Option<mpsc::UnboundedSender<ClickEvent>>,
    listener: Option<JoinHandle<ClickFaults>>,
}

impl ClickSubscription {
    pub fn start<A, N>(document: SharedDocument, cycler: Arc<StatusCycler<A, N>>) -> Self
    where
        A: StatusApi + 'static,
        N: Notifier + 'static,
    {
        let (sender, events) = mpsc::unbounded_channel();
        let listener = tokio::spawn(listen(document, cycler, events));
        Self {
            sender: Some(sender),
            listener: Some(listener),
        }
    }

    pub fn dispatch(&self, event: ClickEvent) -> Result<(), ViewError> {
        let sender = self.sender.as_ref().ok_or(ViewError::Closed)?;
        sender.send(event).map_err(|_| ViewError::Closed)
    }

    pub async fn close(mut self) -> Result<ClickFaults, ViewError> {
        self.sender.take();
        let listener = self.listener.take().ok_or(ViewError::Closed)?;
        listener
            .await
            .map_err(|err| ViewError::Listener(err.to_string()))
    }
}

impl Drop for ClickSubscription {
    fn drop(&mut self) {
        // Clicks already spawned keep running; only the listener stops.
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
    }
}

type ClickTask = JoinHandle<Result<ClickOutcome, SyncError>>;

async fn listen<A, N>(
    document: SharedDocument,
    cycler: Arc<StatusCycler<A, N>>,
    mut events: mpsc::UnboundedReceiver<ClickEvent>,
) -> ClickFaults
where
    A: StatusApi + 'static,
    N: Notifier + 'static,
{
    let mut faults = ClickFaults::default();
    let mut in_flight: Vec<ClickTask> = Vec::new();

    while let Some(event) = events.recv().await {
        let (finished, pending): (Vec<_>, Vec<_>) =
            in_flight.into_iter().partition(|task| task.is_finished());
        in_flight = pending;
        for task in finished {
            collect(task, &mut faults).await;
        }

        let document = Arc::clone(&document);
        let cycler = Arc::clone(&cycler);
        in_flight.push(tokio::spawn(async move {
            let result = cycler.handle_click(&document, event).await;
            if let Err(err) = &result {
                error!("unhandled click failure: {err}");
            }
            result
        }));
    }

    for task in in_flight {
        collect(task, &mut faults).await;
    }
    faults
}

async fn collect(task: ClickTask, faults: &mut ClickFaults) {
    match task.await {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => faults.record(err),
        Err(err) => error!("click task aborted: {err}"),
    }
}
