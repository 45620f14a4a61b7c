use crate::errors::ServiceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Handle for emitting domain events from services.
///
/// Events are emitted only after the surrounding database transaction has
/// committed; a failed send is the caller's problem to log, never to
/// propagate, so event delivery can never undo a committed movement.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    pub async fn send(&self, event: Event) -> Result<(), ServiceError> {
        self.sender
            .send(event)
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))
    }
}

/// Events emitted by the stock ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    StockMovementRecorded {
        movement_id: Uuid,
        scope_id: Uuid,
        movement_type: String,
        item_id: Uuid,
        from_location_id: Option<Uuid>,
        to_location_id: Option<Uuid>,
        quantity: i64,
        performed_at: DateTime<Utc>,
    },
    InventoryCountReconciled {
        scope_id: Uuid,
        item_id: Uuid,
        location_id: Uuid,
        previous_quantity: i64,
        counted_quantity: i64,
        delta: i64,
        movement_id: Option<Uuid>,
    },
    StockItemCreated(Uuid),
    StockItemDeactivated(Uuid),
    StockLocationCreated(Uuid),
    StockLocationDeactivated(Uuid),
}

/// Consumes events from the channel. Today this only logs; downstream
/// consumers (notifications, audit mirroring) would hang off this task so
/// they stay outside the write path.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("event processor started");
    while let Some(event) = receiver.recv().await {
        match &event {
            Event::StockMovementRecorded {
                movement_id,
                movement_type,
                item_id,
                quantity,
                ..
            } => {
                info!(
                    %movement_id,
                    %movement_type,
                    %item_id,
                    quantity,
                    "stock movement recorded"
                );
            }
            Event::InventoryCountReconciled {
                item_id,
                location_id,
                delta,
                ..
            } => {
                info!(%item_id, %location_id, delta, "inventory count reconciled");
            }
            other => debug!(event = ?other, "event processed"),
        }
    }
    info!("event processor stopped");
}
