use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Handle for publishing domain events from services.
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Domain events emitted after state changes commit. Delivery is advisory:
/// a dropped event never rolls back the write that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Sale events
    SaleCreated(Uuid),
    SaleStatusChanged {
        sale_id: Uuid,
        old_status: String,
        new_status: String,
    },
    SaleCancelled(Uuid),

    // Purchase events
    PurchaseCreated(Uuid),
    PurchaseReceived(Uuid),
    PurchaseStatusChanged {
        purchase_id: Uuid,
        old_status: String,
        new_status: String,
    },

    // Stock events
    StockAdjusted {
        product_id: Uuid,
        delta: i32,
        new_quantity: i32,
    },

    // Catalog and registry events
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),
    CustomerCreated(Uuid),
    CustomerUpdated(Uuid),
    CustomerDeleted(Uuid),
    SupplierCreated(Uuid),
    SupplierUpdated(Uuid),
    SupplierDeleted(Uuid),
}

/// Drains the event channel and logs each event. Runs as a background task
/// for the lifetime of the process; exits when every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::StockAdjusted {
                product_id,
                delta,
                new_quantity,
            } => {
                if new_quantity == 0 {
                    warn!(%product_id, delta, "Stock adjusted to zero, product is out of stock");
                } else {
                    info!(%product_id, delta, new_quantity, "Stock adjusted");
                }
            }
            Event::SaleStatusChanged {
                sale_id,
                ref old_status,
                ref new_status,
            } => {
                info!(%sale_id, old_status, new_status, "Sale status changed");
            }
            Event::PurchaseStatusChanged {
                purchase_id,
                ref old_status,
                ref new_status,
            } => {
                info!(%purchase_id, old_status, new_status, "Purchase status changed");
            }
            other => {
                info!(event = ?other, "Event received");
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event_to_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let id = Uuid::new_v4();
        sender
            .send(Event::SaleCreated(id))
            .await
            .expect("channel open");

        match rx.recv().await {
            Some(Event::SaleCreated(got)) => assert_eq!(got, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_fails_after_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        let result = sender.send(Event::ProductCreated(Uuid::new_v4())).await;
        assert!(result.is_err());
    }
}
