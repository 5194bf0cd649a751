//! In-process adapter: join a `Hub` without a network hop.

use tokio::sync::mpsc;
use tracing::debug;

use super::{Hub, Subscription};

/// Join `hub` and return a subscription bound to it.
///
/// A forwarding task feeds outbound frames into the hub and leaves the
/// channel once the subscription's sender side is dropped.
pub async fn connect(hub: &Hub) -> Subscription {
    let (client_id, inbound) = hub.join().await;
    let (outbound_tx, mut outbound_rx) = mpsc::channel(hub.client_buffer());

    let hub = hub.clone();
    tokio::spawn(async move {
        while let Some(frame) = outbound_rx.recv().await {
            // Rejections are already reported back on the inbound queue.
            let _ = hub.handle(client_id, frame).await;
        }
        debug!(%client_id, "memory: subscription dropped");
        hub.leave(client_id).await;
    });

    Subscription::new(outbound_tx, inbound)
}

#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;
