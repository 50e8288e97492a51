//! Best-effort audit trail.
//!
//! Delivery is at-most-once: `dispatch` never blocks the caller, a full queue
//! drops the entry, and a failed write is logged and counted but not retried.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::models::AuditEntry;
use crate::services::metrics::record_audit;
use crate::services::store::AuditSink;

#[derive(Clone)]
pub struct AuditRecorder {
    sender: mpsc::Sender<AuditEntry>,
}

impl AuditRecorder {
    /// Start the single writer task. It exits once `shutdown` fires and the
    /// queue has been drained, or when every recorder handle is dropped.
    pub fn spawn(
        sink: Arc<dyn AuditSink>,
        capacity: usize,
        shutdown: CancellationToken,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(run_writer(sink, receiver, shutdown));
        (Self { sender }, handle)
    }

    pub fn dispatch(&self, entry: AuditEntry) {
        let partner_id = entry.partner_id;
        if let Err(e) = self.sender.try_send(entry) {
            let reason = match e {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "queue closed",
            };
            tracing::warn!(partner_id = %partner_id, reason, "Audit entry dropped");
            record_audit("dropped");
        }
    }
}

async fn run_writer(
    sink: Arc<dyn AuditSink>,
    mut receiver: mpsc::Receiver<AuditEntry>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                receiver.close();
                while let Some(entry) = receiver.recv().await {
                    persist(sink.as_ref(), entry).await;
                }
                tracing::info!("Audit writer drained and stopped");
                break;
            }
            entry = receiver.recv() => {
                match entry {
                    Some(entry) => persist(sink.as_ref(), entry).await,
                    None => {
                        tracing::info!("Audit channel closed, writer exiting");
                        break;
                    }
                }
            }
        }
    }
}

async fn persist(sink: &dyn AuditSink, entry: AuditEntry) {
    match sink.record(&entry).await {
        Ok(()) => record_audit("persisted"),
        Err(e) => {
            tracing::warn!(
                audit_id = %entry.id,
                partner_id = %entry.partner_id,
                error = %e,
                "Failed to persist audit entry"
            );
            record_audit("failed");
        }
    }
}
