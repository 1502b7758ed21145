//! Best-effort lead submission.
//!
//! A lead pairs a favorited product with the shopper's contact so the store
//! can reach out when that product goes on sale. Leads are produced on the
//! request path but delivered on a background task: callers push onto a
//! [`LeadQueue`] without waiting, and [`spawn_lead_worker`] drains the queue
//! into a [`LeadSink`], logging failures. Nothing is retried and nothing is
//! deduplicated.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tienda_core::{Email, Phone, ProductId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One product/contact association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub product_id: ProductId,
    #[serde(rename = "product_title")]
    pub title: String,
    pub email: Option<Email>,
    pub phone: Option<Phone>,
}

/// Errors a lead sink can report.
#[derive(Debug, Error)]
pub enum LeadError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend rejected the lead.
    #[error("Backend rejected lead: {status} - {message}")]
    Rejected { status: u16, message: String },
}

/// Where leads end up.
pub trait LeadSink: Send + Sync + 'static {
    /// Persist one lead.
    fn submit(&self, lead: &Lead) -> impl Future<Output = Result<(), LeadError>> + Send;
}

/// Handle for enqueueing leads. Cheap to clone.
#[derive(Debug, Clone)]
pub struct LeadQueue {
    tx: Option<mpsc::UnboundedSender<Lead>>,
}

impl LeadQueue {
    /// A queue plus the receiving end, for callers that drain it themselves.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Lead>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A queue that drops every lead. Used where no backend is configured.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { tx: None }
    }

    /// Hand a lead to the background worker. Never blocks and never fails
    /// the caller.
    pub fn enqueue(&self, lead: Lead) {
        let Some(tx) = &self.tx else {
            tracing::debug!(product_id = %lead.product_id, "Lead queue disabled, dropping lead");
            return;
        };
        if let Err(e) = tx.send(lead) {
            tracing::warn!(product_id = %e.0.product_id, "Lead worker has stopped, dropping lead");
        }
    }
}

/// Spawn the background task that delivers queued leads to `sink`.
///
/// The task ends once every [`LeadQueue`] clone has been dropped and the
/// queue is drained.
pub fn spawn_lead_worker<K: LeadSink>(sink: K) -> (LeadQueue, JoinHandle<()>) {
    let (queue, rx) = LeadQueue::channel();
    let handle = tokio::spawn(run_worker(sink, rx));
    (queue, handle)
}

async fn run_worker<K: LeadSink>(sink: K, mut rx: mpsc::UnboundedReceiver<Lead>) {
    tracing::info!("Lead worker started");
    while let Some(lead) = rx.recv().await {
        match sink.submit(&lead).await {
            Ok(()) => tracing::debug!(product_id = %lead.product_id, "Lead submitted"),
            Err(e) => tracing::warn!(
                product_id = %lead.product_id,
                error = %e,
                "Lead submission failed"
            ),
        }
    }
    tracing::info!("Lead worker stopped");
}
