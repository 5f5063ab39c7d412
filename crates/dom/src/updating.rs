use anyhow::{Error, anyhow};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

use crate::NodeKey;

/// A batchable mutation of the display surface.
///
/// Nodes are created detached and only become part of the visible tree once an
/// `AppendChild` links them under an attached parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op")]
pub enum DOMUpdate {
    CreateElement { node: NodeKey, tag: String },
    CreateText { node: NodeKey, text: String },
    SetAttr { node: NodeKey, name: String, value: String },
    RemoveAttr { node: NodeKey, name: String },
    SetText { node: NodeKey, text: String },
    AddListener { node: NodeKey, event: String },
    RemoveListener { node: NodeKey, event: String },
    AppendChild { parent: NodeKey, child: NodeKey },
    RemoveChild { parent: NodeKey, child: NodeKey },
}

impl DOMUpdate {
    /// The node this update mutates (the parent for structural updates).
    pub const fn target(&self) -> NodeKey {
        match self {
            Self::CreateElement { node, .. }
            | Self::CreateText { node, .. }
            | Self::SetAttr { node, .. }
            | Self::RemoveAttr { node, .. }
            | Self::SetText { node, .. }
            | Self::AddListener { node, .. }
            | Self::RemoveListener { node, .. } => *node,
            Self::AppendChild { parent, .. } | Self::RemoveChild { parent, .. } => *parent,
        }
    }
}

/// A subscriber that receives `DOMUpdate` values and mirrors them into its own state.
pub trait DOMSubscriber {
    /// Apply a single `DOMUpdate` to the subscriber state.
    ///
    /// # Errors
    /// Returns an error if the update references nodes the subscriber does not know.
    fn apply_update(&mut self, update: DOMUpdate) -> Result<(), Error>;
}

/// Generic mirror that applies committed batches coming off a broadcast channel.
pub struct DOMMirror<T: DOMSubscriber> {
    in_updater: broadcast::Receiver<Vec<DOMUpdate>>,
    mirror: T,
}

impl<T: DOMSubscriber> DOMMirror<T> {
    pub const fn new(in_updater: broadcast::Receiver<Vec<DOMUpdate>>, mirror: T) -> Self {
        Self { in_updater, mirror }
    }

    /// Drain and apply all pending batches, waiting for none.
    ///
    /// # Errors
    /// Returns an error if the channel closed or the mirror rejected an update.
    pub fn try_update_sync(&mut self) -> Result<usize, Error> {
        let mut applied = 0;
        loop {
            match self.in_updater.try_recv() {
                Ok(batch) => {
                    for update in batch {
                        self.mirror.apply_update(update)?;
                    }
                    applied += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Lagged(skipped)) => {
                    return Err(anyhow!("Mirror lagged behind by {skipped} batches"));
                }
                Err(TryRecvError::Closed) => {
                    return Err(anyhow!("Recv channel was closed while mirroring"));
                }
            }
        }
        Ok(applied)
    }

    /// Wait for the next batch and apply it.
    ///
    /// # Errors
    /// Returns an error if the channel closed or the mirror rejected an update.
    pub async fn update(&mut self) -> Result<(), Error> {
        let batch = self
            .in_updater
            .recv()
            .await
            .map_err(|err| anyhow!("Mirror channel failed: {err}"))?;
        for update in batch {
            self.mirror.apply_update(update)?;
        }
        Ok(())
    }

    /// Access the inner mirror immutably.
    pub const fn mirror(&self) -> &T {
        &self.mirror
    }
}
