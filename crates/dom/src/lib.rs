#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]
#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Inlining decisions left to compiler for this crate"
)]

//! In-memory display surface driven by batched `DOMUpdate` messages.
//!
//! The document is an arena of nodes addressed by stable `NodeKey`s. Producers
//! (the reconciler's host adapter) mint keys and emit updates; the `Document`
//! applies them, and any number of mirrors can follow along through a
//! broadcast channel.

use serde::Serialize;

pub mod document;
pub mod printing;
pub mod updating;

pub use document::{DOMNode, Document, NodeKind};
pub use updating::{DOMMirror, DOMSubscriber, DOMUpdate};

/// A 64-bit stable key for DOM nodes used to correlate batched updates.
///
/// The default key is the document root.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, PartialOrd, Ord, Serialize)]
pub struct NodeKey(pub u64);

impl NodeKey {
    /// The document root key (always present).
    pub const ROOT: Self = Self(0);

    /// Pack a producer shard and a counter into one key.
    #[inline]
    pub fn pack(shard: u8, counter: u64) -> Self {
        let low = counter & ((1u64 << 40) - 1);
        Self((u64::from(shard) << 40) | low)
    }

    /// Extract the producer shard from the key.
    #[inline]
    pub const fn shard(self) -> u8 {
        ((self.0 >> 40) & 0xFF) as u8
    }

    /// Extract the counter from the key.
    #[inline]
    pub const fn counter(self) -> u64 {
        self.0 & ((1u64 << 40) - 1)
    }
}

/// Mints fresh `NodeKey`s for one producer shard.
#[derive(Clone, Debug)]
pub struct NodeKeyManager {
    shard: u8,
    counter: u64,
}

impl NodeKeyManager {
    /// Create a manager for the given shard. Shard 0 is reserved for the root.
    pub const fn new(shard: u8) -> Self {
        let shard = if shard == 0 { 1 } else { shard };
        Self { shard, counter: 1 }
    }

    /// Mint the next key.
    #[inline]
    pub fn mint(&mut self) -> NodeKey {
        let key = NodeKey::pack(self.shard, self.counter);
        self.counter = self.counter.wrapping_add(1);
        key
    }
}

impl Default for NodeKeyManager {
    fn default() -> Self {
        Self::new(1)
    }
}
