use std::{ops::Deref, sync::mpsc};

use crate::subscribers::{Handler, SubscriptionId};

/// One burst of bytes read from a transport
///
/// Holds exactly the bytes that were available when the transport drained its device. A burst
/// can contain part of a message, or several messages; reassembly is up to the consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedData {
    data: Box<[u8]>,
}

impl ReceivedData {
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data.into_vec()
    }
}

impl From<Vec<u8>> for ReceivedData {
    fn from(data: Vec<u8>) -> Self {
        Self {
            data: data.into_boxed_slice(),
        }
    }
}

impl From<&[u8]> for ReceivedData {
    fn from(data: &[u8]) -> Self {
        Self { data: data.into() }
    }
}

impl Deref for ReceivedData {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.data
    }
}

impl AsRef<[u8]> for ReceivedData {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// A connection-style byte transport to a device
///
/// None of these methods panic or return errors: failures are logged by the implementation and
/// reported only as `false`. Inbound bytes are pushed to subscribers from a thread owned by the
/// implementation, so handlers must synchronize any state they share with the caller.
pub trait Transport: Send + Sync {
    /// Whether the transport currently holds an open connection
    fn is_connected(&self) -> bool;

    /// Open the underlying resource
    ///
    /// Returns `true` if the transport is connected after the call, including when it already was.
    fn connect(&self) -> bool;

    /// Release the underlying resource
    ///
    /// Safe to call at any time, any number of times.
    fn disconnect(&self);

    /// Write all of `data` to the open connection
    ///
    /// Returns `false` if the transport is not connected or the write fails.
    fn send(&self, data: &[u8]) -> bool;

    /// Register a handler called with every burst of inbound bytes, in arrival order
    fn subscribe(&self, handler: Handler) -> SubscriptionId;

    /// Remove a handler; returns `false` if it was not registered
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Subscribe through a channel instead of a callback
    ///
    /// The receiver yields every burst in arrival order. Once it is dropped the handler stays
    /// registered but does nothing; call [unsubscribe](Self::unsubscribe) to remove it.
    fn subscribe_channel(&self) -> (SubscriptionId, mpsc::Receiver<ReceivedData>) {
        let (tx, rx) = mpsc::channel();
        let id = self.subscribe(Box::new(move |data: &ReceivedData| {
            // receiver gone
            let _ = tx.send(data.clone());
        }));
        (id, rx)
    }
}
