// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Single-slot delivery channel
//!
//! Holds at most one value. Unlike a bounded mpsc channel the sending
//! side can withdraw a value the receiver has not taken yet.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

#[derive(Debug)]
struct State<T> {
    value: Option<T>,
    closed: bool,
    receiver_dropped: bool,
}

#[derive(Debug)]
struct Shared<T> {
    state: Mutex<State<T>>,
    notify: Notify,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a connected sender and receiver
pub fn slot<T>() -> (SlotSender<T>, SlotReceiver<T>) {
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            value: None,
            closed: false,
            receiver_dropped: false,
        }),
        notify: Notify::new(),
    });
    (
        SlotSender {
            shared: Arc::clone(&shared),
        },
        SlotReceiver { shared },
    )
}

/// Sending half; closes the slot when dropped
#[derive(Debug)]
pub struct SlotSender<T> {
    shared: Arc<Shared<T>>,
}

impl<T> SlotSender<T> {
    /// Put `value` into the slot, returning the value it replaced
    pub fn replace(&self, value: T) -> Option<T> {
        let stale = self.shared.lock().value.replace(value);
        self.shared.notify.notify_one();
        stale
    }

    /// Withdraw the value the receiver has not taken yet
    pub fn take(&self) -> Option<T> {
        self.shared.lock().value.take()
    }

    /// Whether the slot holds a value
    pub fn is_full(&self) -> bool {
        self.shared.lock().value.is_some()
    }

    /// Whether the receiver is gone
    pub fn is_disconnected(&self) -> bool {
        self.shared.lock().receiver_dropped
    }

    /// Close the slot; a value still in it stays receivable
    pub fn close(&self) {
        self.shared.lock().closed = true;
        self.shared.notify.notify_one();
    }
}

impl<T> Drop for SlotSender<T> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Receiving half
#[derive(Debug)]
pub struct SlotReceiver<T> {
    shared: Arc<Shared<T>>,
}

impl<T> SlotReceiver<T> {
    /// Wait for the next value, `None` once the slot is closed and empty
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            {
                let mut state = self.shared.lock();
                if let Some(value) = state.value.take() {
                    return Some(value);
                }
                if state.closed {
                    return None;
                }
            }
            // notify_one stores a permit if nobody waits yet
            self.shared.notify.notified().await;
        }
    }

    /// Take the value if there is one
    pub fn try_recv(&mut self) -> Option<T> {
        self.shared.lock().value.take()
    }

    /// Whether the sender closed the slot
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

impl<T> Drop for SlotReceiver<T> {
    fn drop(&mut self) {
        self.shared.lock().receiver_dropped = true;
    }
}
