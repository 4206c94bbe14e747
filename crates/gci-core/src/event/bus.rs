// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// A thread-safe, bounded event channel.
///
/// Publishing never blocks: when the channel is full the event is dropped.
#[derive(Debug)]
pub struct EventBus<T: Clone + Send + Sync + 'static> {
    sender: flume::Sender<T>,
    receiver: flume::Receiver<T>,
}

impl<T: Clone + Send + Sync + 'static> EventBus<T> {
    /// The capacity used by [`EventBus::new`].
    pub const DEFAULT_CAPACITY: usize = 1024;

    /// Creates a bus holding at most [`Self::DEFAULT_CAPACITY`] pending events.
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a bus holding at most `capacity` pending events.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = flume::bounded(capacity);
        Self { sender, receiver }
    }

    /// Sends `event` if there is room for it.
    ///
    /// Returns `false` if the event was dropped.
    pub fn publish(&self, event: T) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(flume::TrySendError::Full(_)) => {
                log::trace!("Event bus full, dropping an event.");
                false
            }
            Err(flume::TrySendError::Disconnected(_)) => {
                log::error!("Failed to send event: receiver disconnected.");
                false
            }
        }
    }

    /// A new receiver. Receivers share the queue: each event is delivered once.
    pub fn subscribe(&self) -> flume::Receiver<T> {
        self.receiver.clone()
    }

    /// Removes and returns every pending event.
    pub fn drain(&self) -> Vec<T> {
        self.receiver.try_iter().collect()
    }

    /// The number of pending events.
    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if no event is pending.
    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for EventBus<T> {
    fn default() -> Self {
        Self::new()
    }
}
