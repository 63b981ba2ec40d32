pub mod events;
pub mod strategy;

use self::events::InputEvent;
use crossbeam_channel::{unbounded, Receiver, Sender};

/// Lane presses and releases waiting for the next tick.
pub struct InputQueue {
    sender: Sender<InputEvent>,
    receiver: Receiver<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self { sender, receiver }
    }

    /// Queues a lane or control event for the next tick.
    pub fn push(&self, event: InputEvent) {
        // The receiver lives in `self`, so the channel is never closed here.
        let _ = self.sender.send(event);
    }

    /// The oldest queued event, if any.
    pub fn pop(&self) -> Option<InputEvent> {
        self.receiver.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    /// Everything queued so far, oldest first.
    pub fn drain(&self) -> Vec<InputEvent> {
        self.receiver.try_iter().collect()
    }

    /// A handle for a device thread; events it sends land in this queue.
    pub fn sender(&self) -> Sender<InputEvent> {
        self.sender.clone()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}
