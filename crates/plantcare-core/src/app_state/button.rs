//! Button edge latch shared between the interrupt-like source and the
//! mode controller

use core::sync::atomic::{AtomicBool, Ordering};

/// One-slot mailbox for "a rising edge occurred since last consumed".
///
/// The edge source calls [`post`](Self::post) at any time; the consumer
/// drains it with [`take`](Self::take), which reads and clears in a single
/// atomic swap so an edge arriving between the read and the clear is never
/// lost. Several posts before a take collapse into one edge.
pub struct ButtonEdge {
    pending: AtomicBool,
}

impl ButtonEdge {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Latch an edge. Safe to call from interrupt context.
    pub fn post(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Consume the latched edge, returning whether one was pending
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Peek without consuming
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

impl Default for ButtonEdge {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns periodic level reads into rising-edge events.
///
/// For button sources that can only sample the pin level. The first sample
/// only primes the detector, so a button held at boot does not count as a
/// press.
#[derive(Debug, Default)]
pub struct EdgeDetector {
    last_pressed: Option<bool>,
}

impl EdgeDetector {
    pub const fn new() -> Self {
        Self { last_pressed: None }
    }

    /// Feed the current level; returns `true` on a released→pressed edge
    pub fn update(&mut self, pressed: bool) -> bool {
        let edge = self.last_pressed == Some(false) && pressed;
        self.last_pressed = Some(pressed);
        edge
    }

    /// Feed the level and post any edge into `latch`.
    pub fn update_into(&mut self, pressed: bool, latch: &ButtonEdge) {
        if self.update(pressed) {
            latch.post();
        }
    }
}
