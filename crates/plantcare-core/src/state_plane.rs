//! Wait-free exchange of the latest [`SensorSample`].
//!
//! Two sample-sized slots plus a version counter. The writer fills the slot
//! selected by the parity of the *next* version and then stores that version
//! as its final, visible step. Readers copy the slot selected by the version
//! they observed and retry if the version moved while they were copying.
//!
//! Slots are arrays of atomic words so that a reader racing a writer only
//! ever sees a stale or mixed copy, which the version check then discards,
//! never undefined memory.
//!
//! ## Writers
//!
//! The protocol tolerates any number of readers but exactly one writer.
//! [`StatePlane::publisher`] hands out at most one [`StatePublisher`] at a
//! time and `publish` takes `&mut self`, so two concurrent writers cannot be
//! expressed in safe code.

use core::hint::spin_loop;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering, fence};

use log::warn;

use crate::sample::{SAMPLE_WORDS, SensorSample};

type Slot = [AtomicU32; SAMPLE_WORDS];

/// Seqlock-style double buffer holding the most recent published sample
pub struct StatePlane {
    slots: [Slot; 2],
    version: AtomicU32,
    publisher_claimed: AtomicBool,
}

impl StatePlane {
    /// Create an empty plane. Snapshots taken before the first publish
    /// return the zero sample.
    pub const fn new() -> Self {
        Self {
            slots: [
                [const { AtomicU32::new(0) }; SAMPLE_WORDS],
                [const { AtomicU32::new(0) }; SAMPLE_WORDS],
            ],
            version: AtomicU32::new(0),
            publisher_claimed: AtomicBool::new(false),
        }
    }

    /// Claim the single writer handle.
    ///
    /// Returns `None` while another [`StatePublisher`] is alive.
    pub fn publisher(&self) -> Option<StatePublisher<'_>> {
        if self
            .publisher_claimed
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            warn!("State plane publisher already claimed");
            return None;
        }

        Some(StatePublisher { plane: self })
    }

    /// Number of publishes so far (wraps at `u32::MAX`)
    pub fn version(&self) -> u32 {
        self.version.load(Ordering::Acquire)
    }

    /// Copy out the latest published sample.
    ///
    /// Never blocks the writer. Retries until a copy is taken without a
    /// publish completing in between.
    pub fn snapshot(&self) -> SensorSample {
        self.versioned_snapshot().1
    }

    /// Like [`snapshot`](Self::snapshot), also returning the version the copy
    /// belongs to, so a reader can tell a new publish from one it already saw.
    pub fn versioned_snapshot(&self) -> (u32, SensorSample) {
        let (version, words) = self.snapshot_words();
        (version, SensorSample::from_words(&words))
    }

    fn snapshot_words(&self) -> (u32, [u32; SAMPLE_WORDS]) {
        let mut words = [0u32; SAMPLE_WORDS];

        loop {
            let v1 = self.version.load(Ordering::Acquire);
            let slot = &self.slots[(v1 & 1) as usize];
            for (dst, src) in words.iter_mut().zip(slot.iter()) {
                *dst = src.load(Ordering::Relaxed);
            }

            // Pairs with the release fence in `write`: if any word above came
            // from a later publish, the version load below sees it moved.
            fence(Ordering::Acquire);
            let v2 = self.version.load(Ordering::Relaxed);

            if v1 == v2 {
                return (v1, words);
            }
            spin_loop();
        }
    }

    fn write(&self, sample: &SensorSample) {
        let next = self.version.load(Ordering::Relaxed).wrapping_add(1);

        // Orders the previous version store before the slot writes below.
        fence(Ordering::Release);

        let slot = &self.slots[(next & 1) as usize];
        for (dst, src) in slot.iter().zip(sample.to_words()) {
            dst.store(src, Ordering::Relaxed);
        }

        self.version.store(next, Ordering::Release);
    }
}

impl Default for StatePlane {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive writer handle for a [`StatePlane`]
pub struct StatePublisher<'a> {
    plane: &'a StatePlane,
}

impl StatePublisher<'_> {
    /// Make `sample` the latest state.
    ///
    /// Constant work, never blocks and never fails, however many readers are
    /// copying concurrently.
    pub fn publish(&mut self, sample: &SensorSample) {
        self.plane.write(sample);
    }
}

impl Drop for StatePublisher<'_> {
    fn drop(&mut self) {
        self.plane.publisher_claimed.store(false, Ordering::Release);
    }
}
