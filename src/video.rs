//! Live frame acquisition.
//!
//! The live-capture variant decouples frame grabbing from processing: a
//! dedicated background thread pulls frames from a [`FrameSource`] and
//! overwrites a single-slot buffer as fast as frames arrive. Consumers read
//! whatever is currently in the slot, so frames may be dropped but a consumer
//! never blocks waiting for a new one.
//!
//! Frames stay encoded (raw JPEG bytes); decoding them is the consumer's
//! business.

use std::io;
use std::panic::resume_unwind;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::timer::FpsCounter;

/// An encoded (JPEG) video frame.
pub type Frame = Arc<Vec<u8>>;

/// A single-slot "latest value" buffer.
///
/// One writer overwrites the slot; any number of readers clone the current
/// value. There is no ordering guarantee beyond "the most recent read
/// reflects the most recent completed write".
pub struct LatestSlot<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Clone for LatestSlot<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LatestSlot<T> {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Replaces the slot's contents, discarding the previous value.
    pub fn put(&self, value: T) {
        *self.slot.lock().unwrap() = Some(value);
    }
}

impl<T: Clone> LatestSlot<T> {
    /// Returns a copy of the most recently written value, or [`None`] if
    /// nothing has been written yet. Never blocks waiting for a write.
    pub fn latest(&self) -> Option<T> {
        self.slot.lock().unwrap().clone()
    }
}

/// A blocking source of encoded video frames.
pub trait FrameSource: Send + 'static {
    /// Fetches the next frame, blocking until one is available.
    fn grab(&mut self) -> anyhow::Result<Vec<u8>>;
}

/// Background thread that keeps a [`LatestSlot`] filled with the newest frame.
///
/// Dropping the handle stops the capture loop and joins the thread,
/// propagating any panic that occurred on it.
pub struct CaptureThread {
    slot: LatestSlot<Frame>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureThread {
    /// Starts capturing from `source` on a dedicated thread.
    pub fn spawn<S: FrameSource>(mut source: S) -> io::Result<Self> {
        let slot = LatestSlot::new();
        let stop = Arc::new(AtomicBool::new(false));

        let handle = thread::Builder::new().name("frame capture".into()).spawn({
            let slot = slot.clone();
            let stop = stop.clone();
            move || {
                let mut fps = FpsCounter::new("capture");
                while !stop.load(Ordering::Relaxed) {
                    match source.grab() {
                        Ok(frame) => {
                            slot.put(Arc::new(frame));
                            fps.tick();
                        }
                        Err(e) => {
                            log::warn!("frame capture stopped: {e:#}");
                            break;
                        }
                    }
                }
            }
        })?;

        Ok(Self {
            slot,
            stop,
            handle: Some(handle),
        })
    }

    /// Returns a reader handle onto the latest-frame slot.
    pub fn frames(&self) -> LatestSlot<Frame> {
        self.slot.clone()
    }

    /// Returns the most recent frame, if any has arrived yet.
    pub fn latest(&self) -> Option<Frame> {
        self.slot.latest()
    }
}

impl Drop for CaptureThread {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            if let Err(payload) = handle.join() {
                resume_unwind(payload);
            }
        }
    }
}
