#![forbid(unsafe_code)]

//! Double-buffered frame handoff.
//!
//! A `BufferPool` owns exactly two equally-sized buffers and an atomic
//! index selecting the current one. A frame writes into the current
//! buffer, then [`BufferPool::swap`] hands it to the consumer and makes
//! the other buffer current, clearing it lazily: only rows the previous
//! use of that buffer actually touched are wiped.
//!
//! # Concurrency contract
//!
//! The index flip is atomic, but buffer contents are not synchronized. A
//! consumer must read the swapped-out buffer only after `swap` returns;
//! everything else is single-threaded per frame.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::buffer::Buffer;

/// Two buffers and an atomic `current` index.
#[derive(Debug)]
pub struct BufferPool {
    buffers: [Buffer; 2],
    current: AtomicUsize,
    needs_clear: [bool; 2],
}

impl BufferPool {
    /// Create a pool of two cleared buffers.
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            buffers: [Buffer::new(width, height), Buffer::new(width, height)],
            current: AtomicUsize::new(0),
            needs_clear: [false; 2],
        }
    }

    #[inline]
    fn index(&self) -> usize {
        self.current.load(Ordering::Acquire) & 1
    }

    /// The buffer the writer is currently filling.
    #[inline]
    pub fn current(&self) -> &Buffer {
        &self.buffers[self.index()]
    }

    /// Mutable access to the current buffer.
    #[inline]
    pub fn current_mut(&mut self) -> &mut Buffer {
        let idx = self.index();
        &mut self.buffers[idx]
    }

    /// Hand off the current buffer and switch to the other one.
    ///
    /// The outgoing buffer is marked as needing a clear on its next turn;
    /// the incoming buffer is cleared now if a prior swap marked it.
    /// After `swap` returns, [`BufferPool::current_mut`] yields a buffer
    /// whose rows up to its previous `dirty_max_y` are empty.
    pub fn swap(&mut self) {
        let cur = self.index();
        let next = cur ^ 1;
        self.needs_clear[cur] = true;
        if self.needs_clear[next] {
            self.buffers[next].clear_dirty();
            self.needs_clear[next] = false;
        }
        self.current.store(next, Ordering::Release);
    }

    /// Resize both buffers. A resize already empties new content, so the
    /// needs-clear marks are dropped.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.buffers[0].resize(width, height);
        self.buffers[1].resize(width, height);
        self.needs_clear = [false; 2];
    }

    /// Repeatedly yield the current buffer to `frame` and swap, until
    /// `stop` is observed between frames. Partial frames are never
    /// published because the index flip happens only after `frame`
    /// returns.
    pub fn run<F: FnMut(&mut Buffer)>(&mut self, stop: &AtomicBool, mut frame: F) {
        while !stop.load(Ordering::Relaxed) {
            frame(self.current_mut());
            self.swap();
        }
    }
}
