//! In-memory transport pair, for tests and protocol rehearsal without
//! hardware.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::TransportError;
use crate::traits::Transport;

type ByteQueue = Rc<RefCell<VecDeque<u8>>>;

/// One end of an in-memory byte link. Everything written on one end
/// becomes readable on the other.
pub struct Loopback {
    rx: ByteQueue,
    tx: ByteQueue,
}

impl Loopback {
    /// Creates two connected endpoints.
    pub fn pair() -> (Loopback, Loopback) {
        let a_to_b: ByteQueue = Rc::default();
        let b_to_a: ByteQueue = Rc::default();
        (
            Loopback {
                rx: b_to_a.clone(),
                tx: a_to_b.clone(),
            },
            Loopback {
                rx: a_to_b,
                tx: b_to_a,
            },
        )
    }

    /// Test convenience: queue bytes for the peer without error
    /// plumbing.
    pub fn send(&mut self, bytes: &[u8]) {
        self.tx.borrow_mut().extend(bytes);
    }

    /// Bytes currently queued toward the peer.
    pub fn pending(&self) -> usize {
        self.tx.borrow().len()
    }
}

impl Transport for Loopback {
    fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        self.tx.borrow_mut().extend(buf);
        Ok(buf.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut rx = self.rx.borrow_mut();
        let n = buf.len().min(rx.len());
        for slot in buf.iter_mut().take(n) {
            // n is bounded by the queue length just above.
            *slot = match rx.pop_front() {
                Some(byte) => byte,
                None => unreachable!(),
            };
        }
        Ok(n)
    }

    fn discard(&mut self) -> Result<(), TransportError> {
        self.rx.borrow_mut().clear();
        Ok(())
    }
}
