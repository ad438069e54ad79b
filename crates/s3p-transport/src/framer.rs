//! Delimiter-driven frame assembly.

use std::time::{Duration, Instant};

use s3p_frame::{COBS_DELIM, MAX_FRAME_SIZE};

use crate::cancel::CancelToken;
use crate::error::FrameReadError;
use crate::traits::Transport;

/// Reads one frame from `transport`: bytes up to, and not including,
/// the next `0x00` delimiter.
///
/// Bytes are polled one at a time; an empty poll sleeps for
/// `poll_interval` before trying again. A byte run that would exceed
/// [`MAX_FRAME_SIZE`] (delimiter included) is dropped wholesale and
/// assembly resynchronizes at the delimiter that ends it. Waiting stops
/// at `timeout`, or as soon as `cancel` is set.
pub fn read_frame(
    transport: &mut dyn Transport,
    timeout: Duration,
    poll_interval: Duration,
    cancel: &CancelToken,
) -> Result<Vec<u8>, FrameReadError> {
    let deadline = Instant::now() + timeout;
    let mut buf = Vec::new();
    let mut overrun = false;

    loop {
        if cancel.is_cancelled() {
            return Err(FrameReadError::Cancelled);
        }

        let mut byte = [0u8; 1];
        if transport.read(&mut byte)? == 0 {
            if Instant::now() >= deadline {
                return Err(FrameReadError::Timeout);
            }
            std::thread::sleep(poll_interval);
            continue;
        }
        let byte = byte[0];

        if byte == COBS_DELIM {
            if overrun {
                log::warn!("dropped oversized frame, resynchronized");
                overrun = false;
                buf.clear();
                continue;
            }
            log::trace!("frame assembled: {} bytes", buf.len());
            return Ok(buf);
        }

        if overrun {
            continue;
        }
        if buf.len() >= MAX_FRAME_SIZE - 1 {
            // Cap reached with no delimiter in sight.
            overrun = true;
            buf.clear();
            continue;
        }
        buf.push(byte);
    }
}
