//! Channel layer: the pipes to the child, the accumulation buffer, and
//! terminator matching.

mod buffer;
mod patterns;
mod pipe;

use std::time::Duration;

pub use buffer::AccumulationBuffer;
pub use patterns::{PromptMatcher, Terminator, find_terminator, partial_suffix_len};
pub use pipe::PipeChannel;

use crate::error::ChannelError;

/// Byte transport between a session and its child.
///
/// `PipeChannel` is the production implementation. Anything that can report
/// queued bytes and hand them over can sit behind a session, which is how the
/// read loop is exercised without a real process.
pub trait ByteChannel {
    /// Write `data` to the child's input in one call.
    fn write(&mut self, data: &[u8]) -> Result<usize, ChannelError>;

    /// Number of output bytes queued right now, without consuming them.
    fn bytes_available(&mut self) -> Result<usize, ChannelError>;

    /// Consume exactly `max` queued output bytes.
    fn read_available(&mut self, max: usize) -> Result<Vec<u8>, ChannelError>;

    /// Wait up to `timeout` for output to become readable.
    ///
    /// The default sleeps for the whole timeout and then checks once.
    fn wait_readable(&mut self, timeout: Duration) -> Result<bool, ChannelError> {
        std::thread::sleep(timeout);
        Ok(self.bytes_available()? > 0)
    }

    /// Consume whatever is queued on the child's error stream.
    fn drain_stderr(&mut self) -> Result<Vec<u8>, ChannelError> {
        Ok(Vec::new())
    }

    /// Release the underlying handles.
    fn close(&mut self) {}
}
