//! OS pipe triple connecting the controller to a child's standard streams.

use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::process::Stdio;
use std::time::Duration;

use log::{debug, trace};
use nix::fcntl::{FcntlArg, FdFlag, fcntl};

use super::ByteChannel;
use crate::error::{ChannelError, Stream};

/// One unidirectional pipe: bytes written to `write` come out of `read`.
#[derive(Debug)]
struct PipePair {
    read: File,
    write: File,
}

#[derive(Debug)]
struct PipeEnds {
    stdin: PipePair,
    stdout: PipePair,
    stderr: PipePair,
}

/// Three pipes wired to a child process: stdin, stdout and stderr.
///
/// The controller writes to the stdin write-end and reads from the stdout and
/// stderr read-ends. Those three controller ends are close-on-exec; the
/// other three are left inheritable and handed to the child at spawn time.
///
/// All six handles are owned files, so they are closed on every exit path,
/// including a creation that fails halfway through.
#[derive(Debug)]
pub struct PipeChannel {
    /// `None` once the channel has been closed.
    ends: Option<PipeEnds>,
}

impl PipeChannel {
    /// Allocate the three pipe pairs.
    ///
    /// Where the OS supports it, both ends are created close-on-exec in one
    /// call so a concurrent `fork` never sees a controller end; the child
    /// ends are made inheritable afterwards.
    pub fn create() -> Result<Self, ChannelError> {
        Self::create_with(|_| allocate_pipe())
    }

    /// Allocate the three pipe pairs with a custom allocator.
    ///
    /// The allocator is called once per stream, in stdin, stdout, stderr
    /// order, and returns `(read_end, write_end)`. If any call fails, every
    /// end allocated before it is closed before the error is returned.
    pub fn create_with<F>(mut allocate: F) -> Result<Self, ChannelError>
    where
        F: FnMut(Stream) -> nix::Result<(OwnedFd, OwnedFd)>,
    {
        let stdin = Self::open_pair(&mut allocate, Stream::Stdin)?;
        Self::mark_non_inheritable(&stdin.write, Stream::Stdin)?;
        Self::set_inheritable(&stdin.read, Stream::Stdin, true)?;

        let stdout = Self::open_pair(&mut allocate, Stream::Stdout)?;
        Self::mark_non_inheritable(&stdout.read, Stream::Stdout)?;
        Self::set_inheritable(&stdout.write, Stream::Stdout, true)?;

        let stderr = Self::open_pair(&mut allocate, Stream::Stderr)?;
        Self::mark_non_inheritable(&stderr.read, Stream::Stderr)?;
        Self::set_inheritable(&stderr.write, Stream::Stderr, true)?;

        debug!(
            "created pipes: stdin={} stdout={} stderr={}",
            stdin.write.as_raw_fd(),
            stdout.read.as_raw_fd(),
            stderr.read.as_raw_fd()
        );

        Ok(Self {
            ends: Some(PipeEnds {
                stdin,
                stdout,
                stderr,
            }),
        })
    }

    fn open_pair<F>(allocate: &mut F, stream: Stream) -> Result<PipePair, ChannelError>
    where
        F: FnMut(Stream) -> nix::Result<(OwnedFd, OwnedFd)>,
    {
        let (read, write) =
            allocate(stream).map_err(|source| ChannelError::Creation { stream, source })?;
        Ok(PipePair {
            read: File::from(read),
            write: File::from(write),
        })
    }

    /// Set close-on-exec on a controller-held end so the child never
    /// inherits a duplicate of it.
    pub fn mark_non_inheritable(handle: &impl AsRawFd, stream: Stream) -> Result<(), ChannelError> {
        Self::set_inheritable(handle, stream, false)
    }

    fn set_inheritable(
        handle: &impl AsRawFd,
        stream: Stream,
        inheritable: bool,
    ) -> Result<(), ChannelError> {
        let fd = handle.as_raw_fd();
        let config_err = |e: nix::Error| ChannelError::HandleConfig {
            stream,
            source: io::Error::from(e),
        };

        let current = FdFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFD).map_err(config_err)?);
        let mut flags = current;
        flags.set(FdFlag::FD_CLOEXEC, !inheritable);
        if flags != current {
            fcntl(fd, FcntlArg::F_SETFD(flags)).map_err(config_err)?;
        }
        Ok(())
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.ends.is_none()
    }

    /// Release all six handles. Calling it again does nothing.
    pub fn close(&mut self) {
        if let Some(ends) = self.ends.take() {
            debug!(
                "closing pipes: stdin={} stdout={} stderr={}",
                ends.stdin.write.as_raw_fd(),
                ends.stdout.read.as_raw_fd(),
                ends.stderr.read.as_raw_fd()
            );
        }
    }

    fn ends(&self) -> Result<&PipeEnds, ChannelError> {
        self.ends.as_ref().ok_or(ChannelError::Closed)
    }

    fn reader(&self, stream: Stream) -> Result<&File, ChannelError> {
        let ends = self.ends()?;
        match stream {
            Stream::Stdin => Ok(&ends.stdin.read),
            Stream::Stdout => Ok(&ends.stdout.read),
            Stream::Stderr => Ok(&ends.stderr.read),
        }
    }

    /// Duplicate the child-side end of `stream`.
    pub(crate) fn clone_child_end(&self, stream: Stream) -> Result<File, ChannelError> {
        let ends = self.ends()?;
        let end = match stream {
            Stream::Stdin => &ends.stdin.read,
            Stream::Stdout => &ends.stdout.write,
            Stream::Stderr => &ends.stderr.write,
        };
        end.try_clone()
            .map_err(|source| ChannelError::HandleConfig { stream, source })
    }

    /// Child-side ends as `Stdio` values for `Command::stdin/stdout/stderr`.
    pub(crate) fn child_stdio(&self) -> Result<(Stdio, Stdio, Stdio), ChannelError> {
        Ok((
            Stdio::from(self.clone_child_end(Stream::Stdin)?),
            Stdio::from(self.clone_child_end(Stream::Stdout)?),
            Stdio::from(self.clone_child_end(Stream::Stderr)?),
        ))
    }

    /// Number of bytes queued on an output pipe, without consuming them.
    fn queued(&self, stream: Stream) -> Result<usize, ChannelError> {
        let fd = self.reader(stream)?.as_raw_fd();
        let mut count: libc::c_int = 0;

        // SAFETY: FIONREAD writes a single c_int through the pointer, which
        // points at a live local.
        let ret = unsafe { libc::ioctl(fd, libc::FIONREAD, &mut count as *mut libc::c_int) };
        if ret < 0 {
            return Err(ChannelError::Peek(io::Error::last_os_error()));
        }
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Consume exactly `max` already-queued bytes from an output pipe.
    fn take(&self, stream: Stream, max: usize) -> Result<Vec<u8>, ChannelError> {
        let mut reader: &File = self.reader(stream)?;
        let mut data = vec![0u8; max];
        let read = reader.read(&mut data).map_err(ChannelError::Read)?;
        if read != max {
            return Err(ChannelError::InvariantViolation {
                operation: "read",
                requested: max,
                actual: read,
            });
        }
        trace!("read {} bytes from {}", read, stream);
        Ok(data)
    }

    /// Number of bytes queued on the stderr pipe.
    pub fn stderr_available(&self) -> Result<usize, ChannelError> {
        self.queued(Stream::Stderr)
    }

    /// Consume `max` queued bytes from the stderr pipe.
    pub fn read_stderr_available(&self, max: usize) -> Result<Vec<u8>, ChannelError> {
        self.take(Stream::Stderr, max)
    }

    /// Raw descriptor of the stdout read-end.
    pub fn stdout_fd(&self) -> Result<RawFd, ChannelError> {
        Ok(self.reader(Stream::Stdout)?.as_raw_fd())
    }
}

#[cfg(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
))]
fn allocate_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    nix::unistd::pipe2(nix::fcntl::OFlag::O_CLOEXEC)
}

// No pipe2 here; the controller ends get FD_CLOEXEC right after creation.
#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd"
)))]
fn allocate_pipe() -> nix::Result<(OwnedFd, OwnedFd)> {
    nix::unistd::pipe()
}

impl ByteChannel for PipeChannel {
    /// One write to the stdin pipe. A short write is reported, not retried.
    fn write(&mut self, data: &[u8]) -> Result<usize, ChannelError> {
        let mut writer: &File = &self.ends()?.stdin.write;
        let written = writer.write(data).map_err(ChannelError::Write)?;
        if written != data.len() {
            return Err(ChannelError::InvariantViolation {
                operation: "write",
                requested: data.len(),
                actual: written,
            });
        }
        trace!("wrote {} bytes to stdin", written);
        Ok(written)
    }

    fn bytes_available(&mut self) -> Result<usize, ChannelError> {
        self.queued(Stream::Stdout)
    }

    fn read_available(&mut self, max: usize) -> Result<Vec<u8>, ChannelError> {
        self.take(Stream::Stdout, max)
    }

    /// Block in `poll(2)` until stdout is readable or `timeout` elapses.
    fn wait_readable(&mut self, timeout: Duration) -> Result<bool, ChannelError> {
        let mut pollfd = libc::pollfd {
            fd: self.stdout_fd()?,
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = libc::c_int::try_from(timeout.as_millis()).unwrap_or(libc::c_int::MAX);

        // SAFETY: one valid pollfd, count matches.
        let ret = unsafe { libc::poll(&mut pollfd, 1, millis) };
        if ret < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                return Ok(false);
            }
            return Err(ChannelError::Wait(err));
        }
        Ok(ret > 0 && pollfd.revents & libc::POLLIN != 0)
    }

    fn drain_stderr(&mut self) -> Result<Vec<u8>, ChannelError> {
        match self.stderr_available()? {
            0 => Ok(Vec::new()),
            n => self.read_stderr_available(n),
        }
    }

    fn close(&mut self) {
        PipeChannel::close(self);
    }
}
