//! Shell session: a child shell behind a byte channel, driven as a
//! request/response channel.

use std::process::{Child, Command};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use regex::bytes::Regex;

use super::config::{PollStrategy, ReadMode, SessionConfig};
use super::response::Response;
use crate::channel::{AccumulationBuffer, ByteChannel, PipeChannel, PromptMatcher, Terminator};
use crate::error::{ChannelError, Result, SessionError};
use crate::profile::ShellProfile;

/// Callback receiving output text.
pub type OutputCallback<'a> = &'a mut dyn FnMut(&str);

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing allocated yet.
    Uninitialized,
    /// Pipes exist, no process yet.
    PipesReady,
    /// The peer is running; reads and writes are allowed.
    ProcessRunning,
    /// Process handle and pipes released.
    Terminated,
}

/// An interactive shell driven over a byte channel.
///
/// The session writes commands to the shell's input and polls its output
/// until a terminator (normally the profile's sentinel prompt) shows up.
/// Output read past a terminator stays buffered for the next read.
///
/// Reads poll on the calling thread; there is no background reader. Every
/// operation takes `&mut self`, so a read can never overlap another read or
/// a write on the same session.
///
/// Any channel failure is fatal: the error is returned and every later
/// operation fails with [`SessionError::Unusable`].
pub struct ShellSession<C: ByteChannel = PipeChannel> {
    /// Transport to the shell.
    channel: C,

    /// The spawned shell, if this session spawned one.
    process: Option<Child>,

    /// Launch and protocol details.
    profile: ShellProfile,

    /// Read loop and teardown behavior.
    config: SessionConfig,

    /// Output read but not yet delivered.
    buffer: AccumulationBuffer,

    state: SessionState,

    /// Set once a channel operation has failed.
    poisoned: bool,
}

impl ShellSession<PipeChannel> {
    /// Create the pipes and spawn the profile's shell on them.
    ///
    /// If spawning fails, the pipes created for it are closed before the
    /// error is returned.
    pub fn spawn(profile: ShellProfile, config: SessionConfig) -> Result<Self> {
        profile.validate()?;

        let channel = PipeChannel::create()?;
        let mut session = Self::new_inner(channel, profile, config);
        session.transition(SessionState::PipesReady);

        let child = session.spawn_process()?;
        debug!(
            "spawned '{}' (pid {}) for profile '{}'",
            session.profile.program,
            child.id(),
            session.profile.name
        );
        session.process = Some(child);
        session.transition(SessionState::ProcessRunning);

        Ok(session)
    }

    fn spawn_process(&self) -> Result<Child> {
        let (stdin, stdout, stderr) = self.channel.child_stdio()?;

        let mut command = Command::new(&self.profile.program);
        command
            .args(self.profile.command_args())
            .stdin(stdin)
            .stdout(stdout)
            .stderr(stderr);
        for key in &self.profile.env_remove {
            command.env_remove(key);
        }
        for (key, value) in &self.profile.env {
            command.env(key, value);
        }

        command.spawn().map_err(|source| {
            SessionError::ProcessSpawn {
                program: self.profile.program.clone(),
                source,
            }
            .into()
        })
    }

    /// Process ID of the shell.
    pub fn pid(&self) -> Option<u32> {
        self.process.as_ref().map(Child::id)
    }
}

impl<C: ByteChannel> ShellSession<C> {
    /// Drive a shell that is already running behind `channel`.
    ///
    /// The session owns the channel but no process.
    pub fn with_channel(channel: C, profile: ShellProfile, config: SessionConfig) -> Result<Self> {
        profile.validate()?;
        let mut session = Self::new_inner(channel, profile, config);
        session.transition(SessionState::PipesReady);
        session.transition(SessionState::ProcessRunning);
        Ok(session)
    }

    fn new_inner(channel: C, profile: ShellProfile, config: SessionConfig) -> Self {
        let buffer = AccumulationBuffer::new(config.strip_ansi);
        Self {
            channel,
            process: None,
            profile,
            config,
            buffer,
            state: SessionState::Uninitialized,
            poisoned: false,
        }
    }

    fn transition(&mut self, to: SessionState) {
        debug!("session state {:?} -> {:?}", self.state, to);
        self.state = to;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn profile(&self) -> &ShellProfile {
        &self.profile
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Whether reads and writes are still allowed.
    pub fn is_usable(&self) -> bool {
        self.state == SessionState::ProcessRunning && !self.poisoned
    }

    /// Output received after the last consumed terminator.
    pub fn buffered(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.poisoned {
            return Err(SessionError::Unusable.into());
        }
        match self.state {
            SessionState::ProcessRunning => Ok(()),
            SessionState::Terminated => Err(SessionError::Terminated.into()),
            _ => Err(SessionError::Unusable.into()),
        }
    }

    /// Record a channel failure and poison the session.
    fn guard<T>(&mut self, result: std::result::Result<T, ChannelError>) -> Result<T> {
        result.map_err(|e| {
            warn!("channel failure, session is no longer usable: {}", e);
            self.poisoned = true;
            e.into()
        })
    }

    /// Write raw bytes to the shell's input.
    pub fn write(&mut self, data: impl AsRef<[u8]>) -> Result<()> {
        self.ensure_usable()?;
        let result = self.channel.write(data.as_ref());
        self.guard(result)?;
        Ok(())
    }

    /// Run `command` and deliver its output.
    ///
    /// The profile's line ending is appended, the line is written, and the
    /// session reads up to the next prompt. The prompt is dropped from the
    /// end and the echo of the line from the start (per the profile's echo
    /// policy) before `on_result` sees the text. With `on_result` set to
    /// `None` the output is read and discarded.
    pub fn execute(
        &mut self,
        command: &str,
        mut on_result: Option<OutputCallback<'_>>,
        mode: ReadMode,
    ) -> Result<()> {
        let line = self.send_line(command)?;
        let echo = Arc::clone(&self.profile.echo);
        let prompt = self.profile.prompt.clone();

        self.read_until_with(&Terminator(prompt.as_bytes()), mode, &mut |raw| {
            if let Some(callback) = on_result.as_deref_mut() {
                let output = echo.strip_echo(line.as_bytes(), raw);
                callback(&String::from_utf8_lossy(output));
            }
        })
    }

    /// Run `command` and capture its output.
    pub fn send_command(&mut self, command: &str) -> Result<Response> {
        let start = Instant::now();
        let line = self.send_line(command)?;
        let prompt = self.profile.prompt.clone();

        let mut raw = Vec::new();
        self.read_until_with(&Terminator(prompt.as_bytes()), ReadMode::Buffered, &mut |data| {
            raw = data.to_vec();
        })?;

        let result = self.profile.echo.strip_echo(line.as_bytes(), &raw);
        Ok(Response::new(
            command,
            String::from_utf8_lossy(result),
            String::from_utf8_lossy(&raw),
            start.elapsed(),
        ))
    }

    fn send_line(&mut self, command: &str) -> Result<String> {
        let mut line = String::with_capacity(command.len() + self.profile.line_ending.len());
        line.push_str(command);
        line.push_str(&self.profile.line_ending);
        debug!("sending command {:?}", command);
        self.write(line.as_bytes())?;
        Ok(line)
    }

    /// Deliver whatever output is buffered, as soon as there is any.
    pub fn read(&mut self, on_result: impl FnMut(&str)) -> Result<()> {
        self.read_until("", on_result, ReadMode::Buffered)
    }

    /// Read up to the next newline.
    pub fn read_line(&mut self, on_result: impl FnMut(&str), mode: ReadMode) -> Result<()> {
        self.read_until("\n", on_result, mode)
    }

    /// Read up to the profile's sentinel prompt.
    pub fn read_until_prompt(&mut self, on_result: impl FnMut(&str), mode: ReadMode) -> Result<()> {
        let prompt = self.profile.prompt.clone();
        self.read_until(&prompt, on_result, mode)
    }

    /// Read up to `terminator`, which is consumed but not delivered.
    ///
    /// An empty terminator is satisfied by any buffered output.
    pub fn read_until(
        &mut self,
        terminator: &str,
        on_result: impl FnMut(&str),
        mode: ReadMode,
    ) -> Result<()> {
        self.read_matching(&Terminator::new(terminator), on_result, mode)
    }

    /// Read up to the first match of `pattern`, which is consumed but not
    /// delivered.
    pub fn read_until_pattern(
        &mut self,
        pattern: &Regex,
        on_result: impl FnMut(&str),
        mode: ReadMode,
    ) -> Result<()> {
        self.read_matching(pattern, on_result, mode)
    }

    fn read_matching(
        &mut self,
        matcher: &dyn PromptMatcher,
        mut on_result: impl FnMut(&str),
        mode: ReadMode,
    ) -> Result<()> {
        self.read_until_with(matcher, mode, &mut |data| {
            on_result(&String::from_utf8_lossy(data))
        })
    }

    /// The read loop.
    ///
    /// Each iteration asks the channel how many bytes are queued and, if
    /// any, reads exactly that many into the buffer and rescans it. When
    /// nothing arrived the configured poll strategy decides how to wait.
    fn read_until_with(
        &mut self,
        matcher: &dyn PromptMatcher,
        mode: ReadMode,
        on_chunk: &mut dyn FnMut(&[u8]),
    ) -> Result<()> {
        self.ensure_usable()?;

        let start = Instant::now();
        let mut scanned = false;
        let mut streamed = 0;
        loop {
            if let Some(timeout) = self.config.read_timeout {
                if start.elapsed() >= timeout {
                    debug!(
                        "read timed out after {:?} with {} bytes buffered",
                        timeout,
                        self.buffer.len()
                    );
                    return Err(SessionError::ReadTimeout(timeout).into());
                }
            }

            let grew = self.poll_once()?;
            if grew || !scanned {
                scanned = true;

                if let Some(found) = matcher.find_match(self.buffer.as_slice()) {
                    let consumed = self.buffer.consume(found.end);
                    trace!(
                        "terminator matched at {}..{}, {} bytes left buffered",
                        found.start,
                        found.end,
                        self.buffer.len()
                    );
                    on_chunk(&consumed[..found.start]);
                    return Ok(());
                }

                if mode == ReadMode::Streaming {
                    let data = self.buffer.as_slice();
                    let safe = complete_utf8_len(&data[..data.len() - matcher.pending_len(data)]);
                    if safe > streamed {
                        streamed = safe;
                        on_chunk(&data[..safe]);
                    }
                }
            }

            if !grew {
                self.idle(start)?;
            }
        }
    }

    /// Move queued output into the buffer. Returns whether anything arrived.
    fn poll_once(&mut self) -> Result<bool> {
        let result = self.channel.bytes_available();
        let available = self.guard(result)?;
        if available == 0 {
            return Ok(false);
        }

        let result = self.channel.read_available(available);
        let data = self.guard(result)?;
        trace!("buffered {} bytes", data.len());
        self.buffer.extend(&data);
        Ok(true)
    }

    fn idle(&mut self, start: Instant) -> Result<()> {
        match self.config.poll {
            PollStrategy::Spin => std::hint::spin_loop(),
            PollStrategy::Sleep(interval) => std::thread::sleep(interval),
            PollStrategy::Readiness(max_wait) => {
                let wait = match self.config.read_timeout {
                    Some(timeout) => max_wait.min(timeout.saturating_sub(start.elapsed())),
                    None => max_wait,
                };
                if wait > Duration::ZERO {
                    let result = self.channel.wait_readable(wait);
                    self.guard(result)?;
                }
            }
        }
        Ok(())
    }

    /// Read whatever the shell has written to its error stream.
    pub fn drain_stderr(&mut self) -> Result<String> {
        self.ensure_usable()?;
        let result = self.channel.drain_stderr();
        let data = self.guard(result)?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Release the process handle, then the channel. Later operations fail.
    ///
    /// Runs automatically on drop; calling it twice does nothing.
    pub fn terminate(&mut self) {
        if self.state == SessionState::Terminated {
            return;
        }
        self.terminate_process();
        self.channel.close();
        self.transition(SessionState::Terminated);
    }

    fn terminate_process(&mut self) {
        let Some(mut child) = self.process.take() else {
            return;
        };
        let pid = child.id();
        if !self.config.kill_on_drop {
            debug!("releasing process handle for pid {}", pid);
            return;
        }

        if let Err(e) = child.kill() {
            warn!("failed to kill pid {}: {}", pid, e);
        }
        match child.wait() {
            Ok(status) => debug!("pid {} exited: {}", pid, status),
            Err(e) => warn!("failed to reap pid {}: {}", pid, e),
        }
    }
}

impl<C: ByteChannel> Drop for ShellSession<C> {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Length of `data` without a trailing incomplete UTF-8 sequence.
fn complete_utf8_len(data: &[u8]) -> usize {
    match std::str::from_utf8(data) {
        Ok(_) => data.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => data.len(),
    }
}
