use futures::{SinkExt, StreamExt};
use std::{io, pin::Pin, time::Duration};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{sleep, timeout, timeout_at, Instant};
use tokio_serial::{ClearBuffer, SerialPort, SerialPortBuilderExt, SerialStream};
use tokio_util::codec::Decoder;
use tracing::{debug, trace};

use super::Result;
use super::{codec::ScpiCodec, command::Command, ProtoError};

trait AsyncReadWrite<S>: futures::Sink<S> + futures::Stream {}

impl<T, S> AsyncReadWrite<S> for T where T: futures::Sink<S> + futures::Stream {}

/// Fixed waits required by the instrument.
///
/// These are timing contracts with the hardware, every one of them is
/// awaited in full.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    /// Pause after every written command.
    pub inter_command: Duration,
    /// Pause after opening a port, before the input buffer is discarded.
    pub wake_up: Duration,
    /// Pause between sending `*IDN?` and reading the answer while probing.
    pub identify_wait: Duration,
    /// Relay and ADC settling after `CONF:`.
    pub mode_settle: Duration,
    /// Settling after `RATE`.
    pub rate_settle: Duration,
    /// Pause after each warm-up query.
    pub warm_up_interval: Duration,
    /// Number of discarded `MEAS?` queries after a mode change.
    pub warm_up_queries: usize,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            inter_command: Duration::from_millis(50),
            wake_up: Duration::from_millis(300),
            identify_wait: Duration::from_millis(300),
            mode_settle: Duration::from_secs(3),
            rate_settle: Duration::from_millis(500),
            warm_up_interval: Duration::from_millis(100),
            warm_up_queries: 2,
        }
    }
}

/// Ports whose pending input can be thrown away.
pub trait ClearInput {
    fn clear_input(&mut self) -> Result<()>;
}

impl ClearInput for SerialStream {
    fn clear_input(&mut self) -> Result<()> {
        Ok(self.clear(ClearBuffer::Input)?)
    }
}

/// Let a freshly opened instrument wake up, then drop any stale input.
pub async fn wake_up<T: ClearInput>(io: &mut T, timing: &Timing) -> Result<()> {
    sleep(timing.wake_up).await;
    io.clear_input()
}

#[allow(clippy::type_complexity)]
pub struct Transport {
    port: String,
    stream: Option<
        Pin<
            Box<
                dyn AsyncReadWrite<
                        Command,
                        Error = io::Error,
                        Item = std::result::Result<String, io::Error>,
                    > + Send,
            >,
        >,
    >,
    timeout: Duration,
    inter_command: Duration,
}

impl Transport {
    /// Open a serial port, let the instrument wake up and discard whatever
    /// is already waiting in the input buffer.
    pub async fn open(
        port: impl AsRef<str>,
        baudrate: u32,
        timeout: Duration,
        timing: &Timing,
    ) -> Result<Self> {
        let mut serial = tokio_serial::new(port.as_ref(), baudrate)
            .timeout(timeout)
            .open_native_async()?;
        debug!(port = port.as_ref(), baudrate, "opened serial port");

        wake_up(&mut serial, timing).await?;

        Ok(Self::from_io(port.as_ref(), serial, timeout, timing))
    }

    /// Wrap an already prepared byte stream.
    pub fn from_io<T>(port: impl Into<String>, io: T, timeout: Duration, timing: &Timing) -> Self
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        let stream = ScpiCodec::default().framed(io);
        Self {
            port: port.into(),
            stream: Some(Box::pin(stream)),
            timeout,
            inter_command: timing.inter_command,
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    /// Send one line and flush it, without the inter-command pause.
    pub async fn send(&mut self, cmd: impl Into<Command>) -> Result<()> {
        let cmd = cmd.into();
        let stream = self.stream.as_mut().ok_or(ProtoError::Closed)?;
        trace!(port = %self.port, "> {}", cmd);
        timeout(self.timeout, stream.send(cmd))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "Write timed out"))??;
        Ok(())
    }

    /// Send one line, then wait the inter-command pause.
    pub async fn write(&mut self, cmd: impl Into<Command>) -> Result<()> {
        self.send(cmd).await?;
        sleep(self.inter_command).await;
        Ok(())
    }

    /// Read one line. A read timeout is not an error, it yields an empty
    /// line.
    pub async fn read_line(&mut self) -> Result<String> {
        let deadline = Instant::now() + self.timeout;
        let stream = self.stream.as_mut().ok_or(ProtoError::Closed)?;
        let mut item = timeout_at(deadline, stream.next()).await;
        if let Ok(None) = item {
            // After an I/O error the framed stream ends once, then resumes.
            item = timeout_at(deadline, stream.next()).await;
        }
        match item {
            Ok(Some(Ok(line))) => {
                trace!(port = %self.port, "< {}", line);
                Ok(line)
            }
            Ok(Some(Err(ioerr))) => Err(ioerr.into()),
            Ok(None) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "Serial stream ended",
            )
            .into()),
            Err(_elapsed) => {
                trace!(port = %self.port, "< (timeout)");
                Ok(String::new())
            }
        }
    }

    /// Exactly one [`write`](Self::write) followed by one
    /// [`read_line`](Self::read_line).
    pub async fn query(&mut self, cmd: impl Into<Command>) -> Result<String> {
        self.write(cmd).await?;
        self.read_line().await
    }

    /// Release the port. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            debug!(port = %self.port, "closed serial port");
        }
    }
}
