use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use super::transport::ClearInput;
use super::Result;

#[derive(Default)]
struct Shared {
    written: Vec<u8>,
    clears: usize,
    dropped: bool,
}

/// In-memory stand-in for a serial port.
///
/// Reads hand out the scripted chunks in order, a scripted error fails
/// exactly one read. Once the script is used up the read stays pending,
/// which looks like a silent instrument to the caller. Writes, input
/// clears and the final drop are recorded in a shared log.
pub(crate) struct FakeBuffer {
    reads: VecDeque<io::Result<Vec<u8>>>,
    fail_reads: bool,
    shared: Arc<Mutex<Shared>>,
}

impl FakeBuffer {
    pub(crate) fn new(response: &str) -> Self {
        Self::scripted(vec![Ok(response)])
    }

    pub(crate) fn scripted(reads: Vec<io::Result<&str>>) -> Self {
        Self {
            reads: reads
                .into_iter()
                .map(|r| r.map(|s| s.as_bytes().to_vec()))
                .filter(|r| !matches!(r, Ok(bytes) if bytes.is_empty()))
                .collect(),
            fail_reads: false,
            shared: Arc::default(),
        }
    }

    /// Every read fails with a broken pipe error.
    pub(crate) fn failing() -> Self {
        let mut fake = Self::new("");
        fake.fail_reads = true;
        fake
    }

    pub(crate) fn log(&self) -> WriteLog {
        WriteLog(self.shared.clone())
    }
}

pub(crate) fn glitch() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "fake read failure")
}

#[derive(Clone)]
pub(crate) struct WriteLog(Arc<Mutex<Shared>>);

impl WriteLog {
    pub(crate) fn lines(&self) -> Vec<String> {
        let shared = self.0.lock().unwrap();
        String::from_utf8_lossy(&shared.written)
            .split_terminator("\r\n")
            .map(ToOwned::to_owned)
            .collect()
    }

    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.lines().iter().filter(|l| l.starts_with(prefix)).count()
    }

    pub(crate) fn clears(&self) -> usize {
        self.0.lock().unwrap().clears
    }

    /// The fake port was dropped, i.e. the owning transport released it.
    pub(crate) fn is_released(&self) -> bool {
        self.0.lock().unwrap().dropped
    }
}

impl ClearInput for FakeBuffer {
    fn clear_input(&mut self) -> Result<()> {
        self.reads.retain(|r| r.is_err());
        self.shared.lock().unwrap().clears += 1;
        Ok(())
    }
}

impl Drop for FakeBuffer {
    fn drop(&mut self) {
        if let Ok(mut shared) = self.shared.lock() {
            shared.dropped = true;
        }
    }
}

impl tokio::io::AsyncRead for FakeBuffer {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        if self.fail_reads {
            return Poll::Ready(Err(glitch()));
        }
        match self.reads.pop_front() {
            None => Poll::Pending,
            Some(Err(err)) => Poll::Ready(Err(err)),
            Some(Ok(mut bytes)) => {
                let c = buf.remaining().min(bytes.len());
                buf.put_slice(&bytes[0..c]);
                bytes.drain(0..c);
                if !bytes.is_empty() {
                    self.reads.push_front(Ok(bytes));
                }
                Poll::Ready(Ok(()))
            }
        }
    }
}

impl tokio::io::AsyncWrite for FakeBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::result::Result<usize, io::Error>> {
        self.shared.lock().unwrap().written.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<std::result::Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<std::result::Result<(), io::Error>> {
        Poll::Ready(Ok(()))
    }
}
