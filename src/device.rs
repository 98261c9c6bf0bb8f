use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::discovery;
use crate::mode::{MeasurementMode, MeasurementSpeed, Normalize};
use crate::proto::{
    command::Command,
    response::Identity,
    transport::{Timing, Transport},
    ProtoError, Result,
};
use crate::{DEFAULT_BAUDRATE, DEFAULT_TIMEOUT};

/// Connection parameters for [`Device::connect`].
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Substring the instrument serial number must contain. `None` accepts
    /// the first XDM1xxx found.
    pub serial_suffix: Option<String>,
    /// Only probe this port instead of every port of the host.
    pub port: Option<String>,
    pub baudrate: u32,
    /// Read and write timeout.
    pub timeout: Duration,
    pub timing: Timing,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            serial_suffix: None,
            port: None,
            baudrate: DEFAULT_BAUDRATE,
            timeout: DEFAULT_TIMEOUT,
            timing: Timing::default(),
        }
    }
}

impl DeviceConfig {
    pub fn serial_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.serial_suffix = Some(suffix.into());
        self
    }

    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.port = Some(port.into());
        self
    }

    pub fn baudrate(mut self, baudrate: u32) -> Self {
        self.baudrate = baudrate;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }
}

/// Session with one OWON XDM1000 series multimeter.
///
/// The session owns its serial port; dropping it (or calling
/// [`close`](Self::close)) releases the port.
pub struct Device {
    transport: Transport,
    ident: Identity,
    current_mode: Option<MeasurementMode>,
    timing: Timing,
}

impl Device {
    /// Find the instrument among the serial ports and open a session to it.
    ///
    /// Every candidate port is probed and closed again, then the winning
    /// port is opened anew for this session.
    pub async fn connect(config: DeviceConfig) -> Result<Self> {
        let ports = match &config.port {
            Some(port) => vec![port.clone()],
            None => discovery::list_ports()?,
        };
        let baudrate = config.baudrate;
        let timeout = config.timeout;
        let timing = config.timing.clone();
        Self::connect_with(config, ports, move |port| {
            let timing = timing.clone();
            async move { Transport::open(&port, baudrate, timeout, &timing).await }
        })
        .await
    }

    pub(crate) async fn connect_with<F, Fut>(
        config: DeviceConfig,
        ports: Vec<String>,
        mut open: F,
    ) -> Result<Self>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<Transport>>,
    {
        let (port, ident) = discovery::discover_with(
            ports,
            config.serial_suffix.as_deref(),
            &config.timing,
            &mut open,
        )
        .await?;

        // The probing connection is already closed, open a fresh one.
        let transport = open(port.clone()).await?;
        info!(port = %port, serial = %ident.serial, "connected");

        Ok(Self {
            transport,
            ident,
            current_mode: None,
            timing: config.timing,
        })
    }

    #[cfg(test)]
    pub(crate) fn new_faked(fake: super::proto::fake::FakeBuffer) -> Self {
        let timing = Timing::default();
        Self {
            transport: Transport::from_io("fake", fake, DEFAULT_TIMEOUT, &timing),
            ident: Identity::parse("OWON,XDM1041,1543210,V4.3.0,3").unwrap(),
            current_mode: None,
            timing,
        }
    }

    pub fn ident(&self) -> &Identity {
        &self.ident
    }

    pub fn port(&self) -> &str {
        self.transport.port()
    }

    pub fn serial_number(&self) -> &str {
        &self.ident.serial
    }

    pub fn firmware(&self) -> Option<&str> {
        self.ident.firmware.as_deref()
    }

    /// Mode of the last completed [`set_mode`](Self::set_mode).
    pub fn current_mode(&self) -> Option<MeasurementMode> {
        self.current_mode
    }

    pub async fn write(&mut self, cmd: impl Into<Command>) -> Result<()> {
        self.transport.write(cmd).await
    }

    pub async fn read_line(&mut self) -> Result<String> {
        self.transport.read_line().await
    }

    pub async fn query(&mut self, cmd: impl Into<Command>) -> Result<String> {
        self.transport.query(cmd).await
    }

    /// Select the measurement function.
    ///
    /// Sends `CONF:<mode>`, waits for relays and ADC to settle and then
    /// discards two `MEAS?` readings. Failures of those warm-up readings are
    /// ignored. Accepts a [`MeasurementMode`] or any of its string aliases
    /// (`"VDC"`, `"volt:dc"`, `"OHM"`, ...).
    pub async fn set_mode(&mut self, mode: impl Normalize<MeasurementMode>) -> Result<()> {
        let mode = mode.normalize()?;
        self.transport.write(Command::Configure(mode)).await?;
        sleep(self.timing.mode_settle).await;

        for _ in 0..self.timing.warm_up_queries {
            if let Err(err) = self.transport.query(Command::Measure).await {
                debug!(error = %err, "warm-up measurement failed");
            }
            sleep(self.timing.warm_up_interval).await;
        }

        self.current_mode = Some(mode);
        Ok(())
    }

    /// Select the measurement speed with `RATE <speed>`.
    pub async fn set_rate(&mut self, speed: impl Normalize<MeasurementSpeed>) -> Result<()> {
        let speed = speed.normalize()?;
        self.transport.write(Command::Rate(speed)).await?;
        sleep(self.timing.rate_settle).await;
        Ok(())
    }

    /// Take one reading in the current mode.
    ///
    /// Issues a single `MEAS?` and nothing else, so the display of the
    /// instrument does not flicker. Without a prior
    /// [`set_mode`](Self::set_mode) the instrument answers in whatever mode
    /// it is in.
    pub async fn measure(&mut self) -> Result<f64> {
        let resp = self.transport.query(Command::Measure).await?;
        if resp.is_empty() {
            return Err(ProtoError::EmptyResponse);
        }
        resp.parse::<f64>()
            .map_err(|_| ProtoError::NonNumericResponse(resp))
    }

    /// Release the serial port. Further operations fail with
    /// [`ProtoError::Closed`].
    pub fn close(&mut self) {
        self.transport.close();
    }
}
