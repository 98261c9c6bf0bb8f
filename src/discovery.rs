//! Locating an XDM1000 among the serial ports of the host.
//!
//! Every port is probed once with `*IDN?` and closed again right away. The
//! first port whose answer names an OWON XDM1xxx (and, if requested, whose
//! serial number contains a given substring) wins; no further ports are
//! touched. Ports that fail to open or answer garbage are skipped.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::proto::{
    command::Command,
    response::Identity,
    transport::{Timing, Transport},
    ProtoError, Result,
};

/// Names of all serial ports currently present on the host.
pub fn list_ports() -> Result<Vec<String>> {
    Ok(tokio_serial::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}

/// Check a raw `*IDN?` answer, returns the parsed identity if the
/// instrument is acceptable.
pub fn select(idn: &str, serial_suffix: Option<&str>) -> Option<Identity> {
    if idn.trim().is_empty() {
        return None;
    }
    let identity = Identity::parse(idn)?;
    if !identity.is_supported() {
        debug!(idn, "not an OWON XDM1xxx");
        return None;
    }
    match serial_suffix {
        Some(suffix) if !identity.serial.contains(suffix) => {
            debug!(serial = %identity.serial, suffix, "serial number does not match");
            None
        }
        _ => Some(identity),
    }
}

/// Probe the given ports in order until one yields an acceptable identity.
///
/// `probe` returns the raw identity line of a port. Probe errors are logged
/// and the port is skipped.
pub async fn scan<I, F, Fut>(
    ports: I,
    serial_suffix: Option<&str>,
    mut probe: F,
) -> Result<(String, Identity)>
where
    I: IntoIterator<Item = String>,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    for port in ports {
        let idn = match probe(port.clone()).await {
            Ok(idn) => idn,
            Err(err) => {
                debug!(port = %port, error = %err, "probe failed, skipping port");
                continue;
            }
        };
        debug!(port = %port, idn = %idn, "probe answered");
        if let Some(identity) = select(&idn, serial_suffix) {
            info!(port = %port, idn = %identity.raw, "found instrument");
            return Ok((port, identity));
        }
    }
    Err(ProtoError::InstrumentNotFound(serial_suffix.map(ToOwned::to_owned)))
}

async fn probe_transport(transport: &mut Transport, timing: &Timing) -> Result<String> {
    transport.send(Command::Identify).await?;
    sleep(timing.identify_wait).await;
    transport.read_line().await
}

/// Scan the given serial ports for an XDM1000.
pub async fn discover(
    ports: Vec<String>,
    serial_suffix: Option<&str>,
    baudrate: u32,
    timeout: Duration,
    timing: &Timing,
) -> Result<(String, Identity)> {
    discover_with(ports, serial_suffix, timing, |port| async move {
        Transport::open(&port, baudrate, timeout, timing).await
    })
    .await
}

/// Like [`discover`], with `open` producing the transport of a port. Every
/// opened transport is closed before the next port is tried.
pub(crate) async fn discover_with<F, Fut>(
    ports: Vec<String>,
    serial_suffix: Option<&str>,
    timing: &Timing,
    mut open: F,
) -> Result<(String, Identity)>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Transport>>,
{
    debug!(count = ports.len(), "scanning serial ports");
    scan(ports, serial_suffix, |port| {
        let opening = open(port);
        async move {
            let mut transport = opening.await?;
            let idn = probe_transport(&mut transport, timing).await;
            transport.close();
            idn
        }
    })
    .await
}
