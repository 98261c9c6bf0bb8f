//!
//! This library provides communication with an OWON XDM1000 series bench
//! multimeter (XDM1041, XDM1241) over its USB serial port.
//!
//! <br>
//!
//! # Details
//!
//! - The instrument is located automatically by sending `*IDN?` to every
//!   serial port of the host. Optionally only an instrument whose serial
//!   number contains a given substring is accepted.
//!
//! - Changing the measurement mode takes a few seconds: the meter needs time
//!   for its relays and ADC to settle, and the first readings afterwards are
//!   discarded.
//!
//! - Basic setup and measurement
//!
//!   ```no_run
//!   use xdm1000ctrl::{Device, DeviceConfig, MeasurementSpeed};
//!   #[tokio::main]
//!   async fn main() -> xdm1000ctrl::Result<()> {
//!       let mut device = Device::connect(DeviceConfig::default().serial_suffix("1543")).await?;
//!       eprintln!("Connected to: {}\n", device.ident().raw);
//!       device.set_mode("VDC").await?;
//!       device.set_rate(MeasurementSpeed::Fast).await?;
//!       println!("V = {}", device.measure().await?);
//!       Ok(())
//!   }
//!   ```
//!
//! # Supported devices
//!
//!  * OWON XDM1041
//!  * OWON XDM1241
//!

use std::time::Duration;

pub mod device;
pub mod discovery;
pub mod mode;
pub mod proto;

pub use device::{Device, DeviceConfig};
pub use mode::{normalize, MeasurementMode, MeasurementSpeed, Normalize};
pub use proto::response::Identity;
pub use proto::transport::Timing;
pub use proto::{ProtoError, Result};

/// Default Baudrate for the XDM1000 series.
pub const DEFAULT_BAUDRATE: u32 = 115200;

/// Default read and write timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(500);
