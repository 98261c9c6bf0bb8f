use std::time::Duration;
use xdm1000ctrl::{Device, DeviceConfig, MeasurementMode, MeasurementSpeed, ProtoError};

#[tokio::main]
async fn main() {
    println!("Searching for first OWON XDM1xxx instrument...\n");
    if let Err(e) = sweep().await {
        println!("ERROR: {}", e);
    }
}

async fn sweep() -> Result<(), ProtoError> {
    let mut device = Device::connect(DeviceConfig::default()).await?;
    println!("Connected to: {}", device.ident().raw);
    println!("Port: {}", device.port());
    println!(
        "Serial: {}, FW: {}\n",
        device.serial_number(),
        device.firmware().unwrap_or("-")
    );

    for mode in MeasurementMode::ALL {
        println!("=== MODE: {} ({}) ===", mode.name(), mode);
        device.set_mode(mode).await?;

        for speed in MeasurementSpeed::ALL {
            println!("  RATE: {} ({})", speed.name(), speed);
            device.set_rate(speed).await?;

            for i in 1..=3 {
                match device.measure().await {
                    Ok(value) => println!("    Measurement {}: {}", i, value),
                    Err(e) => println!("    Measurement {} FAILED: {}", i, e),
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        }
        println!();
    }
    Ok(())
}
