use xdm1000ctrl::{Device, DeviceConfig};

#[tokio::main]
async fn main() -> xdm1000ctrl::Result<()> {
    let mut device = Device::connect(DeviceConfig::default()).await?;
    eprintln!("Connected to: {} [{}]\n", device.ident().model, device.port());
    device.set_mode("VDC").await?;
    println!("V = {}", device.measure().await?);
    Ok(())
}
