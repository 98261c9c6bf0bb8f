#![deny(clippy::unwrap_used)]

use chrono::Local;
use clap::{arg, command, value_parser};
use std::process::exit;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use xdm1000ctrl::discovery::list_ports;
use xdm1000ctrl::{
    Device, DeviceConfig, MeasurementMode, MeasurementSpeed, ProtoError, Result,
    DEFAULT_BAUDRATE,
};

#[tokio::main]
async fn main() {
    let matches = command!() // requires `cargo` feature
        .arg(
            arg!(
                -s --serial <SUFFIX> "Only use an instrument whose serial number contains SUFFIX"
            )
            .required(false),
        )
        .arg(
            arg!(
                -p --port <PORT> "Only probe this serial port"
            )
            .required(false),
        )
        .arg(arg!(
            -d --debug ... "Turn debugging information on"
        ))
        .arg(
            arg!(
                -b --baudrate <BAUDRATE> "Baudrate"
            )
            .default_value(DEFAULT_BAUDRATE.to_string())
            .value_parser(value_parser!(u32)),
        )
        .arg(
            arg!(
                -t --timeout <MS> "Read and write timeout in milliseconds"
            )
            .default_value("500")
            .value_parser(value_parser!(u64)),
        )
        .subcommand(clap::Command::new("ports").about("List serial ports of this host"))
        .subcommand(clap::Command::new("ident").about("Device identification"))
        .subcommand(
            clap::Command::new("measure")
                .about("Read measurements")
                .arg(
                    arg!([mode] "Measurement mode, e.g. VDC, VAC, IDC, IAC, RES, CAP, FREQ")
                        .value_parser(|s: &str| s.parse::<MeasurementMode>()),
                )
                .arg(
                    arg!(-r --rate <RATE> "Measurement speed: FAST, MEDIUM or SLOW")
                        .required(false)
                        .value_parser(|s: &str| s.parse::<MeasurementSpeed>()),
                )
                .arg(
                    arg!(-n --count <N> "Number of readings, 0 reads forever")
                        .default_value("1")
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    arg!(-i --interval <MS> "Pause between readings in milliseconds")
                        .default_value("1000")
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(
            clap::Command::new("sweep")
                .about("Measure in every mode at every speed")
                .arg(
                    arg!(-n --count <N> "Readings per mode and speed")
                        .default_value("3")
                        .value_parser(value_parser!(u64)),
                ),
        )
        .subcommand(
            clap::Command::new("raw")
                .about("Send a single command, commands ending in '?' print the answer")
                .arg(arg!(<command> "SCPI command, e.g. SYST:BEEP or FUNC?")),
        )
        .subcommand_required(true)
        .get_matches();

    init_logging(matches.get_count("debug"));

    if let Err(e) = handle_args(&matches).await {
        match &e {
            ProtoError::Serial(err) => {
                eprintln!("Serial I/O Error: {}", err);
            }
            ProtoError::Io(err) => {
                eprintln!("I/O Error: {}", err);
            }
            ProtoError::Closed => {
                eprintln!("Failed to communicate with device, aborting!");
            }
            ProtoError::InstrumentNotFound(_) => {
                eprintln!("{}. Is the meter connected and switched on?", e);
            }
            ProtoError::UnrecognizedToken { .. }
            | ProtoError::EmptyResponse
            | ProtoError::NonNumericResponse(_) => {
                eprintln!("{}", e);
            }
        }
        exit(-1);
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("xdm1000ctrl={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn config_from_args(matches: &clap::ArgMatches) -> DeviceConfig {
    let mut config = DeviceConfig::default();
    if let Some(suffix) = matches.get_one::<String>("serial") {
        config = config.serial_suffix(suffix);
    }
    if let Some(port) = matches.get_one::<String>("port") {
        config = config.port(port);
    }
    if let Some(baudrate) = matches.get_one::<u32>("baudrate") {
        config = config.baudrate(*baudrate);
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config = config.timeout(Duration::from_millis(*timeout));
    }
    config
}

async fn handle_args(matches: &clap::ArgMatches) -> Result<()> {
    if let Some(("ports", _args)) = matches.subcommand() {
        for port in list_ports()? {
            println!("{}", port);
        }
        return Ok(());
    }

    let mut device = Device::connect(config_from_args(matches)).await?;
    eprintln!("Connected to: {} [{}]\n", device.ident().raw, device.port());

    match matches.subcommand() {
        // Device ID
        Some(("ident", _args)) => {
            let ident = device.ident();
            println!("Manufacturer: {}", ident.manufacturer);
            println!("Model: {}", ident.model);
            println!("Serial: {}", ident.serial);
            println!("Firmware: {}", ident.firmware.as_deref().unwrap_or("-"));
            println!("Port: {}", device.port());
        }
        Some(("measure", args)) => {
            if let Some(mode) = args.get_one::<MeasurementMode>("mode") {
                device.set_mode(*mode).await?;
            }
            if let Some(rate) = args.get_one::<MeasurementSpeed>("rate") {
                device.set_rate(*rate).await?;
            }
            let count = args.get_one::<u64>("count").copied().unwrap_or(1);
            let interval =
                Duration::from_millis(args.get_one::<u64>("interval").copied().unwrap_or(1000));

            let mut n = 0;
            while count == 0 || n < count {
                if n > 0 {
                    tokio::time::sleep(interval).await;
                }
                let ts = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
                match device.measure().await {
                    Ok(value) => println!("{}  {}", ts, value),
                    Err(ProtoError::Closed) => return Err(ProtoError::Closed),
                    Err(e) => println!("{}  FAILED: {}", ts, e),
                }
                n += 1;
            }
        }
        Some(("sweep", args)) => {
            let count = args.get_one::<u64>("count").copied().unwrap_or(3);
            for mode in MeasurementMode::ALL {
                println!("=== MODE: {} ({}) ===", mode.name(), mode.token());
                device.set_mode(mode).await?;

                for speed in MeasurementSpeed::ALL {
                    println!("  RATE: {} ({})", speed.name(), speed.token());
                    device.set_rate(speed).await?;

                    for i in 1..=count {
                        match device.measure().await {
                            Ok(value) => println!("    Measurement {}: {}", i, value),
                            Err(e) => println!("    Measurement {} FAILED: {}", i, e),
                        }
                        tokio::time::sleep(Duration::from_millis(200)).await;
                    }
                }
                println!();
            }
        }
        Some(("raw", args)) => {
            if let Some(command) = args.get_one::<String>("command") {
                if command.trim_end().ends_with('?') {
                    println!("{}", device.query(command.as_str()).await?);
                } else {
                    device.write(command.as_str()).await?;
                    println!("OK");
                }
            }
        }
        _ => unreachable!("subcommand is required"),
    }

    device.close();
    Ok(())
}
