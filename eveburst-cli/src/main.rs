// In the long run this will hopefully become a convenient CLI command for
// sending command bursts to an EVE chip via various "normal computer" sorts
// of interfaces. For now it's just a small test bed for trying out the
// library crates in practice with a SPIDriver adapter.

use clap::Parser;
use eveburst::address::REG_CMDB_WRITE;
use eveburst::{BurstError, BurstTransfer, HostCmd};
use eveburst_spidriver::{EVESPIDriver, EVESPIDriverError};
use serial_embedded_hal::{PortSettings, Serial};
use spidriver::SPIDriver;
use std::path::PathBuf;

// A minimal coprocessor program: start a display list, clear the screen to
// a dark blue, finish the list and swap it in.
const DEMO_BURST: [u32; 6] = [
    0xffffff00, // CMD_DLSTART
    0x02000040, // CLEAR_COLOR_RGB(0, 0, 64)
    0x26000007, // CLEAR(1, 1, 1)
    0x00000000, // DISPLAY
    0xffffff01, // CMD_SWAP
    0x00000000, // padding so the FIFO write pointer stays word-aligned
];

#[derive(Parser, Debug)]
#[command(about = "Send a test command burst to an EVE chip through a SPIDriver")]
struct Args {
    /// Serial port the SPIDriver is attached to.
    #[arg(long, default_value = "/dev/ttyUSB0")]
    port: PathBuf,

    #[arg(long, default_value_t = 460800)]
    baud: usize,

    /// Don't send the host commands that start the system clock, for when
    /// the chip is already running.
    #[arg(long)]
    no_boot: bool,

    /// How many times to poll REG_ID while waiting for the chip to boot.
    #[arg(long, default_value_t = 1000)]
    boot_polls: u32,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(msg) = run(&args) {
        log::error!("{}", msg);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), String> {
    let serial = Serial::new(
        &args.port,
        &PortSettings {
            baud_rate: serial_embedded_hal::BaudRate::BaudOther(args.baud),
            char_size: serial_embedded_hal::CharSize::Bits8,
            parity: serial_embedded_hal::Parity::ParityNone,
            stop_bits: serial_embedded_hal::StopBits::Stop1,
            flow_control: serial_embedded_hal::FlowControl::FlowNone,
        },
    )
    .map_err(|err| format!("can't open {}: {:?}", args.port.display(), err))?;
    let (tx, rx) = serial.split();
    let mut sd = SPIDriver::new(tx, rx);
    if sd.unselect().is_err() {
        return Err(String::from("SPIDriver isn't responding"));
    }

    let dev = EVESPIDriver::new(sd);
    let mut host = dev.host();

    if !args.no_boot {
        host.host_command(HostCmd::CLKEXT, 0).map_err(describe)?;
        host.host_command(HostCmd::ACTIVE, 0).map_err(describe)?;
        if !host.poll_for_boot(args.boot_polls).map_err(describe)? {
            return Err(format!("chip didn't boot after {} polls", args.boot_polls));
        }
        log::info!("chip booted");
    }

    let id_data = host.read_chip_id().map_err(describe)?;
    println!(
        "Chip ID data is [{:#04x}, {:#04x}, {:#04x}, {:#04x}]",
        id_data[0], id_data[1], id_data[2], id_data[3]
    );

    let mut burst = host.burst();
    burst
        .begin_burst_to(REG_CMDB_WRITE)
        .map_err(describe_burst)?;
    for word in DEMO_BURST.iter() {
        if let Err(err) = burst.write_word(*word) {
            burst.discard_burst();
            return Err(describe_burst(err));
        }
    }
    let sent = burst.len();
    burst.end_burst().map_err(describe_burst)?;
    println!("Sent a {} byte command burst", sent);
    Ok(())
}

fn describe<TXError, RXError>(err: EVESPIDriverError<TXError, RXError>) -> String {
    match err {
        EVESPIDriverError::Comm(_) => String::from("communication with the SPIDriver failed"),
        EVESPIDriverError::ChipSelect => {
            String::from("the SPIDriver failed to change the chip select line")
        }
    }
}

fn describe_burst<TXError, RXError>(err: BurstError<EVESPIDriverError<TXError, RXError>>) -> String {
    match err {
        BurstError::Transport(err) => describe(err),
        BurstError::BufferOverflow { capacity } => {
            format!("burst is larger than {} bytes", capacity)
        }
        BurstError::TransferTimeout => String::from("burst transfer timed out"),
        BurstError::TransferFault => String::from("burst transfer faulted"),
        _ => String::from("burst API used out of sequence"),
    }
}
