//! Device listing.

use clap::Args;
use equwu_core::{AudioDevice, DeviceType};

#[derive(Args)]
pub struct DevicesArgs {
    /// Print as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    let devices = AudioDevice::enumerate_all()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    for device_type in [DeviceType::Input, DeviceType::Output] {
        println!("{:?} devices:", device_type);
        for device in devices.iter().filter(|d| d.device_type == device_type) {
            let marker = if device.is_default { "*" } else { " " };
            let stereo = if device.supports_stereo() { "" } else { " (mono only)" };
            println!(
                "  {} {} [{} ch, {:?} Hz]{}",
                marker, device.name, device.max_channels, device.sample_rates, stereo
            );
        }
        println!();
    }
    Ok(())
}
