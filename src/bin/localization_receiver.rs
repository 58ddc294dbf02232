use anyhow::Result;
use clap::Parser;
use std::net::{SocketAddr, UdpSocket};
use waypoint_follower::localisation::{udp_localiser::UdpLocaliser, Localiser, PoseDecoder};

#[derive(Parser)]
#[command(version, about = "Print poses decoded from localization samples")]
struct Args {
    #[arg(short, long, default_value = "0.0.0.0:50000")]
    address: SocketAddr,
}

fn main() -> Result<()> {
    let args: Args = Args::parse();

    let mut localiser = UdpLocaliser::new(UdpSocket::bind(args.address)?);
    let decoder = PoseDecoder::default();
    loop {
        let sample = localiser.fetch()?;
        match decoder.decode(&sample) {
            Ok((position, heading)) => println!(
                "x: {:.2} y {:.2} heading {:.2} (normalized {:.2})",
                position.x(),
                position.y(),
                heading.degrees(),
                heading.normalized().degrees()
            ),
            Err(err) => println!("Bad sample: {}", err),
        }
    }
}
