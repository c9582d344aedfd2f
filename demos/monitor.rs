use modlink::{ReceivedData, SerialTransport, Transport};

use std::io::BufRead;

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let Some(port_name) = args.next() else {
        eprintln!("usage: monitor <port> [baud]");
        std::process::exit(2);
    };
    let baud_rate = args
        .next()
        .and_then(|b| b.parse().ok())
        .unwrap_or(modlink::settings::DEFAULT_BAUD_RATE);

    let port = SerialTransport::new(port_name, baud_rate);
    port.subscribe(Box::new(|data: &ReceivedData| {
        println!("<- {:02X?}", data.as_bytes());
    }));

    if !port.connect() {
        eprintln!("could not open {} (run with RUST_LOG=debug for details)", port.port_name());
        std::process::exit(1);
    }
    println!(
        "Connected to {} at {} baud ({})",
        port.port_name(),
        port.baud_rate(),
        port.framing()
    );

    // each stdin line is sent as-is, without the newline
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        println!("-> {:?}: {}", line, port.send(line.as_bytes()));
    }

    port.disconnect();
}
