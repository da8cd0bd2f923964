use std::io::BufRead;
use std::time::Duration;

use rs485_sync::link::Link;
use rs485_sync::measure::{HeldValue, SineSource};
use rs485_sync::transport::{self, SerialBus};
use rs485_sync::{LinkConfig, Mode, Role};

/// Console demo: a master and a follower joined by an in-memory bus, or a
/// single node on a real port when one is given.
///
/// Usage:
///   link_demo                       both roles over loopback
///   link_demo <port> master|follower  one role on a serial port
#[tokio::main]
async fn main() -> rs485_sync::Result<()> {
    tracing_subscriber::fmt::init();

    // The demo slows the 100 us control period down to something a console
    // can follow.
    let control_period = Duration::from_millis(10);

    let mut master_config = LinkConfig::new(Role::Master);
    master_config.control_period = control_period;
    let mut follower_config = LinkConfig::new(Role::Follower);
    follower_config.control_period = control_period;

    // The follower measures a simulated mains ripple around the reference.
    let sine = SineSource::new(0.5, 32.0, 50.0, 100.0);

    let args: Vec<String> = std::env::args().collect();
    let handle = match args.get(1) {
        None => {
            let (master_bus, follower_bus) = transport::loopback(32);
            let (master, master_handle) =
                Link::new(master_config, master_bus, Box::new(HeldValue::new()));
            let (follower, _follower_handle) =
                Link::new(follower_config, follower_bus, Box::new(sine));

            tokio::spawn(master.run());
            tokio::spawn(follower.run());
            master_handle
        }
        Some(port) => {
            let follower = args.get(2).map(String::as_str) == Some("follower");
            let (config, source): (_, Box<dyn rs485_sync::measure::MeasurementSource>) =
                if follower {
                    (follower_config, Box::new(sine))
                } else {
                    (master_config, Box::new(HeldValue::new()))
                };

            let bus = SerialBus::open(port, &config)?;
            let (link, handle) = Link::new(config, bus, source);
            tokio::spawn(link.run());
            handle
        }
    };

    // Console keys, same bindings as the original menu.
    let (key_tx, mut key_rx) = tokio::sync::mpsc::channel(8);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            if let Some(key) = line.trim().chars().next() {
                if key_tx.blocking_send(key).is_err() {
                    break;
                }
            }
        }
    });

    print_menu();

    let mut status_interval = tokio::time::interval(Duration::from_secs(2));

    loop {
        tokio::select! {
            _ = status_interval.tick() => {
                let status = handle.status().await?;
                println!(
                    "role={:?} mode={:?} vref={:.2} vmeas={:.2}",
                    status.role, status.mode, status.voltage_ref, status.voltage_meas
                );
            }

            key = key_rx.recv() => match key {
                Some('i') => handle.set_mode(Mode::Idle).await?,
                Some('p') => handle.set_mode(Mode::Power).await?,
                Some('h') => print_menu(),
                Some('q') | None => break,
                Some(_) => {}
            },
        }
    }

    Ok(())
}

fn print_menu() {
    println!(" ________________________________________ ");
    println!("|      ---- RS485 MENU ----              |");
    println!("|     press i : idle mode                |");
    println!("|     press p : power mode               |");
    println!("|     press h : this menu                |");
    println!("|     press q : quit                     |");
    println!("|________________________________________|");
}
