//! Print the zones of a Raumfeld system and what they play
//!
//! Run with: RAUMFELD_HOST=192.168.1.20 cargo run -p raumfeld-sdk --example zone_status

use std::time::Duration;

use raumfeld_sdk::logging::{init_logging, LoggingMode};
use raumfeld_sdk::{RaumfeldHost, SdkError};

fn main() -> Result<(), SdkError> {
    if let Err(e) = init_logging(LoggingMode::Development) {
        eprintln!("logging disabled: {}", e);
    }

    let host = RaumfeldHost::from_env()?;
    if !host.host_is_valid() {
        eprintln!("{} does not look like a Raumfeld host", host.location());
        return Ok(());
    }

    host.start()?;
    host.wait_ready_timeout(Duration::from_secs(15))?;

    let snapshot = host.snapshot()?;
    println!(
        "Host {} (room {})",
        snapshot.host_name().unwrap_or("?"),
        snapshot.host_room().unwrap_or("?")
    );
    if snapshot.update_available {
        println!("A firmware update is available");
    }

    for zone in snapshot.zones.values() {
        let names: Vec<&str> = zone
            .rooms
            .iter()
            .filter_map(|id| snapshot.room_by_id(id).map(|r| r.name.as_str()))
            .collect();
        let playing = zone
            .media
            .as_ref()
            .and_then(|m| m.title.as_deref())
            .unwrap_or("-");
        println!("[{}] {:?}: {}", names.join(", "), zone.playback, playing);
    }

    for room in snapshot.rooms.iter().filter(|r| r.zone.is_none()) {
        println!("unassigned: {} ({:?})", room.name, room.power_state);
    }

    host.stop();
    Ok(())
}
