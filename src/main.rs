// A scene-graph backed wayland compositor core
//
// Austin Shafer - 2023
use stratus::Stratus;

use std::time::SystemTime;

// This should remain completely safe.
fn main() {
    let mut deck = Stratus::spin();

    println!("Begin dispatch loop...");
    let start = SystemTime::now();
    deck.run_forever().unwrap();
    let end = SystemTime::now();

    println!(
        "uptime: {}",
        end.duration_since(start).unwrap().as_secs_f32()
    );
}
