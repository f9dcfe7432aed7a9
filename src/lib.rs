//! # Stratus
//!
//! Stratus is a small wayland compositor core that marshals protocol
//! state between clients and a single scene-compositor stage. It owns
//! the global object registry, the surface and buffer records, the shm
//! pool plumbing, and the frame callback queue; everything visual is
//! delegated to a [`scene::Stage`] implementation.
//!
//! ## Design
//!
//! The wayland singleton and globals are created in `ways/compositor.rs`.
//! Effectively, that is the "main" file of the protocol side: the
//! display is created, then a global object advertising each supported
//! protocol is registered.
//!
//! All compositor-wide records are kept in the `Atmosphere`: the live
//! surface list, the buffer records, the synthetic outputs, and the
//! frame callback FIFO. Protocol handlers get a reference to the global
//! atmosphere and update it as requests come in; the paint loop reads
//! it back out when signalling frame callbacks.
//!
//! ## Wayland api
//!
//! Wayland is very callback-driven, so we implement a series of
//! handlers that react to requests from clients and update our
//! compositor's state. This is done with the wayland-server crate
//! (part of the smithay project), which generates the protocol
//! marshalling and calls into our `Dispatch` implementations.
//!
//! Stratus does not use a high level wayland library such as wlroots or
//! smithay for a few reasons:
//! * It reduces the dependency count.
//! * One of our primary goals is to create a system which is easy to
//! read and hack on. wayland-server provides enough of a wrapper around
//! the wayland api to make programming easy, but not so much that it
//! gets in our way.
//! * To give stratus more control over itself. We can choose how we
//! implement every last detail.

// Austin Shafer - 2023
pub mod atmosphere;
pub mod scene;
pub mod ways;

use scene::headless::HeadlessStage;
use utils::{log, Context, Result};
use ways::compositor::EventManager;

use std::thread;

// The stratus compositor
//
// This is the top layer of the cloud deck. Instead of holding
// subsystem structures, it holds the thread handle that the wayland
// subsystem is running in.
#[allow(dead_code)]
pub struct Stratus {
    // The wayland subsystem
    //
    // Stratus - Graphical desktop compositor
    // ways::Compositor - wayland protocol compositor object
    st_wc: Option<thread::JoinHandle<()>>,
}

impl Stratus {
    // This is a cooler way of saying new
    pub fn spin() -> Stratus {
        Stratus {
            st_wc: Some(
                thread::Builder::new()
                    .name("wayland_compositor".to_string())
                    .spawn(|| {
                        let mut ev = EventManager::new(Box::new(HeadlessStage::new()))
                            .expect("Could not create the wayland subsystem");
                        if let Err(e) = ev.run() {
                            log::error!("wayland subsystem exited: {:?}", e);
                        }
                    })
                    .unwrap(),
            ),
        }
    }

    // This is the main loop of the entire system
    // We just wait for the other threads
    pub fn run_forever(&mut self) -> Result<()> {
        self.st_wc
            .take()
            .context("The compositor thread has already been joined")?
            .join()
            .ok();
        Ok(())
    }
}
