//! # Wayland Server
//!
//! The files here implement the different wayland protocols we
//! support. Usually the filename is a shortened version of the
//! protocol name.
//!
//! Our wayland singleton and globals are created in `compositor.rs`.
//! Effectively, that is the "main" file in this directory. The
//! wayland display is created, then a global object advertising each
//! supported protocol is registered: wl_compositor, wl_shm, wl_shell,
//! and one wl_output per synthetic display.
//!
//! The interesting state lives in two places: each wl_surface
//! resource carries its `Surface` record as user data, and the
//! compositor-wide records (buffer registry, frame callback FIFO,
//! outputs) live in the `Atmosphere`. The `Climate` struct in
//! `compositor.rs` is the dispatch state wayland-server threads
//! through every handler, carrying the atmosphere and the scene
//! stage.

// Austin Shafer - 2023

// Supported protocols
pub mod buffer;
pub mod compositor;
pub mod shm;
pub mod surface;
pub mod wl_output;
pub mod wl_region;
pub mod wl_shell;
