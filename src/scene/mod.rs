// The scene compositor interface
//
// Stratus only marshals protocol state; putting pixels on screen is
// the job of a scene compositor living behind these traits. The
// protocol side creates one actor per surface, hands it buffers and
// damage, and gets told once per frame when painting has finished so
// the frame callback queue can be drained.
//
// Austin Shafer - 2023
extern crate wayland_server as ws;
use ws::protocol::wl_buffer;

use crate::atmosphere::SurfaceId;
use utils::Result;

pub mod headless;

/// Invoked by the stage once per finished paint
pub type PaintHandler = Box<dyn FnMut() + Send>;

/// A scene-graph node owned by one Surface
///
/// An actor displays the contents of whatever buffer is currently
/// bound to it. The handle owns its linkage into the stage: dropping
/// it without calling destroy leaks the scene node, so the Surface
/// destructor is responsible for calling destroy exactly once.
pub trait Actor: Send {
    /// Bind a client buffer to be displayed on the next paint.
    ///
    /// The stage may refuse a buffer it cannot sample from, in which
    /// case the caller logs it and moves on. The protocol state is
    /// updated either way.
    fn attach_buffer(&mut self, buffer: &wl_buffer::WlBuffer) -> Result<()>;

    /// Mark a region of the bound buffer as needing a repaint
    fn damage_buffer(&mut self, buffer: &wl_buffer::WlBuffer, x: i32, y: i32, width: i32, height: i32);

    /// Tear this actor down and unlink it from the stage
    fn destroy(&mut self);
}

/// The single top-level scene node hosting all surface actors
pub trait Stage: Send {
    /// Set the logical pixel size of the stage
    fn set_size(&mut self, width: i32, height: i32);

    /// Create an actor bound to the given surface and link it
    /// into the stage
    fn actor_new(&mut self, surface: SurfaceId) -> Box<dyn Actor>;

    /// Register a handler invoked once per finished paint. The
    /// compositor connects exactly one of these at startup.
    fn connect_paint_finished(&mut self, handler: PaintHandler);

    /// Run one paint cycle. Fires the paint-finished handlers
    /// after the frame is done.
    fn paint(&mut self);
}
