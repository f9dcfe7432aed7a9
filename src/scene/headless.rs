// A stage that doesn't put anything on screen
//
// This is what the binary runs with until a real renderer is wired
// up: it accepts every buffer, tracks nothing, and immediately
// reports each paint as finished. Useful for protocol bringup and
// for clients that only care about callback pacing.
//
// Austin Shafer - 2023
extern crate wayland_server as ws;
use ws::protocol::wl_buffer;
use ws::Resource;

use super::{Actor, PaintHandler, Stage};
use crate::atmosphere::SurfaceId;
use crate::ways::shm::ShmBuffer;
use utils::{log, Result};

use std::sync::Arc;

pub struct HeadlessStage {
    hs_width: i32,
    hs_height: i32,
    /// paint-finished listeners, fired in registration order
    hs_handlers: Vec<PaintHandler>,
}

impl HeadlessStage {
    pub fn new() -> HeadlessStage {
        HeadlessStage {
            hs_width: 0,
            hs_height: 0,
            hs_handlers: Vec::new(),
        }
    }
}

impl Stage for HeadlessStage {
    fn set_size(&mut self, width: i32, height: i32) {
        log::debug!("Headless stage resized to {}x{}", width, height);
        self.hs_width = width;
        self.hs_height = height;
    }

    fn actor_new(&mut self, surface: SurfaceId) -> Box<dyn Actor> {
        log::debug!("Creating headless actor for surface {:?}", surface);
        Box::new(HeadlessActor {
            ha_surface: surface,
        })
    }

    fn connect_paint_finished(&mut self, handler: PaintHandler) {
        self.hs_handlers.push(handler);
    }

    fn paint(&mut self) {
        log::profiling!("Headless paint");
        // nothing to draw, so the frame is finished as soon
        // as it started
        for handler in self.hs_handlers.iter_mut() {
            handler();
        }
    }
}

pub struct HeadlessActor {
    ha_surface: SurfaceId,
}

impl Actor for HeadlessActor {
    fn attach_buffer(&mut self, buffer: &wl_buffer::WlBuffer) -> Result<()> {
        // shm buffers carry their layout in the user data
        match buffer.data::<Arc<ShmBuffer>>() {
            Some(shm) => log::debug!(
                "Surface {:?}: attached {}x{} {:?} shm wl_buffer {:?}",
                self.ha_surface,
                shm.sb_width,
                shm.sb_height,
                shm.sb_format,
                buffer.id()
            ),
            None => log::debug!(
                "Surface {:?}: attached wl_buffer {:?}",
                self.ha_surface,
                buffer.id()
            ),
        }
        Ok(())
    }

    fn damage_buffer(
        &mut self,
        buffer: &wl_buffer::WlBuffer,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) {
        log::verbose!(
            "Surface {:?}: damage wl_buffer {:?} at {},{} {}x{}",
            self.ha_surface,
            buffer.id(),
            x,
            y,
            width,
            height
        );
    }

    fn destroy(&mut self) {
        log::debug!("Destroying headless actor for surface {:?}", self.ha_surface);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn paint_fires_every_connected_handler() {
        let mut stage = HeadlessStage::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let c = count.clone();
            stage.connect_paint_finished(Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }));
        }

        stage.paint();
        stage.paint();
        assert_eq!(count.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn set_size_is_recorded() {
        let mut stage = HeadlessStage::new();
        stage.set_size(800, 600);
        assert_eq!((stage.hs_width, stage.hs_height), (800, 600));
    }
}
