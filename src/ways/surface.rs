// wl_surface interface
//
// The wayland surface represents an on screen buffer. This file
// processes surface requests and keeps the surface<->buffer
// attachment graph consistent; drawing is forwarded to the surface's
// scene actor.
//
// Austin Shafer - 2023
extern crate wayland_server as ws;
use ws::protocol::wl_surface::Request;
use ws::protocol::{wl_buffer, wl_callback, wl_surface as wlsi};
use ws::Resource;

use super::buffer::{buffer_damaged, Buffer};
use crate::atmosphere::{Atmosphere, BufferId, SurfaceId};
use crate::scene::{Actor, Stage};
use crate::ways::compositor::Climate;
use utils::log;

use std::ops::DerefMut;
use std::sync::{Arc, Mutex};

// Dispatch<Interface, Userdata>
#[allow(unused_variables)]
impl ws::Dispatch<wlsi::WlSurface, Arc<Mutex<Surface>>> for Climate {
    fn request(
        state: &mut Self,
        client: &ws::Client,
        resource: &wlsi::WlSurface,
        request: Request,
        data: &Arc<Mutex<Surface>>,
        dhandle: &ws::DisplayHandle,
        data_init: &mut ws::DataInit<'_, Self>,
    ) {
        let Climate { c_atmos, c_stage } = state;

        match request {
            // Damage against the buffer fans out to every surface
            // sharing it, so it must not run under this surface's
            // lock. Grab the attached buffer id and let go.
            Request::DamageBuffer {
                x,
                y,
                width,
                height,
            } => {
                let buf_id = data.lock().unwrap().attached_buffer_id();
                match buf_id {
                    Some(id) => buffer_damaged(
                        c_atmos.lock().unwrap().deref_mut(),
                        &id,
                        x,
                        y,
                        width,
                        height,
                    ),
                    None => log::debug!("damage_buffer on a surface with no buffer"),
                }
            }
            req => data.lock().unwrap().handle_request(
                c_atmos.lock().unwrap().deref_mut(),
                c_stage.as_mut(),
                resource,
                data_init,
                req,
            ),
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: ws::backend::ClientId,
        _resource: ws::backend::ObjectId,
        surf: &Arc<Mutex<Surface>>,
    ) {
        surf.lock()
            .unwrap()
            .destroy(state.c_atmos.lock().unwrap().deref_mut());
    }
}

/// Private structure for a wayland surface
///
/// A surface represents a visible area on screen. Desktop
/// organization effects are the job of a 'shell' interface, not
/// this. A surface has at most one buffer attached at a time, while
/// one buffer may be attached to many surfaces.
#[allow(dead_code)]
pub struct Surface {
    pub s_id: SurfaceId,
    /// The currently attached buffer record. Shared ownership with
    /// the atmosphere's registry: holding this keeps the record
    /// valid even if the registry entry goes away first.
    pub s_buffer: Option<Arc<Mutex<Buffer>>>,
    /// The scene node displaying this surface. Created on the first
    /// successful attach and kept for the surface's whole life;
    /// later attaches update it in place.
    s_actor: Option<Box<dyn Actor>>,
    /// Position hints from attach. Accepted but not acted upon at
    /// this layer.
    s_x: i32,
    s_y: i32,
    /// Validates that we cleaned this surf up correctly
    s_is_destroyed: bool,
}

impl Surface {
    // create a new surface record for the given id
    pub fn new(id: SurfaceId) -> Surface {
        Surface {
            s_id: id,
            s_buffer: None,
            s_actor: None,
            s_x: 0,
            s_y: 0,
            s_is_destroyed: false,
        }
    }

    /// The id of the buffer record currently attached, if any
    pub fn attached_buffer_id(&self) -> Option<BufferId> {
        self.s_buffer
            .as_ref()
            .map(|b| b.lock().unwrap().b_id.clone())
    }

    /// Does this surface have a scene actor yet?
    pub fn has_actor(&self) -> bool {
        self.s_actor.is_some()
    }

    // Handle a request from a client
    //
    // Called by wayland-rs, this function dispatches
    // to the correct handling function.
    pub fn handle_request(
        &mut self,
        atmos: &mut Atmosphere,
        stage: &mut dyn Stage,
        surf: &wlsi::WlSurface,
        data_init: &mut ws::DataInit<'_, Climate>,
        req: Request,
    ) {
        match req {
            Request::Attach { buffer, x, y } => self.attach(atmos, stage, surf, buffer, x, y),
            Request::Frame { callback } => {
                let callback_resource = data_init.init(callback, ());
                atmos.enqueue_frame_callback(callback_resource);
            }
            // Surface-coordinate damage is accepted but not acted
            // upon; damage reaches us through the buffer path.
            Request::Damage {
                x,
                y,
                width,
                height,
            } => {
                log::verbose!(
                    "Surface {:?}: ignoring surface damage {},{} {}x{}",
                    self.s_id,
                    x,
                    y,
                    width,
                    height
                );
            }
            // Attach takes effect immediately in this core, so
            // commit has nothing left to apply.
            Request::Commit => {}
            Request::SetOpaqueRegion { region: _ } => {}
            Request::SetInputRegion { region: _ } => {}
            Request::SetBufferScale { scale } => {
                if scale != 1 {
                    log::error!("Surface {:?}: buffer scale {} not supported", self.s_id, scale);
                }
            }
            Request::SetBufferTransform { transform: _ } => {}
            // wayland-rs runs the registered destructor for us, the
            // teardown happens in the destroy hook
            Request::Destroy => {}
            other => log::error!("Surface {:?}: unhandled request {:?}", self.s_id, other),
        }
    }

    // attach a wl_buffer to the surface
    //
    // The client crafts a buffer with care, and tells us that it
    // will be backing the surface represented by `surf`. On the
    // first attach the surface gets its scene actor; afterwards the
    // actor is just pointed at the new buffer.
    fn attach(
        &mut self,
        atmos: &mut Atmosphere,
        stage: &mut dyn Stage,
        _surf: &wlsi::WlSurface,
        buf: Option<wl_buffer::WlBuffer>,
        x: i32,
        y: i32,
    ) {
        let buf = match buf {
            Some(b) => b,
            // a null attach removes the current buffer
            None => {
                self.detach(atmos);
                return;
            }
        };

        let id = BufferId::new(buf.id());

        // In the case where we are reattaching the same buffer we
        // simply bail out. This is important: without it the detach
        // below could end up destroying the very record we are
        // trying to attach.
        if let Some(cur) = self.s_buffer.as_ref() {
            if cur.lock().unwrap().b_id == id {
                log::debug!("Surface {:?}: reattach of buffer {:?} is a no-op", self.s_id, id);
                return;
            }
        }

        self.detach(atmos);

        // The shm path will have told us about its buffers already,
        // but this is the first we hear of anything else. Mint a
        // record lazily in that case.
        let record = match atmos.get_buffer(&id) {
            Some(r) => r,
            None => {
                let r = Arc::new(Mutex::new(Buffer::new(id.clone(), buf.clone())));
                atmos.add_buffer(id.clone(), r.clone());
                r
            }
        };

        {
            let mut buffer = record.lock().unwrap();
            debug_assert!(!buffer.b_attached_to.contains(&self.s_id));
            buffer.b_attached_to.push(self.s_id);
        }

        if self.s_actor.is_none() {
            self.s_actor = Some(stage.actor_new(self.s_id));
        }

        if let Err(e) = self.s_actor.as_mut().unwrap().attach_buffer(&buf) {
            // The attach graph has been updated either way, painting
            // is what's broken
            log::error!(
                "Surface {:?}: stage refused wl_buffer {:?}: {:?}",
                self.s_id,
                id,
                e
            );
        }

        self.s_x = x;
        self.s_y = y;
        self.s_buffer = Some(record);
    }

    // Remove this surface from its buffer's attached set
    //
    // If that leaves the record with no attached surfaces and no
    // protocol identity, the record is dropped from the registry.
    fn detach(&mut self, atmos: &mut Atmosphere) {
        if let Some(record) = self.s_buffer.take() {
            let mut buffer = record.lock().unwrap();
            buffer.b_attached_to.retain(|sid| *sid != self.s_id);

            if buffer.b_attached_to.is_empty() && !buffer.b_proto_alive {
                let id = buffer.b_id.clone();
                drop(buffer);
                atmos.remove_buffer(&id);
            }
        }
    }

    /// Forward buffer damage to our actor
    ///
    /// Called during damage fan-out for every surface attached to
    /// the damaged buffer.
    pub fn damage_from_buffer(
        &mut self,
        buffer: &wl_buffer::WlBuffer,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
    ) {
        if let Some(actor) = self.s_actor.as_mut() {
            actor.damage_buffer(buffer, x, y, width, height);
        }
    }

    // Destroy this surface
    //
    // Runs from the resource destroy hook, either because the client
    // destroyed the wl_surface or because it disconnected. Unhooks
    // us from the compositor list, the buffer record, and the stage.
    pub fn destroy(&mut self, atmos: &mut Atmosphere) {
        if self.s_is_destroyed {
            return;
        }
        self.s_is_destroyed = true;
        log::debug!("Destroying surface {:?}", self.s_id);

        atmos.remove_surface(&self.s_id);
        self.detach(atmos);

        if let Some(mut actor) = self.s_actor.take() {
            actor.destroy();
        }
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        if !self.s_is_destroyed {
            log::error!("Surface {:?} was dropped without being destroyed", self.s_id);
        }
    }
}

// Add empty definition for wl_callback
#[allow(unused_variables)]
impl ws::Dispatch<wl_callback::WlCallback, ()> for Climate {
    fn request(
        state: &mut Self,
        client: &ws::Client,
        resource: &wl_callback::WlCallback,
        request: wl_callback::Request,
        data: &(),
        dhandle: &ws::DisplayHandle,
        data_init: &mut ws::DataInit<'_, Self>,
    ) {
    }

    fn destroyed(
        state: &mut Self,
        _client: ws::backend::ClientId,
        _resource: ws::backend::ObjectId,
        data: &(),
    ) {
    }
}
