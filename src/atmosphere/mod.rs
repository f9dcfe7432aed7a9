// The Atmosphere, our compositor-wide record store
//
// Every record the protocol handlers share lives here: the live
// surface list, the buffer records, the synthetic outputs, and the
// frame callback FIFO. Protocol objects hold a reference to the
// global atmosphere and update it as requests are dispatched; the
// paint loop reads it back out when a frame finishes.
//
// Austin Shafer - 2023
extern crate wayland_server as ws;
use ws::backend::ObjectId;
use ws::protocol::wl_callback;

use crate::ways::buffer::Buffer;
use crate::ways::surface::Surface;
use crate::ways::wl_output::Output;
use utils::log;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Surface ID
///
/// Every surface gets an id minted when the client creates it. The
/// scene compositor uses it to name actors and the buffer records use
/// it as a weak back-reference for damage fan-out. A u32 is plenty,
/// there is no way we have 4 million windows open.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct SurfaceId(u32);

impl SurfaceId {
    pub fn get_raw_id(&self) -> u32 {
        self.0
    }
}

/// Buffer ID
///
/// Identifies one client buffer record. This wraps the protocol
/// object id, which stays unique per client and per incarnation, so
/// two clients reusing the same numeric id never collide.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct BufferId(ObjectId);

impl BufferId {
    pub fn new(id: ObjectId) -> BufferId {
        BufferId(id)
    }

    /// The client-visible object id, mostly for logging
    pub fn protocol_id(&self) -> u32 {
        self.0.protocol_id()
    }
}

/// The compositor-wide state
///
/// This is the singleton record store of the wayland subsystem. It is
/// reference counted out to the protocol handlers, which perform
/// their operations and update this state. There is only ever one
/// thread dispatching, the mutexes just keep the resource user data
/// types happy.
pub struct Atmosphere {
    /// Mint for SurfaceIds
    a_next_surface_id: u32,
    /// All surfaces the compositor knows about, shared with the
    /// wl_surface resource user data
    pub a_surfaces: HashMap<SurfaceId, Arc<Mutex<Surface>>>,
    /// Buffer records, jointly owned by their protocol identity and
    /// by the surfaces attached to them. An entry is dropped when
    /// both owners are gone.
    pub a_buffers: HashMap<BufferId, Arc<Mutex<Buffer>>>,
    /// Frame throttling callbacks
    ///
    /// These are signaled in submission order on the next finished
    /// paint so clients know when to draw again.
    pub a_frame_callbacks: Vec<wl_callback::WlCallback>,
    /// The synthetic displays we advertise
    pub a_outputs: Vec<Output>,
}

impl Atmosphere {
    pub fn new() -> Atmosphere {
        Atmosphere {
            a_next_surface_id: 1,
            a_surfaces: HashMap::new(),
            a_buffers: HashMap::new(),
            a_frame_callbacks: Vec::new(),
            a_outputs: Vec::new(),
        }
    }

    /// Get a fresh id for a new surface
    pub fn mint_surface_id(&mut self) -> SurfaceId {
        let id = SurfaceId(self.a_next_surface_id);
        self.a_next_surface_id += 1;
        return id;
    }

    pub fn add_surface(&mut self, id: SurfaceId, surf: Arc<Mutex<Surface>>) {
        self.a_surfaces.insert(id, surf);
    }

    pub fn remove_surface(&mut self, id: &SurfaceId) {
        self.a_surfaces.remove(id);
    }

    pub fn get_surface(&self, id: &SurfaceId) -> Option<Arc<Mutex<Surface>>> {
        self.a_surfaces.get(id).map(|s| s.clone())
    }

    pub fn add_buffer(&mut self, id: BufferId, buf: Arc<Mutex<Buffer>>) {
        self.a_buffers.insert(id, buf);
    }

    pub fn remove_buffer(&mut self, id: &BufferId) {
        log::debug!("Dropping buffer record {:?}", id);
        self.a_buffers.remove(id);
    }

    pub fn get_buffer(&self, id: &BufferId) -> Option<Arc<Mutex<Buffer>>> {
        self.a_buffers.get(id).map(|b| b.clone())
    }

    pub fn add_output(&mut self, output: Output) -> usize {
        self.a_outputs.push(output);
        return self.a_outputs.len() - 1;
    }

    pub fn get_output(&self, index: usize) -> Option<&Output> {
        self.a_outputs.get(index)
    }

    /// Queue up a presentation promise
    ///
    /// The callback will be signalled, in submission order, by the
    /// next signal_frame_callbacks after this call.
    pub fn enqueue_frame_callback(&mut self, callback: wl_callback::WlCallback) {
        log::debug!("Queueing frame callback {:?}", callback);
        self.a_frame_callbacks.push(callback);
    }

    /// Signal all registered frame callbacks
    ///
    /// This runs from the stage's paint-finished handler. Every
    /// callback queued before this paint is fired exactly once with
    /// one shared timestamp and destroyed; wl_callback.done is a
    /// destructor event so firing it is also the destruction.
    /// Callbacks queued while we are draining (a client can submit
    /// one from a reentrant dispatch) wait for the next paint.
    pub fn signal_frame_callbacks(&mut self) {
        let callbacks = std::mem::replace(&mut self.a_frame_callbacks, Vec::new());
        if callbacks.is_empty() {
            return;
        }

        // One timestamp for the whole drain, captured at the
        // moment the paint finished
        let time = utils::timing::get_current_millis();
        log::debug!("Firing {} frame callbacks at {}", callbacks.len(), time);

        for callback in callbacks {
            callback.done(time);
        }
    }
}
