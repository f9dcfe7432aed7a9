// Client buffer records
//
// A Buffer tracks one client pixel buffer and the set of surfaces it
// is currently attached to. One buffer may back arbitrarily many
// surfaces at once, so damage against the buffer has to fan out to
// every attached actor.
//
// The record is jointly owned: it stays alive while the protocol
// object is alive *or* while any surface is still attached, and the
// atmosphere drops its entry only when both owners are gone. That way
// a client can destroy its wl_buffer while a surface still displays
// it and the record quietly outlives the protocol identity.
//
// Austin Shafer - 2023
extern crate wayland_server as ws;
use ws::backend::ObjectId;
use ws::protocol::wl_buffer;
use ws::Resource;

use crate::atmosphere::{Atmosphere, BufferId, SurfaceId};
use utils::log;

use std::sync::{Arc, Mutex};

/// One client-provided pixel buffer
pub struct Buffer {
    pub b_id: BufferId,
    /// The protocol handle, used for actor attach/damage calls. This
    /// stays usable for fan-out bookkeeping even after the client
    /// destroys the object.
    pub b_buffer: wl_buffer::WlBuffer,
    /// Is the protocol object still alive? Cleared by the resource
    /// destroy hook.
    pub b_proto_alive: bool,
    /// Weak back-references to the surfaces currently displaying
    /// this buffer, used only for damage fan-out.
    pub b_attached_to: Vec<SurfaceId>,
}

impl Buffer {
    pub fn new(id: BufferId, buffer: wl_buffer::WlBuffer) -> Buffer {
        Buffer {
            b_id: id,
            b_buffer: buffer,
            b_proto_alive: true,
            b_attached_to: Vec::new(),
        }
    }
}

/// A new wl_buffer has come into existence
///
/// Called by the shm pool when it carves out a buffer. Buffers from
/// other sources never pass through here; they get their record
/// lazily on first attach instead.
pub fn buffer_created(atmos: &mut Atmosphere, buffer: &wl_buffer::WlBuffer) {
    let id = BufferId::new(buffer.id());
    log::debug!("Creating buffer record {:?}", id);

    let record = Arc::new(Mutex::new(Buffer::new(id.clone(), buffer.clone())));
    atmos.add_buffer(id, record);
}

/// The contents of a buffer changed
///
/// Forward the damaged region to the actor of every surface the
/// buffer is attached to. A notification for a buffer we have no
/// record of is benign and only logged.
///
/// The attached list is snapshotted before any surface is locked so
/// the fan-out tolerates the set changing underneath us.
pub fn buffer_damaged(atmos: &mut Atmosphere, id: &BufferId, x: i32, y: i32, width: i32, height: i32) {
    let record = match atmos.get_buffer(id) {
        Some(r) => r,
        None => {
            log::debug!("Ignoring damage for unknown buffer {:?}", id);
            return;
        }
    };

    let (proto, attached) = {
        let buf = record.lock().unwrap();
        (buf.b_buffer.clone(), buf.b_attached_to.clone())
    };

    for sid in attached.iter() {
        if let Some(surf) = atmos.get_surface(sid) {
            surf.lock()
                .unwrap()
                .damage_from_buffer(&proto, x, y, width, height);
        }
    }
}

/// The protocol object backing a buffer has been destroyed
///
/// If nothing is attached the record goes away with it. Otherwise the
/// record lingers in an orphaned state until the last surface
/// detaches. Destruction of an unknown buffer is benign.
pub fn buffer_destroyed(atmos: &mut Atmosphere, oid: ObjectId) {
    let id = BufferId::new(oid);
    let record = match atmos.get_buffer(&id) {
        Some(r) => r,
        None => {
            log::debug!("Ignoring destruction of unknown buffer {:?}", id);
            return;
        }
    };

    let attached = {
        let mut buf = record.lock().unwrap();
        buf.b_proto_alive = false;
        buf.b_attached_to.len()
    };

    if attached == 0 {
        atmos.remove_buffer(&id);
    } else {
        log::debug!(
            "Buffer {:?} destroyed while attached to {} surfaces, orphaning",
            id,
            attached
        );
    }
}
