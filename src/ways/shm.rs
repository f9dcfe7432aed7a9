// Implementation of the wl_shm interface
//
// wayland-rs does not handle shared memory for us the way the system
// library does, so the pool bookkeeping lives here: a wl_shm_pool
// maps the client's fd and wl_buffers are carved out of the mapping.
// Buffer records are minted/retired through the registry in buffer.rs
// as the protocol objects come and go.
//
// Austin Shafer - 2023
extern crate nix;
extern crate wayland_server as ws;

use ws::protocol::wl_buffer;
use ws::protocol::{wl_shm, wl_shm_pool};
use ws::Resource;

use super::buffer::{buffer_created, buffer_destroyed};
use crate::ways::compositor::Climate;
use utils::log;

use nix::{sys::mman, unistd};
use std::ffi::c_void;
use std::ops::DerefMut;
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::{Arc, Mutex};

#[allow(unused_variables)]
impl ws::GlobalDispatch<wl_shm::WlShm, ()> for Climate {
    fn bind(
        state: &mut Self,
        handle: &ws::DisplayHandle,
        client: &ws::Client,
        resource: ws::New<wl_shm::WlShm>,
        global_data: &(),
        data_init: &mut ws::DataInit<'_, Self>,
    ) {
        let shm = data_init.init(resource, ());
        // advertise the formats we accept
        shm.format(wl_shm::Format::Argb8888);
        shm.format(wl_shm::Format::Xrgb8888);
    }
}

// Dispatch<Interface, Userdata>
#[allow(unused_variables)]
impl ws::Dispatch<wl_shm::WlShm, ()> for Climate {
    // Handles requests for the wl_shm interface
    //
    // There is essentially only one thing going on here, we
    // immediately map the shared memory pool and create a
    // wl_shm_pool resource to represent it.
    fn request(
        state: &mut Self,
        client: &ws::Client,
        resource: &wl_shm::WlShm,
        request: wl_shm::Request,
        data: &(),
        dhandle: &ws::DisplayHandle,
        data_init: &mut ws::DataInit<'_, Self>,
    ) {
        match request {
            wl_shm::Request::CreatePool { id, fd, size } => {
                let region = if size > 0 {
                    ShmRegion::new(fd.as_raw_fd(), size as usize)
                } else {
                    None
                };

                let region = match region {
                    Some(r) => r,
                    None => {
                        resource.post_error(
                            wl_shm::Error::InvalidFd as u32,
                            format!("could not map shm pool of size {}", size),
                        );
                        // the new_id still has to be tied off, give it
                        // an inert region
                        ShmRegion::empty()
                    }
                };

                // Add our ShmRegion as the private data for the pool
                data_init.init(id, Arc::new(Mutex::new(region)));
            }
            other => log::error!("wl_shm: unhandled request {:?}", other),
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: ws::backend::ClientId,
        _resource: ws::backend::ObjectId,
        data: &(),
    ) {
    }
}

#[allow(unused_variables)]
impl ws::Dispatch<wl_shm_pool::WlShmPool, Arc<Mutex<ShmRegion>>> for Climate {
    // Handle requests for the wl_shm_pool interface
    //
    // The shared memory pool handles creation of buffers: we carve
    // out a portion of the mapped region to supply one.
    fn request(
        state: &mut Self,
        client: &ws::Client,
        resource: &wl_shm_pool::WlShmPool,
        request: wl_shm_pool::Request,
        data: &Arc<Mutex<ShmRegion>>,
        dhandle: &ws::DisplayHandle,
        data_init: &mut ws::DataInit<'_, Self>,
    ) {
        match request {
            wl_shm_pool::Request::CreateBuffer {
                // id is translated to a wl_buffer by wayland-rs
                id,
                offset,
                width,
                height,
                stride,
                format: format_enum,
            } => {
                // Ensure that the requested format is supported.
                // Posting the error kills the client, but the new_id
                // is still tied off below so bookkeeping stays sane.
                let format = match format_enum.into_result() {
                    Ok(f) if f == wl_shm::Format::Xrgb8888 || f == wl_shm::Format::Argb8888 => f,
                    Ok(f) => {
                        resource.post_error(
                            wl_shm::Error::InvalidFormat as u32,
                            format!("SHM format {:?} is not supported", f),
                        );
                        f
                    }
                    // a wire value outside the protocol enum entirely
                    Err(raw) => {
                        resource.post_error(
                            wl_shm::Error::InvalidFormat as u32,
                            format!("unrecognized SHM format: {}", raw),
                        );
                        wl_shm::Format::Xrgb8888
                    }
                };

                let buf = ShmBuffer {
                    sb_reg: data.clone(),
                    sb_offset: offset,
                    sb_width: width,
                    sb_height: height,
                    sb_stride: stride,
                    sb_format: format,
                };
                log::debug!("Created new shm buf with size {}x{}", width, height);

                // Add our buffer priv data to the userdata, then let
                // the registry know this buffer exists
                let buffer = data_init.init(id, Arc::new(buf));
                buffer_created(state.c_atmos.lock().unwrap().deref_mut(), &buffer);
            }
            wl_shm_pool::Request::Resize { size } => {
                data.lock().unwrap().resize(size as usize);
            }
            wl_shm_pool::Request::Destroy => {}
            other => log::error!("wl_shm_pool: unhandled request {:?}", other),
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: ws::backend::ClientId,
        _resource: ws::backend::ObjectId,
        data: &Arc<Mutex<ShmRegion>>,
    ) {
    }
}

// One mapped shm pool
//
// The fd arrives with wl_shm.create_pool and the mapping stays alive
// for as long as any wl_shm_pool or wl_buffer still references it.
// The compositor side only ever reads through the mapping.
#[allow(dead_code)]
pub struct ShmRegion {
    sr_fd: RawFd,
    sr_raw_ptr: *mut c_void,
    sr_size: usize,
}

// Have to do this manually because of the void *
unsafe impl Send for ShmRegion {}

impl ShmRegion {
    // Map size bytes of the client's fd as a read-only pool
    fn new(fd: RawFd, size: usize) -> Option<ShmRegion> {
        let ptr = unsafe {
            mman::mmap(
                std::ptr::null_mut(),
                size,
                mman::ProtFlags::PROT_READ,
                mman::MapFlags::MAP_SHARED,
                fd,
                0,
            )
            .ok()?
        };

        Some(ShmRegion {
            sr_fd: fd,
            sr_raw_ptr: ptr,
            sr_size: size,
        })
    }

    // A placeholder region with no backing memory
    //
    // Used to tie off pool resources whose mapping failed after the
    // protocol error has been posted.
    fn empty() -> ShmRegion {
        ShmRegion {
            sr_fd: -1,
            sr_raw_ptr: std::ptr::null_mut(),
            sr_size: 0,
        }
    }

    // Enlarge the shm pool
    // Shrinking a pool is not supported
    fn resize(&mut self, size: usize) {
        if size <= self.sr_size || self.sr_raw_ptr.is_null() {
            log::error!("Ignoring invalid shm pool resize to {}", size);
            return;
        }

        unsafe {
            mman::munmap(self.sr_raw_ptr, self.sr_size).unwrap();
            self.sr_raw_ptr = match mman::mmap(
                std::ptr::null_mut(),
                size,
                mman::ProtFlags::PROT_READ,
                mman::MapFlags::MAP_SHARED,
                self.sr_fd,
                0,
            ) {
                Ok(p) => p,
                Err(_) => {
                    log::error!("Could not remap shm pool");
                    std::ptr::null_mut()
                }
            };
        }
        self.sr_size = size;
    }
}

impl Drop for ShmRegion {
    fn drop(&mut self) {
        // inert placeholder regions have nothing to release
        if !self.sr_raw_ptr.is_null() {
            unsafe {
                mman::munmap(self.sr_raw_ptr, self.sr_size).unwrap();
                unistd::close(self.sr_fd).ok();
            }
        }
    }
}

// A buffer in shared memory
//
// This represents a region of memory which was carved from a
// ShmRegion. This struct did not allocate the shared memory. It is
// the user data of the wl_buffer, where a stage implementation can
// pick up the buffer's layout.
#[allow(dead_code)]
pub struct ShmBuffer {
    // The region this buffer is carved from. Holding this keeps the
    // mapping alive even if the client destroys the pool first.
    sb_reg: Arc<Mutex<ShmRegion>>,
    // The offset into sb_reg where this is located
    sb_offset: i32,
    pub sb_width: i32,
    pub sb_height: i32,
    sb_stride: i32,
    pub sb_format: wl_shm::Format,
}

// Handle buffers carved from shm pools
#[allow(unused_variables)]
impl ws::Dispatch<wl_buffer::WlBuffer, Arc<ShmBuffer>> for Climate {
    fn request(
        state: &mut Self,
        client: &ws::Client,
        resource: &wl_buffer::WlBuffer,
        request: wl_buffer::Request,
        data: &Arc<ShmBuffer>,
        dhandle: &ws::DisplayHandle,
        data_init: &mut ws::DataInit<'_, Self>,
    ) {
        // the only request is destroy, which is handled by the
        // destroy hook below
    }

    fn destroyed(
        state: &mut Self,
        _client: ws::backend::ClientId,
        resource: ws::backend::ObjectId,
        data: &Arc<ShmBuffer>,
    ) {
        // don't close the shm fd here since it is handled in Drop
        buffer_destroyed(state.c_atmos.lock().unwrap().deref_mut(), resource);
    }
}
