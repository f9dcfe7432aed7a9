// Implementation of the wl_shell and wl_shell_surface interfaces
//
// The shell is how clients describe the desktop lifecycle of their
// windows. We don't do any window management yet, so every request
// is parsed, validated, and dropped on the floor; rejecting them
// would break otherwise well-behaved clients.
//
// Austin Shafer - 2023
extern crate wayland_server as ws;

use ws::protocol::{wl_shell, wl_shell_surface, wl_surface};
use ws::Resource;

use super::surface::Surface;
use crate::ways::compositor::Climate;
use utils::log;

use std::sync::{Arc, Mutex};

#[allow(unused_variables)]
impl ws::GlobalDispatch<wl_shell::WlShell, ()> for Climate {
    fn bind(
        state: &mut Self,
        handle: &ws::DisplayHandle,
        client: &ws::Client,
        resource: ws::New<wl_shell::WlShell>,
        global_data: &(),
        data_init: &mut ws::DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

// Handle requests to a wl_shell interface
//
// Essentially it just creates a wl_shell_surface.
#[allow(unused_variables)]
impl ws::Dispatch<wl_shell::WlShell, ()> for Climate {
    fn request(
        state: &mut Self,
        client: &ws::Client,
        resource: &wl_shell::WlShell,
        request: wl_shell::Request,
        data: &(),
        dhandle: &ws::DisplayHandle,
        data_init: &mut ws::DataInit<'_, Self>,
    ) {
        match request {
            wl_shell::Request::GetShellSurface {
                id: shell_surface,
                surface,
            } => {
                // get our surface record from the userdata
                let surf = surface
                    .data::<Arc<Mutex<Surface>>>()
                    .expect("wl_surface has no surface record")
                    .clone();

                let shsurf = ShellSurface {
                    ss_surface: surf,
                    ss_surface_proxy: surface,
                };
                data_init.init(shell_surface, Arc::new(Mutex::new(shsurf)));
            }
            other => log::error!("wl_shell: unhandled request {:?}", other),
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

// A shell surface
//
// This is the private protocol object for wl_shell_surface. It
// would track window characteristics and roles if we had any window
// management to do.
#[allow(dead_code)]
pub struct ShellSurface {
    // Stratus surface record
    ss_surface: Arc<Mutex<Surface>>,
    // the wayland surface this shell surface wraps
    ss_surface_proxy: wl_surface::WlSurface,
}

impl ShellSurface {
    // Handle a request from a client
    //
    // Every recognized request parses its argument tuple and
    // returns without error. None of them have any effect yet.
    fn handle_request(&mut self, req: wl_shell_surface::Request) {
        let id = self.ss_surface.lock().unwrap().s_id;

        match req {
            wl_shell_surface::Request::Move { seat, serial } => {
                log::debug!("Surface {:?}: move request (serial {}) from {:?}", id, serial, seat);
            }
            wl_shell_surface::Request::Resize {
                seat,
                serial,
                edges,
            } => {
                // validate the edge bitfield even though we don't act on it
                let edges = edges.into_result().ok();
                log::debug!(
                    "Surface {:?}: resize request (serial {}) edges {:?} from {:?}",
                    id,
                    serial,
                    edges,
                    seat
                );
            }
            wl_shell_surface::Request::SetToplevel => {
                log::debug!("Surface {:?}: set_toplevel", id);
            }
            wl_shell_surface::Request::SetTransient { parent, x, y, flags } => {
                let flags = flags.into_result().ok();
                log::debug!(
                    "Surface {:?}: set_transient under {:?} at {},{} flags {:?}",
                    id,
                    parent.id(),
                    x,
                    y,
                    flags
                );
            }
            wl_shell_surface::Request::SetFullscreen {
                method,
                framerate,
                output,
            } => {
                let method = method.into_result().ok();
                log::debug!(
                    "Surface {:?}: set_fullscreen method {:?} at {} mHz on {:?}",
                    id,
                    method,
                    framerate,
                    output.map(|o| o.id())
                );
            }
            wl_shell_surface::Request::Pong { serial } => {
                log::debug!("Surface {:?}: pong {}", id, serial);
            }
            wl_shell_surface::Request::SetTitle { title } => {
                log::debug!("Surface {:?}: title \"{}\"", id, title);
            }
            wl_shell_surface::Request::SetClass { class_ } => {
                log::debug!("Surface {:?}: class \"{}\"", id, class_);
            }
            other => log::debug!("Surface {:?}: ignoring shell request {:?}", id, other),
        }
    }
}

// Handle requests to a wl_shell_surface interface
#[allow(unused_variables)]
impl ws::Dispatch<wl_shell_surface::WlShellSurface, Arc<Mutex<ShellSurface>>> for Climate {
    fn request(
        state: &mut Self,
        client: &ws::Client,
        resource: &wl_shell_surface::WlShellSurface,
        request: wl_shell_surface::Request,
        data: &Arc<Mutex<ShellSurface>>,
        dhandle: &ws::DisplayHandle,
        data_init: &mut ws::DataInit<'_, Self>,
    ) {
        data.lock().unwrap().handle_request(request);
    }

    fn destroyed(
        state: &mut Self,
        _client: ws::backend::ClientId,
        _resource: ws::backend::ObjectId,
        data: &Arc<Mutex<ShellSurface>>,
    ) {
    }
}
