// Implementation of the wl_region interface
//
// Regions describe arbitrary areas of a surface. Nothing in stratus
// consumes them yet (no input routing, no opaque-region hints), but
// clients create them freely so the requests must parse cleanly.
//
// Austin Shafer - 2023
extern crate wayland_server as ws;

use crate::ways::compositor::Climate;
use utils::log;
use ws::protocol::wl_region;

// Register a new wl_region
pub fn register_new(id: ws::New<wl_region::WlRegion>, data_init: &mut ws::DataInit<'_, Climate>) {
    data_init.init(id, ());
}

// Dispatch<Interface, Userdata>
#[allow(unused_variables)]
impl ws::Dispatch<wl_region::WlRegion, ()> for Climate {
    fn request(
        state: &mut Self,
        client: &ws::Client,
        resource: &wl_region::WlRegion,
        request: wl_region::Request,
        data: &(),
        dhandle: &ws::DisplayHandle,
        data_init: &mut ws::DataInit<'_, Self>,
    ) {
        match request {
            wl_region::Request::Add {
                x,
                y,
                width,
                height,
            } => log::verbose!("wl_region add {},{} {}x{}", x, y, width, height),
            wl_region::Request::Subtract {
                x,
                y,
                width,
                height,
            } => log::verbose!("wl_region subtract {},{} {}x{}", x, y, width, height),
            // don't do anything special when destroying
            _ => (),
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
