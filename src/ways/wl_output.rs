// Implementation of the wl_output interface
//
// wl_output advertises what displays are available for clients to
// present surfaces on. We only have one synthetic output right now,
// described by a static geometry plus an ordered mode list.
//
// Austin Shafer - 2023
extern crate wayland_server as ws;

use crate::ways::compositor::Climate;
use ws::protocol::wl_output;
use ws::protocol::wl_output::{Mode, Subpixel, Transform};

use utils::log;

/// One advertised resolution/refresh combination
pub struct OutputMode {
    /// Raw wl_output mode flags (current/preferred)
    pub m_flags: u32,
    pub m_width: i32,
    pub m_height: i32,
    /// Vertical refresh in mHz
    pub m_refresh: i32,
}

/// A synthetic display
///
/// Holds the static geometry reported to clients. The mode list is
/// filled in by the compositor owner before the global is advertised
/// and never changes afterwards.
pub struct Output {
    pub o_x: i32,
    pub o_y: i32,
    pub o_width_mm: i32,
    pub o_height_mm: i32,
    pub o_modes: Vec<OutputMode>,
}

impl Output {
    pub fn new(x: i32, y: i32, width_mm: i32, height_mm: i32) -> Output {
        Output {
            o_x: x,
            o_y: y,
            o_width_mm: width_mm,
            o_height_mm: height_mm,
            o_modes: Vec::new(),
        }
    }
}

// The global data is the index of the output this global advertises
//
// On bind we stream the geometry event followed by each mode event
// in declared order. We stay at interface version 1 so no other
// events (done/scale) can interleave with the sequence.
#[allow(unused_variables)]
impl ws::GlobalDispatch<wl_output::WlOutput, usize> for Climate {
    fn bind(
        state: &mut Self,
        handle: &ws::DisplayHandle,
        client: &ws::Client,
        resource: ws::New<wl_output::WlOutput>,
        global_data: &usize,
        data_init: &mut ws::DataInit<'_, Self>,
    ) {
        let out = data_init.init(resource, ());

        let atmos = state.c_atmos.lock().unwrap();
        let output = match atmos.get_output(*global_data) {
            Some(o) => o,
            None => {
                log::error!("wl_output bind for unknown output {}", global_data);
                return;
            }
        };

        // send geometry, then the modes in declared order
        out.geometry(
            output.o_x,
            output.o_y,
            output.o_width_mm,
            output.o_height_mm,
            Subpixel::Unknown,
            "unknown".to_string(),
            "unknown".to_string(),
            Transform::Normal,
        );

        for mode in output.o_modes.iter() {
            out.mode(
                Mode::from_bits_truncate(mode.m_flags),
                mode.m_width,
                mode.m_height,
                mode.m_refresh,
            );
        }
    }
}

#[allow(unused_variables)]
impl ws::Dispatch<wl_output::WlOutput, ()> for Climate {
    fn request(
        state: &mut Self,
        client: &ws::Client,
        resource: &wl_output::WlOutput,
        request: wl_output::Request,
        data: &(),
        dhandle: &ws::DisplayHandle,
        data_init: &mut ws::DataInit<'_, Self>,
    ) {
        // version 1 has no requests
    }

    fn destroyed(
        state: &mut Self,
        _client: ws::backend::ClientId,
        _resource: ws::backend::ObjectId,
        data: &(),
    ) {
    }
}
