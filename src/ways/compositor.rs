// Wayland compositor singleton
//
// This is the "top" of the wayland heirarchy, it is the initiating
// module of the wayland protocols. The display is created here, the
// globals are advertised from here, and the dispatch loop that feeds
// the rest of the ways/ modules lives here.
//
// Austin Shafer - 2023
extern crate wayland_server as ws;

use ws::protocol::{wl_compositor as wlci, wl_output, wl_shell, wl_shm, wl_surface as wlsi};
use ws::ListeningSocket;

use super::surface::Surface;
use super::wl_output::{Output, OutputMode};
use super::wl_region;
use crate::atmosphere::Atmosphere;
use crate::scene::Stage;
use utils::fdwatch::FdWatch;
use utils::timing::TimingManager;
use utils::{log, Context, Result};

use std::ops::DerefMut;
use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex};

/// The wayland dispatch state
///
/// This is the state struct wayland-server threads through every
/// request handler. It carries the two things the protocol
/// implementations need: the compositor-wide atmosphere and the
/// scene stage the surfaces render through.
pub struct Climate {
    pub c_atmos: Arc<Mutex<Atmosphere>>,
    pub c_stage: Box<dyn Stage>,
}

impl Climate {
    /// wl_compositor interface create surface
    ///
    /// This request creates a new wl_surface and hooks up our
    /// surface handler. See the surface module.
    pub fn create_surface(
        &mut self,
        id: ws::New<wlsi::WlSurface>,
        data_init: &mut ws::DataInit<'_, Climate>,
    ) {
        let sid = self.c_atmos.lock().unwrap().mint_surface_id();
        log::debug!("Creating new surface {:?}", sid);

        // The record is shared between the resource's user data and
        // the atmosphere's surface list; the destroy hook drops the
        // list entry.
        let new_surface = Arc::new(Mutex::new(Surface::new(sid)));
        data_init.init(id, new_surface.clone());

        self.c_atmos.lock().unwrap().add_surface(sid, new_surface);
    }
}

#[allow(unused_variables)]
impl ws::GlobalDispatch<wlci::WlCompositor, ()> for Climate {
    fn bind(
        state: &mut Self,
        handle: &ws::DisplayHandle,
        client: &ws::Client,
        resource: ws::New<wlci::WlCompositor>,
        global_data: &(),
        data_init: &mut ws::DataInit<'_, Self>,
    ) {
        data_init.init(resource, ());
    }
}

#[allow(unused_variables)]
impl ws::Dispatch<wlci::WlCompositor, ()> for Climate {
    fn request(
        state: &mut Self,
        client: &ws::Client,
        resource: &wlci::WlCompositor,
        request: wlci::Request,
        data: &(),
        dhandle: &ws::DisplayHandle,
        data_init: &mut ws::DataInit<'_, Self>,
    ) {
        match request {
            wlci::Request::CreateSurface { id } => state.create_surface(id, data_init),
            wlci::Request::CreateRegion { id } => wl_region::register_new(id, data_init),
            other => log::error!("wl_compositor: unhandled request {:?}", other),
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

/// Per-client bookkeeping for the wayland library
pub struct ClientState;

impl ws::backend::ClientData for ClientState {
    fn initialized(&self, client_id: ws::backend::ClientId) {
        log::debug!("Client connected: {:?}", client_id);
    }

    fn disconnected(
        &self,
        client_id: ws::backend::ClientId,
        reason: ws::backend::DisconnectReason,
    ) {
        // the library runs every resource destroy hook for us, in no
        // particular order; the hooks tolerate that
        log::debug!("Client disconnected: {:?} ({:?})", client_id, reason);
    }
}

/// The event manager
///
/// This class is the launching point of the wayland stack. It
/// creates the display, advertises the globals, and runs the
/// dispatch loop that listens on the wayland fds. The stage passed
/// in at creation is where surfaces end up on screen, and its
/// paint-finished signal is what drains the frame callback queue.
#[allow(dead_code)]
pub struct EventManager {
    /// The wayland display object, the core global singleton
    em_display: ws::Display<Climate>,
    /// Dispatch state handed to wayland-server on every request
    em_climate: Climate,
    /// Shared handle to the record store inside em_climate
    em_atmos: Arc<Mutex<Atmosphere>>,
}

impl EventManager {
    /// Returns a new struct in charge of running the main event loop
    ///
    /// This creates a new wayland display, registers our globals,
    /// provisions the synthetic output, and connects the frame
    /// callback drain to the stage's paint-finished signal.
    pub fn new(stage: Box<dyn Stage>) -> Result<Box<EventManager>> {
        let display = ws::Display::new().context("Failed to create a wayland display")?;

        let atmos = Arc::new(Mutex::new(Atmosphere::new()));
        let mut climate = Climate {
            c_atmos: atmos.clone(),
            c_stage: stage,
        };

        // Drain the frame callback queue once per finished paint.
        // This is the only paint-finished handler we ever connect.
        let cb_atmos = atmos.clone();
        climate.c_stage.connect_paint_finished(Box::new(move || {
            cb_atmos.lock().unwrap().signal_frame_callbacks();
        }));

        let mut evman = Box::new(EventManager {
            em_display: display,
            em_climate: climate,
            em_atmos: atmos,
        });

        // Register our global interfaces that
        // will be advertised to all clients
        evman.create_compositor_global();
        evman.create_shm_global();
        evman.create_wl_shell_global();
        evman.create_output(
            0,
            0,
            800,
            600,
            vec![OutputMode {
                m_flags: wl_output::Mode::Current.bits(),
                m_width: 800,
                m_height: 600,
                m_refresh: 60_000,
            }],
        );

        Ok(evman)
    }

    /// Create a new global object advertising the wl_compositor
    /// interface
    ///
    /// In wayland we create global objects which tell the client
    /// what protocols we implement. Each of these methods
    /// initializes one such global.
    fn create_compositor_global(&mut self) {
        self.em_display
            .handle()
            .create_global::<Climate, wlci::WlCompositor, ()>(
                4, // version
                (),
            );
    }

    /// Create the shared memory global
    ///
    /// wayland-rs does not handle this interface for us like the
    /// system library does, so the shm module implements it
    fn create_shm_global(&mut self) {
        self.em_display
            .handle()
            .create_global::<Climate, wl_shm::WlShm, ()>(
                1, // version
                (),
            );
    }

    /// Initialize the wl_shell interface
    ///
    /// the wl_shell interface handles the desktop window lifecycle.
    /// Ours is a validating stub, see the wl_shell module
    fn create_wl_shell_global(&mut self) {
        self.em_display
            .handle()
            .create_global::<Climate, wl_shell::WlShell, ()>(
                1, // version
                (),
            );
    }

    /// Provision one synthetic output and advertise it
    ///
    /// Takes the position and physical dimensions in mm, plus the
    /// ordered mode list to report on bind.
    pub fn create_output(
        &mut self,
        x: i32,
        y: i32,
        width_mm: i32,
        height_mm: i32,
        modes: Vec<OutputMode>,
    ) {
        let mut output = Output::new(x, y, width_mm, height_mm);
        output.o_modes = modes;
        let index = self.em_atmos.lock().unwrap().add_output(output);

        // XXX: eventually an output should correspond to a slice of
        // the scene, but for now we only support one output so the
        // stage always matches it. The mm dimensions double as the
        // pixel size here, one configuration value for both
        // quantities.
        self.em_climate.c_stage.set_size(width_mm, height_mm);

        self.em_display
            .handle()
            .create_global::<Climate, wl_output::WlOutput, usize>(
                1, // version
                index,
            );
    }

    /// Hand a connected client socket to the display
    pub fn add_client(&mut self, stream: UnixStream) -> Result<()> {
        self.em_display
            .handle()
            .insert_client(stream, Arc::new(ClientState))
            .context("Failed to insert a wayland client")?;
        Ok(())
    }

    /// Dispatch any pending client requests
    ///
    /// This never blocks. It is safe to call on a spurious wakeup,
    /// the library decides for itself whether work is pending.
    pub fn dispatch(&mut self) -> Result<usize> {
        self.em_display
            .dispatch_clients(&mut self.em_climate)
            .context("Error dispatching wayland clients")
    }

    /// Push any queued events out to the clients
    pub fn flush(&mut self) {
        self.em_display.flush_clients().ok();
    }

    /// Run one paint cycle on the stage
    ///
    /// The stage fires its paint-finished handlers before this
    /// returns, which is what drains the frame callback queue.
    pub fn paint(&mut self) {
        self.em_climate.c_stage.paint();
    }

    /// Shared handle to the compositor record store
    pub fn atmosphere(&self) -> Arc<Mutex<Atmosphere>> {
        self.em_atmos.clone()
    }

    /// Run a request against the atmosphere
    ///
    /// Small helper for callers that don't want to juggle the lock.
    pub fn with_atmosphere<T, F: FnOnce(&mut Atmosphere) -> T>(&self, func: F) -> T {
        func(self.em_atmos.lock().unwrap().deref_mut())
    }

    /// The main loop of the wayland subsystem
    ///
    /// Binds the public socket and then alternates between
    /// dispatching protocol requests and running paint cycles. We
    /// paint roughly once per 60fps frame; it doesn't have to be
    /// exact, frame callbacks just need to keep ticking.
    pub fn run(&mut self) -> Result<()> {
        let socket =
            ListeningSocket::bind("wayland-0").context("Failed to bind the wayland socket")?;
        log::info!("Listening on wayland-0");

        // wayland-rs will not block for us, so poll the listening
        // socket and the display fd until something is readable
        let mut fdw = FdWatch::new();
        fdw.add_fd(socket.as_raw_fd());
        fdw.add_fd(self.em_display.backend().poll_fd().as_raw_fd());

        let mut tm = TimingManager::new(15);

        loop {
            let timeout = tm.time_remaining();
            fdw.wait_for_events(Some(timeout));
            log::profiling!("starting loop");

            // accept any clients waiting on the socket
            while let Some(stream) = socket.accept().context("Listening socket died")? {
                if let Err(e) = self.add_client(stream) {
                    log::error!("Rejecting client: {:?}", e);
                }
            }

            self.dispatch()?;

            if tm.is_overdue() {
                // it has been roughly one frame, run a paint cycle;
                // its paint-finished signal drains the callbacks so
                // clients can draw
                self.paint();
                tm.reset();
            }

            self.flush();
        }
    }
}
