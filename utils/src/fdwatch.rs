// Helper class for watching file descriptors
//
// This is the bridge between the wayland event loop and our worker
// thread: the display hands us a pollable fd and we block on it (and
// the listening socket) until something is readable or our frame
// timer runs out. Dispatching on a spurious wakeup is fine, the
// wayland library decides for itself whether work is pending.
//
// Austin Shafer - 2023
extern crate nix;

use nix::poll::{poll, PollFd, PollFlags};
use std::os::unix::io::RawFd;

// A file descriptor watcher
//
// This does not take ownership of the fds added to it, the display
// and socket close their own descriptors.
pub struct FdWatch {
    // The set of fds to poll for readability
    fdw_fds: Vec<PollFd>,
}

impl FdWatch {
    pub fn new() -> FdWatch {
        FdWatch {
            fdw_fds: Vec::new(),
        }
    }

    pub fn add_fd(&mut self, fd: RawFd) {
        self.fdw_fds.push(PollFd::new(fd, PollFlags::POLLIN));
    }

    // Wait for one of our fds to become readable
    //
    // timeout is in ms, None blocks until an event arrives. Returns
    // true if any fd has events pending (readable or error), false
    // if we timed out.
    pub fn wait_for_events(&mut self, timeout: Option<usize>) -> bool {
        // poll takes its timeout as a c_int ms count, -1 blocks
        let timeout = match timeout {
            Some(ms) => ms as i32,
            None => -1,
        };

        match poll(self.fdw_fds.as_mut_slice(), timeout) {
            Ok(n) => n > 0,
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::{pipe, write};

    #[test]
    fn readable_fd_wakes_the_watcher() {
        let (rd, wr) = pipe().unwrap();
        let mut fdw = FdWatch::new();
        fdw.add_fd(rd);

        write(wr, b"x").unwrap();
        assert!(fdw.wait_for_events(Some(1000)));
    }

    #[test]
    fn timeout_returns_false() {
        let (rd, _wr) = pipe().unwrap();
        let mut fdw = FdWatch::new();
        fdw.add_fd(rd);

        assert!(!fdw.wait_for_events(Some(10)));
    }
}
