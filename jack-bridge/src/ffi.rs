//! Raw JACK types, constants and the server API seam
//!
//! Mirrors the parts of `<jack/types.h>` and `<jack/jack.h>` that the bridge
//! calls. Nothing here is safe to use directly; see [`crate::bridge`] and
//! [`crate::client`] for the wrappers.

#![allow(non_camel_case_types)]

use std::ffi::{c_int, c_ulong, c_void, CStr};
use std::fmt;
use std::ops::BitOr;

/// Opaque `jack_client_t`
#[repr(C)]
pub struct jack_client_t {
    _private: [u8; 0],
}

/// Opaque `jack_port_t`
#[repr(C)]
pub struct jack_port_t {
    _private: [u8; 0],
}

/// `jack_nframes_t`
pub type jack_nframes_t = u32;

/// Number of frames in one process block
pub type Frames = jack_nframes_t;

/// `JackProcessCallback`: `int (*)(jack_nframes_t nframes, void *arg)`
pub type JackProcessCallback =
    unsafe extern "C" fn(nframes: jack_nframes_t, arg: *mut c_void) -> c_int;

/// Status the trampoline reports back to the server
pub const PROCESS_OK: c_int = 0;

/// Port type string for mono 32-bit float audio (`JACK_DEFAULT_AUDIO_TYPE`)
pub const DEFAULT_AUDIO_TYPE: &CStr = c"32 bit float mono audio";

/// `JackPortIsInput`
pub const PORT_IS_INPUT: c_ulong = 0x1;
/// `JackPortIsOutput`
pub const PORT_IS_OUTPUT: c_ulong = 0x2;
/// `JackPortIsPhysical`
pub const PORT_IS_PHYSICAL: c_ulong = 0x4;
/// `JackPortCanMonitor`
pub const PORT_CAN_MONITOR: c_ulong = 0x8;
/// `JackPortIsTerminal`
pub const PORT_IS_TERMINAL: c_ulong = 0x10;

/// `jack_options_t` bit set passed to `jack_client_open`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct JackOptions(pub c_int);

impl JackOptions {
    /// `JackNullOption`
    pub const NULL: Self = Self(0x00);
    /// `JackNoStartServer`
    pub const NO_START_SERVER: Self = Self(0x01);
    /// `JackUseExactName`
    pub const USE_EXACT_NAME: Self = Self(0x02);
    /// `JackServerName`
    pub const SERVER_NAME: Self = Self(0x04);

    /// Raw bits
    pub fn bits(self) -> c_int {
        self.0
    }

    /// Check whether every bit of `other` is set
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for JackOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// `jack_status_t` bit set written by `jack_client_open`
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct JackStatus(pub c_int);

impl JackStatus {
    /// `JackFailure`
    pub const FAILURE: Self = Self(0x01);
    /// `JackInvalidOption`
    pub const INVALID_OPTION: Self = Self(0x02);
    /// `JackNameNotUnique`
    pub const NAME_NOT_UNIQUE: Self = Self(0x04);
    /// `JackServerStarted`
    pub const SERVER_STARTED: Self = Self(0x08);
    /// `JackServerFailed`
    pub const SERVER_FAILED: Self = Self(0x10);
    /// `JackServerError`
    pub const SERVER_ERROR: Self = Self(0x20);
    /// `JackNoSuchClient`
    pub const NO_SUCH_CLIENT: Self = Self(0x40);
    /// `JackLoadFailure`
    pub const LOAD_FAILURE: Self = Self(0x80);
    /// `JackInitFailure`
    pub const INIT_FAILURE: Self = Self(0x100);
    /// `JackShmFailure`
    pub const SHM_FAILURE: Self = Self(0x200);
    /// `JackVersionError`
    pub const VERSION_ERROR: Self = Self(0x400);
    /// `JackBackendError`
    pub const BACKEND_ERROR: Self = Self(0x800);
    /// `JackClientZombie`
    pub const CLIENT_ZOMBIE: Self = Self(0x1000);

    const NAMES: [(Self, &'static str); 13] = [
        (Self::FAILURE, "Failure"),
        (Self::INVALID_OPTION, "InvalidOption"),
        (Self::NAME_NOT_UNIQUE, "NameNotUnique"),
        (Self::SERVER_STARTED, "ServerStarted"),
        (Self::SERVER_FAILED, "ServerFailed"),
        (Self::SERVER_ERROR, "ServerError"),
        (Self::NO_SUCH_CLIENT, "NoSuchClient"),
        (Self::LOAD_FAILURE, "LoadFailure"),
        (Self::INIT_FAILURE, "InitFailure"),
        (Self::SHM_FAILURE, "ShmFailure"),
        (Self::VERSION_ERROR, "VersionError"),
        (Self::BACKEND_ERROR, "BackendError"),
        (Self::CLIENT_ZOMBIE, "ClientZombie"),
    ];

    /// No bits set
    pub fn empty() -> Self {
        Self(0)
    }

    /// Raw bits
    pub fn bits(self) -> c_int {
        self.0
    }

    /// Check whether no bits are set
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Check whether every bit of `other` is set
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for JackStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Display for JackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }

        let mut known = 0;
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str(" | ")?;
                }
                f.write_str(name)?;
                known |= flag.0;
                first = false;
            }
        }

        let unknown = self.0 & !known;
        if unknown != 0 {
            if !first {
                f.write_str(" | ")?;
            }
            write!(f, "{:#x}", unknown)?;
        }
        Ok(())
    }
}

impl fmt::Debug for JackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JackStatus({})", self)
    }
}

/// The subset of the JACK client library the bridge calls.
///
/// Each method is a one-to-one mirror of the C function of the same name.
/// [`crate::library::LibJack`] implements it over the dynamically loaded
/// library; tests implement it with an in-process fake server.
///
/// # Safety
///
/// Every method has the preconditions of the C function it mirrors: client
/// and port pointers must come from this same API and must not have been
/// closed.
pub trait JackApi: Send + Sync {
    /// `jack_client_open(name, options, status)` without a server name
    unsafe fn client_open(
        &self,
        name: &CStr,
        options: JackOptions,
        status: *mut JackStatus,
    ) -> *mut jack_client_t;

    /// `jack_client_close`
    unsafe fn client_close(&self, client: *mut jack_client_t) -> c_int;

    /// `jack_set_process_callback`
    unsafe fn set_process_callback(
        &self,
        client: *mut jack_client_t,
        callback: JackProcessCallback,
        arg: *mut c_void,
    ) -> c_int;

    /// `jack_activate`
    unsafe fn activate(&self, client: *mut jack_client_t) -> c_int;

    /// `jack_deactivate`
    unsafe fn deactivate(&self, client: *mut jack_client_t) -> c_int;

    /// `jack_port_register`
    unsafe fn port_register(
        &self,
        client: *mut jack_client_t,
        name: &CStr,
        port_type: &CStr,
        flags: c_ulong,
        buffer_size: c_ulong,
    ) -> *mut jack_port_t;

    /// `jack_port_get_buffer`
    unsafe fn port_get_buffer(&self, port: *mut jack_port_t, nframes: jack_nframes_t)
        -> *mut c_void;

    /// `jack_get_sample_rate`
    unsafe fn get_sample_rate(&self, client: *mut jack_client_t) -> jack_nframes_t;

    /// `jack_get_buffer_size`
    unsafe fn get_buffer_size(&self, client: *mut jack_client_t) -> jack_nframes_t;
}
