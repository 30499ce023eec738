//! Runtime loading of the JACK client library

use crate::{
    error::{Error, Result},
    ffi::{
        jack_client_t, jack_nframes_t, jack_port_t, JackApi, JackOptions, JackProcessCallback,
        JackStatus,
    },
};
use libloading::Library;
use log::{debug, info};
use std::ffi::{c_char, c_int, c_ulong, c_void, CStr, OsStr};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the library search
pub const LIBRARY_ENV: &str = "JACK_BRIDGE_LIB";

// Platform-specific library names, tried in order
#[cfg(target_os = "macos")]
const LIBRARY_NAMES: &[&str] = &[
    "libjack.0.dylib",
    "/usr/local/lib/libjack.0.dylib",
    "/opt/homebrew/lib/libjack.0.dylib",
];

#[cfg(target_os = "windows")]
const LIBRARY_NAMES: &[&str] = &["libjack64.dll", "libjack.dll"];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const LIBRARY_NAMES: &[&str] = &["libjack.so.0", "libjack.so"];

type ClientOpenFn = unsafe extern "C" fn(
    client_name: *const c_char,
    options: JackOptions,
    status: *mut JackStatus,
    ...
) -> *mut jack_client_t;
type ClientFn = unsafe extern "C" fn(client: *mut jack_client_t) -> c_int;
type SetProcessCallbackFn = unsafe extern "C" fn(
    client: *mut jack_client_t,
    callback: JackProcessCallback,
    arg: *mut c_void,
) -> c_int;
type PortRegisterFn = unsafe extern "C" fn(
    client: *mut jack_client_t,
    port_name: *const c_char,
    port_type: *const c_char,
    flags: c_ulong,
    buffer_size: c_ulong,
) -> *mut jack_port_t;
type PortGetBufferFn =
    unsafe extern "C" fn(port: *mut jack_port_t, nframes: jack_nframes_t) -> *mut c_void;
type ClientFramesFn = unsafe extern "C" fn(client: *mut jack_client_t) -> jack_nframes_t;

/// The JACK client library, loaded at runtime
pub struct LibJack {
    client_open: ClientOpenFn,
    client_close: ClientFn,
    set_process_callback: SetProcessCallbackFn,
    activate: ClientFn,
    deactivate: ClientFn,
    port_register: PortRegisterFn,
    port_get_buffer: PortGetBufferFn,
    get_sample_rate: ClientFramesFn,
    get_buffer_size: ClientFramesFn,

    path: PathBuf,

    // Library handle (kept alive for the function pointers above)
    _library: Library,
}

impl LibJack {
    /// Load the library from `$JACK_BRIDGE_LIB` or the platform's default names
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(LIBRARY_ENV) {
            debug!("Loading JACK library from ${}", LIBRARY_ENV);
            return Self::load_from(path);
        }

        let mut last_error = None;
        for name in LIBRARY_NAMES {
            match Self::load_from(name) {
                Ok(lib) => return Ok(lib),
                Err(e) => {
                    debug!("Could not load {}: {}", name, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| Error::LibraryLoadFailed("no candidate library names".to_string())))
    }

    /// Load the library from an explicit path, or fall back to [`LibJack::load`]
    pub fn load_with(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        }
    }

    /// Load the library from the given path or file name
    pub fn load_from<P: AsRef<OsStr>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        unsafe {
            let library = Library::new(path).map_err(|e| {
                Error::LibraryLoadFailed(format!("{}: {}", path.to_string_lossy(), e))
            })?;

            let lib = Self {
                client_open: symbol(&library, b"jack_client_open\0")?,
                client_close: symbol(&library, b"jack_client_close\0")?,
                set_process_callback: symbol(&library, b"jack_set_process_callback\0")?,
                activate: symbol(&library, b"jack_activate\0")?,
                deactivate: symbol(&library, b"jack_deactivate\0")?,
                port_register: symbol(&library, b"jack_port_register\0")?,
                port_get_buffer: symbol(&library, b"jack_port_get_buffer\0")?,
                get_sample_rate: symbol(&library, b"jack_get_sample_rate\0")?,
                get_buffer_size: symbol(&library, b"jack_get_buffer_size\0")?,
                path: PathBuf::from(path),
                _library: library,
            };

            info!("Loaded JACK library {}", lib.path.display());
            Ok(lib)
        }
    }

    /// Path or name the library was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Resolve a NUL-terminated symbol name to a copyable function pointer
unsafe fn symbol<T: Copy>(library: &Library, name: &[u8]) -> Result<T> {
    let symbol = library.get::<T>(name).map_err(|e| Error::SymbolNotFound {
        symbol: String::from_utf8_lossy(name.strip_suffix(b"\0").unwrap_or(name)).into_owned(),
        reason: e.to_string(),
    })?;
    Ok(*symbol)
}

impl JackApi for LibJack {
    unsafe fn client_open(
        &self,
        name: &CStr,
        options: JackOptions,
        status: *mut JackStatus,
    ) -> *mut jack_client_t {
        (self.client_open)(name.as_ptr(), options, status)
    }

    unsafe fn client_close(&self, client: *mut jack_client_t) -> c_int {
        (self.client_close)(client)
    }

    unsafe fn set_process_callback(
        &self,
        client: *mut jack_client_t,
        callback: JackProcessCallback,
        arg: *mut c_void,
    ) -> c_int {
        (self.set_process_callback)(client, callback, arg)
    }

    unsafe fn activate(&self, client: *mut jack_client_t) -> c_int {
        (self.activate)(client)
    }

    unsafe fn deactivate(&self, client: *mut jack_client_t) -> c_int {
        (self.deactivate)(client)
    }

    unsafe fn port_register(
        &self,
        client: *mut jack_client_t,
        name: &CStr,
        port_type: &CStr,
        flags: c_ulong,
        buffer_size: c_ulong,
    ) -> *mut jack_port_t {
        (self.port_register)(client, name.as_ptr(), port_type.as_ptr(), flags, buffer_size)
    }

    unsafe fn port_get_buffer(
        &self,
        port: *mut jack_port_t,
        nframes: jack_nframes_t,
    ) -> *mut c_void {
        (self.port_get_buffer)(port, nframes)
    }

    unsafe fn get_sample_rate(&self, client: *mut jack_client_t) -> jack_nframes_t {
        (self.get_sample_rate)(client)
    }

    unsafe fn get_buffer_size(&self, client: *mut jack_client_t) -> jack_nframes_t {
        (self.get_buffer_size)(client)
    }
}
