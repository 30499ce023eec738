//! In-process fake JACK server for tests
//!
//! Records every call made through `JackApi` and lets a test drive the
//! registered process callback the way the server's RT thread would.

#![allow(dead_code)]

use jack_bridge::ffi::{
    jack_client_t, jack_nframes_t, jack_port_t, JackApi, JackOptions, JackProcessCallback,
    JackStatus,
};
use std::cell::UnsafeCell;
use std::collections::HashSet;
use std::ffi::{c_int, c_ulong, c_void, CStr};
use std::ptr;
use std::sync::Mutex;

/// Largest block a fake port can hold
pub const MAX_FRAMES: usize = 4096;

pub const SAMPLE_RATE: u32 = 48_000;
pub const BUFFER_SIZE: u32 = 256;

/// A call observed by the fake server
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Open { name: String, options: JackOptions },
    Close { client: usize },
    SetProcessCallback { client: usize, arg: usize },
    Activate { client: usize },
    Deactivate { client: usize },
    PortRegister { client: usize, name: String, port_type: String, flags: c_ulong },
}

pub struct FakePort {
    pub name: String,
    pub flags: c_ulong,
    buffer: UnsafeCell<Vec<f32>>,
}

#[derive(Default)]
pub(crate) struct State {
    calls: Vec<Call>,
    next_client: usize,
    callbacks: Vec<(usize, JackProcessCallback, usize)>,
    ports: Vec<Box<FakePort>>,
}

/// Fake server configuration and recorded state
pub struct FakeServer {
    pub(crate) state: Mutex<State>,
    pub names_in_use: HashSet<String>,
    pub server_running: bool,
    pub callback_result: c_int,
    pub activate_result: c_int,
    pub deactivate_result: c_int,
    pub close_result: c_int,
    pub fail_port: Option<String>,
}

impl Default for FakeServer {
    fn default() -> Self {
        Self {
            state: Mutex::new(State {
                next_client: 1,
                ..State::default()
            }),
            names_in_use: HashSet::new(),
            server_running: true,
            callback_result: 0,
            activate_result: 0,
            deactivate_result: 0,
            close_result: 0,
            fail_port: None,
        }
    }
}

impl FakeServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of `jack_set_process_callback` calls
    pub fn callback_registrations(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::SetProcessCallback { .. }))
            .count()
    }

    /// Callback and argument registered for `client`
    pub fn process_callback(&self, client: usize) -> Option<(JackProcessCallback, *mut c_void)> {
        let state = self.state.lock().unwrap();
        state
            .callbacks
            .iter()
            .rev()
            .find(|(c, _, _)| *c == client)
            .map(|&(_, callback, arg)| (callback, arg as *mut c_void))
    }

    /// Run one process cycle for `client`, as the server's RT thread would
    pub fn run_cycle(&self, client: usize, nframes: jack_nframes_t) -> c_int {
        let (callback, arg) = self
            .process_callback(client)
            .expect("no process callback registered");
        unsafe { callback(nframes, arg) }
    }

    fn port(&self, name: &str) -> *mut FakePort {
        let state = self.state.lock().unwrap();
        let port = state
            .ports
            .iter()
            .find(|port| port.name == name)
            .unwrap_or_else(|| panic!("no port named {}", name));
        &**port as *const FakePort as *mut FakePort
    }

    /// Fill the first `nframes` samples of a port
    pub fn write_port(&self, name: &str, samples: &[f32]) {
        let port = self.port(name);
        let buffer = unsafe { &mut *(*port).buffer.get() };
        buffer[..samples.len()].copy_from_slice(samples);
    }

    /// Read the first `nframes` samples of a port
    pub fn read_port(&self, name: &str, nframes: usize) -> Vec<f32> {
        let port = self.port(name);
        let buffer = unsafe { &*(*port).buffer.get() };
        buffer[..nframes].to_vec()
    }

    pub fn port_names(&self) -> Vec<(String, c_ulong)> {
        let state = self.state.lock().unwrap();
        state
            .ports
            .iter()
            .map(|port| (port.name.clone(), port.flags))
            .collect()
    }
}

impl JackApi for FakeServer {
    unsafe fn client_open(
        &self,
        name: &CStr,
        options: JackOptions,
        status: *mut JackStatus,
    ) -> *mut jack_client_t {
        let name = name.to_string_lossy().into_owned();
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Open {
            name: name.clone(),
            options,
        });

        let result = if !self.server_running {
            Err(JackStatus::FAILURE | JackStatus::SERVER_FAILED)
        } else if self.names_in_use.contains(&name) {
            Err(JackStatus::FAILURE | JackStatus::NAME_NOT_UNIQUE)
        } else {
            Ok(JackStatus::empty())
        };

        match result {
            Ok(ok) => {
                *status = ok;
                let client = state.next_client;
                state.next_client += 1;
                client as *mut jack_client_t
            }
            Err(failure) => {
                *status = failure;
                ptr::null_mut()
            }
        }
    }

    unsafe fn client_close(&self, client: *mut jack_client_t) -> c_int {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Close {
            client: client as usize,
        });
        if self.close_result == 0 {
            state.callbacks.retain(|(c, _, _)| *c != client as usize);
        }
        self.close_result
    }

    unsafe fn set_process_callback(
        &self,
        client: *mut jack_client_t,
        callback: JackProcessCallback,
        arg: *mut c_void,
    ) -> c_int {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::SetProcessCallback {
            client: client as usize,
            arg: arg as usize,
        });
        if self.callback_result == 0 {
            state.callbacks.push((client as usize, callback, arg as usize));
        }
        self.callback_result
    }

    unsafe fn activate(&self, client: *mut jack_client_t) -> c_int {
        self.state.lock().unwrap().calls.push(Call::Activate {
            client: client as usize,
        });
        self.activate_result
    }

    unsafe fn deactivate(&self, client: *mut jack_client_t) -> c_int {
        self.state.lock().unwrap().calls.push(Call::Deactivate {
            client: client as usize,
        });
        self.deactivate_result
    }

    unsafe fn port_register(
        &self,
        client: *mut jack_client_t,
        name: &CStr,
        port_type: &CStr,
        flags: c_ulong,
        _buffer_size: c_ulong,
    ) -> *mut jack_port_t {
        let name = name.to_string_lossy().into_owned();
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::PortRegister {
            client: client as usize,
            name: name.clone(),
            port_type: port_type.to_string_lossy().into_owned(),
            flags,
        });

        if self.fail_port.as_deref() == Some(name.as_str()) {
            return ptr::null_mut();
        }

        let port = Box::new(FakePort {
            name,
            flags,
            buffer: UnsafeCell::new(vec![0.0; MAX_FRAMES]),
        });
        let raw = &*port as *const FakePort as *mut jack_port_t;
        state.ports.push(port);
        raw
    }

    unsafe fn port_get_buffer(
        &self,
        port: *mut jack_port_t,
        nframes: jack_nframes_t,
    ) -> *mut c_void {
        assert!(nframes as usize <= MAX_FRAMES);
        let port = &*(port as *const FakePort);
        (*port.buffer.get()).as_mut_ptr().cast()
    }

    unsafe fn get_sample_rate(&self, _client: *mut jack_client_t) -> jack_nframes_t {
        SAMPLE_RATE
    }

    unsafe fn get_buffer_size(&self, _client: *mut jack_client_t) -> jack_nframes_t {
        BUFFER_SIZE
    }
}
