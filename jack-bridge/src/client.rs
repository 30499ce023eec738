//! JACK client wrapper with ports and a safe process handler

use crate::{
    bridge::{self, ClientHandle, ContextToken, RawProcessHandler},
    config::ClientConfig,
    error::{Error, Result},
    ffi::{
        jack_client_t, jack_port_t, Frames, JackApi, DEFAULT_AUDIO_TYPE, PORT_IS_INPUT,
        PORT_IS_OUTPUT,
    },
    library::LibJack,
};
use log::{debug, info, warn};
use std::ffi::{c_int, c_ulong, CString};
use std::panic::{self, AssertUnwindSafe};
use std::ptr::NonNull;
use std::slice;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A registered port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortHandle(NonNull<jack_port_t>);

unsafe impl Send for PortHandle {}
unsafe impl Sync for PortHandle {}

impl PortHandle {
    /// Raw port pointer
    pub fn as_ptr(self) -> *mut jack_port_t {
        self.0.as_ptr()
    }
}

/// Result of one process block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Block handled
    Continue,
    /// Block failed. The server is not told; the failure is only counted.
    Failed,
}

/// Caller logic run once per audio block on the server's real-time thread
pub trait ProcessHandler: Send + 'static {
    /// Handle one block
    fn process(&mut self, scope: &mut ProcessScope<'_>) -> ProcessStatus;
}

impl<F> ProcessHandler for F
where
    F: FnMut(&mut ProcessScope<'_>) -> ProcessStatus + Send + 'static,
{
    fn process(&mut self, scope: &mut ProcessScope<'_>) -> ProcessStatus {
        self(scope)
    }
}

/// Port buffers for the current block
///
/// Input slices stay borrowed for the whole block while output slices borrow
/// the scope mutably. This assumes no input port shares its buffer with one of
/// this client's output ports: do not connect a client's `out_i` back to its
/// own `in_i`, or the two slices alias.
pub struct ProcessScope<'a> {
    api: &'a dyn JackApi,
    inputs: &'a [PortHandle],
    outputs: &'a [PortHandle],
    nframes: Frames,
}

impl<'a> ProcessScope<'a> {
    /// Frames in this block
    pub fn nframes(&self) -> Frames {
        self.nframes
    }

    /// Number of input ports
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of output ports
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Samples of input port `index` for this block
    ///
    /// Valid for the whole block; see the aliasing note on [`ProcessScope`].
    pub fn input(&self, index: usize) -> Option<&'a [f32]> {
        let port = self.inputs.get(index)?;
        let buffer = unsafe { self.api.port_get_buffer(port.as_ptr(), self.nframes) } as *const f32;
        if buffer.is_null() {
            return None;
        }
        // SAFETY: the server guarantees `nframes` samples for the whole cycle
        Some(unsafe { slice::from_raw_parts(buffer, self.nframes as usize) })
    }

    /// Samples of output port `index` for this block
    pub fn output(&mut self, index: usize) -> Option<&mut [f32]> {
        let port = self.outputs.get(index)?;
        let buffer = unsafe { self.api.port_get_buffer(port.as_ptr(), self.nframes) } as *mut f32;
        if buffer.is_null() {
            return None;
        }
        // SAFETY: as above, and `&mut self` keeps one output slice alive at a time
        Some(unsafe { slice::from_raw_parts_mut(buffer, self.nframes as usize) })
    }
}

/// Counters updated from the process thread
#[derive(Debug, Default)]
struct ProcessStats {
    cycles: AtomicU64,
    failures: AtomicU64,
}

/// State reachable from the process thread through the context token
struct ProcessState {
    api: Arc<dyn JackApi>,
    inputs: Vec<PortHandle>,
    outputs: Vec<PortHandle>,
    handler: Box<dyn ProcessHandler>,
    stats: Arc<ProcessStats>,
}

impl ProcessState {
    fn run(&mut self, nframes: Frames) -> c_int {
        let Self {
            api,
            inputs,
            outputs,
            handler,
            stats,
        } = self;

        stats.cycles.fetch_add(1, Ordering::Relaxed);

        let mut scope = ProcessScope {
            api: &**api,
            inputs: inputs.as_slice(),
            outputs: outputs.as_slice(),
            nframes,
        };
        let status = panic::catch_unwind(AssertUnwindSafe(|| handler.process(&mut scope)))
            .unwrap_or(ProcessStatus::Failed);

        match status {
            ProcessStatus::Continue => 0,
            ProcessStatus::Failed => {
                stats.failures.fetch_add(1, Ordering::Relaxed);
                1
            }
        }
    }
}

/// Routes trampoline calls to the [`ProcessState`] behind the context token
struct Dispatch;

impl RawProcessHandler for Dispatch {
    fn on_process(nframes: Frames, context: ContextToken) -> c_int {
        let Some(state) = NonNull::new(context.as_ptr() as *mut ProcessState) else {
            return 1;
        };
        // SAFETY: the owning ActiveClient frees the state only after the
        // client is closed, and the server never runs two process calls for
        // one client at once.
        unsafe { (*state.as_ptr()).run(nframes) }
    }
}

/// An open, inactive JACK client with its ports
pub struct JackClient {
    api: Arc<dyn JackApi>,
    handle: Option<ClientHandle>,
    name: String,
    inputs: Vec<PortHandle>,
    outputs: Vec<PortHandle>,
}

impl JackClient {
    /// Create a client with the given name and port counts, loading the
    /// JACK library from its default location
    pub fn new(name: &str, num_inputs: usize, num_outputs: usize) -> Result<Self> {
        Self::builder(name)
            .input_ports(num_inputs)
            .output_ports(num_outputs)
            .build()
    }

    /// Create a client builder
    pub fn builder(name: &str) -> JackClientBuilder {
        JackClientBuilder {
            config: ClientConfig {
                name: name.to_string(),
                ..ClientConfig::default()
            },
        }
    }

    /// Create a client from a configuration, loading the JACK library
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let api = LibJack::load_with(config.library_path.as_deref())?;
        Self::open(Arc::new(api), config)
    }

    /// Open a client on the given server API and register its ports
    pub fn open(api: Arc<dyn JackApi>, config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let handle = bridge::open_client_with_options(&*api, &config.name, config.options())?;

        // From here on, Drop closes the client if port registration fails
        let mut client = Self {
            api,
            handle: Some(handle),
            name: config.name.clone(),
            inputs: Vec::with_capacity(config.input_ports),
            outputs: Vec::with_capacity(config.output_ports),
        };

        for i in 0..config.input_ports {
            let port = client.register_port(&format!("in_{}", i), PORT_IS_INPUT)?;
            client.inputs.push(port);
        }
        for i in 0..config.output_ports {
            let port = client.register_port(&format!("out_{}", i), PORT_IS_OUTPUT)?;
            client.outputs.push(port);
        }

        info!(
            "JACK client '{}' ready: {} inputs, {} outputs, {} Hz, {} frames",
            client.name,
            client.inputs.len(),
            client.outputs.len(),
            client.sample_rate(),
            client.buffer_size()
        );
        Ok(client)
    }

    fn register_port(&self, name: &str, flags: c_ulong) -> Result<PortHandle> {
        let c_name = CString::new(name).map_err(|_| Error::InvalidName(name.to_string()))?;
        let port = unsafe {
            self.api
                .port_register(self.raw_handle(), &c_name, DEFAULT_AUDIO_TYPE, flags, 0)
        };
        NonNull::new(port)
            .map(PortHandle)
            .ok_or_else(|| Error::PortRegistrationFailed(name.to_string()))
    }

    fn raw_handle(&self) -> *mut jack_client_t {
        self.handle
            .as_ref()
            .map(ClientHandle::as_ptr)
            .unwrap_or(std::ptr::null_mut())
    }

    /// Client name as requested
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Server sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        unsafe { self.api.get_sample_rate(self.raw_handle()) }
    }

    /// Current server block size in frames
    pub fn buffer_size(&self) -> u32 {
        unsafe { self.api.get_buffer_size(self.raw_handle()) }
    }

    /// Number of input ports
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of output ports
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Install `handler` as the process callback and activate the client.
    ///
    /// Consumes the client: the server accepts a single process callback per
    /// client. On failure the client is closed.
    pub fn activate<H: ProcessHandler>(mut self, handler: H) -> Result<ActiveClient> {
        let handle = self.handle.take().ok_or(Error::ClientClosed)?;
        let raw = handle.as_ptr();

        let stats = Arc::new(ProcessStats::default());
        let state = Box::new(ProcessState {
            api: Arc::clone(&self.api),
            inputs: std::mem::take(&mut self.inputs),
            outputs: std::mem::take(&mut self.outputs),
            handler: Box::new(handler),
            stats: Arc::clone(&stats),
        });
        let state = NonNull::from(Box::leak(state));

        let context = ContextToken::from_raw(state.as_ptr().cast());
        // SAFETY: `active` below owns the state and frees it only after closing
        let registered =
            unsafe { bridge::register_callback::<_, Dispatch>(&*self.api, &handle, context) };

        // From here on, Drop closes the client and frees the state on failure
        let mut active = ActiveClient {
            api: Arc::clone(&self.api),
            handle: Some(handle),
            name: std::mem::take(&mut self.name),
            state: Some(state),
            stats,
            activated: false,
        };
        registered?;

        let code = unsafe { active.api.activate(raw) };
        if code != 0 {
            return Err(Error::ActivationFailed(code));
        }
        active.activated = true;

        info!("Activated JACK client '{}'", active.name);
        Ok(active)
    }

    /// Close the client, reporting the server's status
    pub fn close(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => bridge::close_client(&*self.api, handle),
            None => Ok(()),
        }
    }
}

impl Drop for JackClient {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = bridge::close_client(&*self.api, handle) {
                warn!("Failed to close JACK client '{}': {}", self.name, e);
            }
        }
    }
}

/// Builder for [`JackClient`]
pub struct JackClientBuilder {
    config: ClientConfig,
}

impl JackClientBuilder {
    /// Set the number of input ports
    pub fn input_ports(mut self, count: usize) -> Self {
        self.config.input_ports = count;
        self
    }

    /// Set the number of output ports
    pub fn output_ports(mut self, count: usize) -> Self {
        self.config.output_ports = count;
        self
    }

    /// Allow or forbid starting a server when none is running
    pub fn start_server(mut self, enabled: bool) -> Self {
        self.config.start_server = enabled;
        self
    }

    /// Fail instead of letting the server rename the client
    pub fn use_exact_name(mut self, enabled: bool) -> Self {
        self.config.use_exact_name = enabled;
        self
    }

    /// Load the JACK library from an explicit path
    pub fn library_path<P: Into<std::path::PathBuf>>(mut self, path: P) -> Self {
        self.config.library_path = Some(path.into());
        self
    }

    /// Configuration built so far
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Load the JACK library and open the client
    pub fn build(self) -> Result<JackClient> {
        JackClient::from_config(&self.config)
    }

    /// Open the client on an already loaded server API
    pub fn build_with(self, api: Arc<dyn JackApi>) -> Result<JackClient> {
        JackClient::open(api, &self.config)
    }
}

/// A running JACK client.
///
/// Dropping it deactivates and closes the client, then frees the handler.
pub struct ActiveClient {
    api: Arc<dyn JackApi>,
    handle: Option<ClientHandle>,
    name: String,
    state: Option<NonNull<ProcessState>>,
    stats: Arc<ProcessStats>,
    activated: bool,
}

// The state pointer is only dereferenced by the process thread while the
// client is open, and by the owner after it is closed.
unsafe impl Send for ActiveClient {}

impl ActiveClient {
    fn raw_handle(&self) -> *mut jack_client_t {
        self.handle
            .as_ref()
            .map(ClientHandle::as_ptr)
            .unwrap_or(std::ptr::null_mut())
    }

    /// Client name as requested
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Server sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        unsafe { self.api.get_sample_rate(self.raw_handle()) }
    }

    /// Current server block size in frames
    pub fn buffer_size(&self) -> u32 {
        unsafe { self.api.get_buffer_size(self.raw_handle()) }
    }

    /// Process blocks handled so far
    pub fn cycles(&self) -> u64 {
        self.stats.cycles.load(Ordering::Relaxed)
    }

    /// Blocks whose handler failed or panicked
    pub fn handler_failures(&self) -> u64 {
        self.stats.failures.load(Ordering::Relaxed)
    }

    /// Deactivate and close the client, reporting the first error
    pub fn deactivate(mut self) -> Result<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.handle.is_none() && self.state.is_none() {
            return Ok(());
        }

        let mut result = Ok(());
        let mut stopped = !self.activated;

        if let Some(handle) = self.handle.take() {
            if self.activated {
                let code = unsafe { self.api.deactivate(handle.as_ptr()) };
                if code == 0 {
                    stopped = true;
                } else {
                    result = Err(Error::DeactivationFailed(code));
                }
                self.activated = false;
            }

            match bridge::close_client(&*self.api, handle) {
                Ok(()) => stopped = true,
                Err(e) => {
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
            }
        }

        if let Some(state) = self.state.take() {
            if stopped {
                // The callback can no longer run
                drop(unsafe { Box::from_raw(state.as_ptr()) });
            } else {
                warn!(
                    "JACK client '{}' may still be running; leaking its process state",
                    self.name
                );
            }
        }

        debug!(
            "JACK client '{}' stopped after {} cycles ({} failed)",
            self.name,
            self.cycles(),
            self.handler_failures()
        );
        result
    }
}

impl Drop for ActiveClient {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Failed to shut down JACK client '{}': {}", self.name, e);
        }
    }
}
