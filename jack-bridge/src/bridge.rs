//! Client opener, process callback registration and the trampoline
//!
//! This is the thin layer that talks to the server directly. Callers that
//! want ports and buffer access should use [`crate::client::JackClient`],
//! which is built on top of these functions.

use crate::{
    error::{Error, Result},
    ffi::{jack_client_t, Frames, JackApi, JackOptions, JackStatus, PROCESS_OK},
};
use log::{debug, warn};
use std::ffi::{c_int, c_void, CString};
use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, NonNull};

/// An open connection to the JACK server.
///
/// Never null: a failed open produces an [`Error`] instead of a handle, so a
/// handle can always be passed on to the server. Release it with
/// [`close_client`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ClientHandle(NonNull<jack_client_t>);

// The handle is an opaque token for the server; libjack's client calls may be
// made from any thread.
unsafe impl Send for ClientHandle {}
unsafe impl Sync for ClientHandle {}

impl ClientHandle {
    /// Wrap a raw client pointer, returning `None` for null
    ///
    /// # Safety
    ///
    /// `ptr` must be a client returned by `jack_client_open` that has not
    /// been closed, and must not be wrapped twice.
    pub unsafe fn from_raw(ptr: *mut jack_client_t) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    /// Raw client pointer
    pub fn as_ptr(&self) -> *mut jack_client_t {
        self.0.as_ptr()
    }
}

/// Opaque context handed back to the process handler on every block.
///
/// The bridge never dereferences, allocates or frees the address it carries;
/// whoever registers the callback owns the pointee and must keep it alive
/// until the client is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextToken(*mut c_void);

unsafe impl Send for ContextToken {}
unsafe impl Sync for ContextToken {}

impl ContextToken {
    /// The "no context" token
    pub const NONE: Self = Self(ptr::null_mut());

    /// Wrap a raw `void *` argument
    pub fn from_raw(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    /// Wrap a plain address
    pub fn from_addr(addr: usize) -> Self {
        Self(addr as *mut c_void)
    }

    /// Raw `void *` argument
    pub fn as_ptr(self) -> *mut c_void {
        self.0
    }

    /// Address as an integer
    pub fn addr(self) -> usize {
        self.0 as usize
    }

    /// Whether this is [`ContextToken::NONE`]
    pub fn is_none(self) -> bool {
        self.0.is_null()
    }
}

impl Default for ContextToken {
    fn default() -> Self {
        Self::NONE
    }
}

/// Caller logic run by [`process_trampoline`] once per audio block.
///
/// Runs on the server's real-time thread: implementations must not block,
/// allocate or do I/O. The return value is ignored by the trampoline.
pub trait RawProcessHandler {
    /// Handle one block of `nframes` frames
    fn on_process(nframes: Frames, context: ContextToken) -> c_int;
}

/// Process callback installed by [`register_callback`].
///
/// Forwards `nframes` and the registered context unmodified to
/// `H::on_process` and always returns [`PROCESS_OK`], whatever the handler
/// returned. A panic in the handler is stopped here and also yields
/// [`PROCESS_OK`].
pub extern "C" fn process_trampoline<H: RawProcessHandler>(
    nframes: Frames,
    arg: *mut c_void,
) -> c_int {
    let context = ContextToken::from_raw(arg);
    let _ = panic::catch_unwind(AssertUnwindSafe(|| H::on_process(nframes, context)));
    PROCESS_OK
}

/// Open a client named `name` with default options (`JackNullOption`)
pub fn open_client<A: JackApi + ?Sized>(api: &A, name: &str) -> Result<ClientHandle> {
    open_client_with_options(api, name, JackOptions::NULL)
}

/// Open a client named `name` with explicit open options
///
/// A null client from the server is returned as
/// [`Error::ClientOpenFailed`] with the server's status bits unmodified.
pub fn open_client_with_options<A: JackApi + ?Sized>(
    api: &A,
    name: &str,
    options: JackOptions,
) -> Result<ClientHandle> {
    let c_name = CString::new(name).map_err(|_| Error::InvalidName(name.to_string()))?;
    let mut status = JackStatus::empty();

    let client = unsafe { api.client_open(&c_name, options, &mut status) };

    match unsafe { ClientHandle::from_raw(client) } {
        Some(handle) => {
            debug!("Opened JACK client '{}' (status: {})", name, status);
            Ok(handle)
        }
        None => {
            warn!("JACK refused client '{}' (status: {})", name, status);
            Err(Error::ClientOpenFailed {
                name: name.to_string(),
                status,
            })
        }
    }
}

/// Install [`process_trampoline::<H>`] as the process callback of `client`.
///
/// Calls `jack_set_process_callback` exactly once and returns its status as
/// an error instead of dropping it. The server keeps a single process
/// callback per client, so call this at most once per client and before
/// activation.
///
/// # Safety
///
/// `context` is handed to `H::on_process` on the server's thread until the
/// client is closed. Whatever `H` does with it must stay valid for that long.
pub unsafe fn register_callback<A, H>(
    api: &A,
    client: &ClientHandle,
    context: ContextToken,
) -> Result<()>
where
    A: JackApi + ?Sized,
    H: RawProcessHandler,
{
    let code = api.set_process_callback(client.as_ptr(), process_trampoline::<H>, context.as_ptr());
    if code != 0 {
        return Err(Error::CallbackRegistrationFailed(code));
    }
    Ok(())
}

/// Close `client`, which also stops its process callback
pub fn close_client<A: JackApi + ?Sized>(api: &A, client: ClientHandle) -> Result<()> {
    let code = unsafe { api.client_close(client.as_ptr()) };
    if code != 0 {
        return Err(Error::CloseFailed(code));
    }
    debug!("Closed JACK client");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_token_addresses() {
        assert!(ContextToken::NONE.is_none());
        assert_eq!(ContextToken::default(), ContextToken::NONE);

        let token = ContextToken::from_addr(0xDEAD_BEEF);
        assert!(!token.is_none());
        assert_eq!(token.addr(), 0xDEAD_BEEF);
        assert_eq!(ContextToken::from_raw(token.as_ptr()), token);
    }

    #[test]
    fn test_null_client_is_not_a_handle() {
        assert!(unsafe { ClientHandle::from_raw(ptr::null_mut()) }.is_none());
    }

    struct Failing;

    impl RawProcessHandler for Failing {
        fn on_process(_nframes: Frames, _context: ContextToken) -> c_int {
            -1
        }
    }

    #[test]
    fn test_trampoline_ignores_handler_status() {
        assert_eq!(process_trampoline::<Failing>(64, ptr::null_mut()), PROCESS_OK);
    }
}
