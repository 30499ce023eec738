//! Tests against a real JACK server.
//!
//! These need libjack and a running server. They are ignored by default and
//! can be run with:
//! ```
//! cargo test -p jack-bridge -- --ignored
//! ```

use jack_bridge::prelude::*;
use jack_bridge::{close_client, open_client, JackStatus, LibJack};
use std::thread;
use std::time::Duration;

#[test]
#[ignore = "Requires a running JACK server"]
fn test_open_and_close_raw_client() {
    let api = LibJack::load().expect("Failed to load libjack");
    let handle = open_client(&api, "test-client").expect("Failed to open client");

    assert!(!handle.as_ptr().is_null());
    close_client(&api, handle).expect("Failed to close client");
}

#[test]
#[ignore = "Requires a running JACK server"]
fn test_duplicate_exact_name_is_refused() {
    let first = JackClient::builder("jack-bridge-dup")
        .use_exact_name(true)
        .build()
        .expect("Failed to open first client");

    let second = JackClient::builder("jack-bridge-dup").use_exact_name(true).build();
    match second {
        Err(Error::ClientOpenFailed { status, .. }) => {
            assert!(status.contains(JackStatus::FAILURE));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("second client with the same exact name should fail"),
    }

    drop(first);
}

#[test]
#[ignore = "Requires a running JACK server"]
fn test_active_client_runs_process_cycles() {
    let _ = env_logger::builder().is_test(true).try_init();

    let client = JackClient::new("jack-bridge-test", 1, 1).expect("Failed to create client");
    let buffer_size = client.buffer_size();
    assert!(client.sample_rate() > 0);
    assert!(buffer_size > 0);

    let active = client
        .activate(move |scope: &mut ProcessScope<'_>| {
            assert_eq!(scope.nframes(), buffer_size);
            if let Some(output) = scope.output(0) {
                output.fill(0.0);
            }
            ProcessStatus::Continue
        })
        .expect("Failed to activate");

    thread::sleep(Duration::from_millis(500));

    assert!(active.cycles() > 0, "server never called the process callback");
    assert_eq!(active.handler_failures(), 0);
    active.deactivate().expect("Failed to deactivate");
}
