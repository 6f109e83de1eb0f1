use crate::routing::{TopologyEvent, TopologyEventListener};
use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Build a configuration document for `hosts` at `revision`.
pub(crate) fn config_document(revision: u64, hosts: &[&str]) -> String {
    let nodes: Vec<String> = hosts
        .iter()
        .map(|host| {
            let (ip, port) = host.split_once(':').unwrap_or((host, "11210"));
            format!(r#"{{"hostname":"{}","ports":{{"direct":{}}}}}"#, ip, port)
        })
        .collect();
    format!(
        r#"{{"rev":{},"name":"default","nodes":[{}]}}"#,
        revision,
        nodes.join(",")
    )
}

/// Split `bytes` into chunks of `size`, the last one possibly shorter.
pub(crate) fn fragment(bytes: &[u8], size: usize) -> Vec<Vec<u8>> {
    bytes.chunks(size.max(1)).map(<[u8]>::to_vec).collect()
}

/// Poll `condition` until it holds or `timeout` elapses.
pub(crate) fn wait_until<F>(mut condition: F, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Listener keeping every event it receives.
#[derive(Default)]
pub(crate) struct EventRecorder {
    events: Mutex<Vec<TopologyEvent>>,
}

impl EventRecorder {
    pub(crate) fn events(&self) -> Vec<TopologyEvent> {
        self.events.lock().clone()
    }

    pub(crate) fn disconnects(&self) -> Vec<TopologyEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.is_disconnect())
            .cloned()
            .collect()
    }
}

impl TopologyEventListener for EventRecorder {
    fn on_event(&self, event: TopologyEvent) {
        self.events.lock().push(event);
    }
}
