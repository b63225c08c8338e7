//! Shared utilities for host integration tests.

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use route_priority::config::{parse_config, HostConfig};
use route_priority::lifecycle::{Host, Shutdown, StartupError};

/// Routes registered least specific first, so registration order and
/// precedence order disagree.
pub const CONFIG: &str = r#"
    [[routes]]
    name = "catch-all"
    template = "{id}"

    [[routes]]
    name = "user-by-id"
    template = "users/{id}"

    [[routes]]
    name = "user-by-int"
    template = "users/{id:int}"

    [[routes]]
    name = "user-me"
    template = "users/me"

    [[groups]]
    name = "orders"

    [[groups.routes]]
    name = "create-order"
    template = "orders"
    methods = ["POST"]
"#;

pub fn config() -> HostConfig {
    parse_config(CONFIG).unwrap()
}

/// A host running on an ephemeral port.
#[allow(dead_code)]
pub struct TestHost {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), StartupError>>,
}

#[allow(dead_code)]
impl TestHost {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        self.handle.await.unwrap().unwrap();
    }
}

/// Start a host and wait until it answers.
pub async fn start_host(config: HostConfig) -> TestHost {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();

    let host = Host::new(config).unwrap();
    let handle = tokio::spawn(host.run(listener, rx));

    let client = reqwest::Client::new();
    for _ in 0..50 {
        if client.get(format!("http://{}/", addr)).send().await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    TestHost {
        addr,
        shutdown,
        handle,
    }
}
