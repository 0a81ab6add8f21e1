// Shared round server for integration tests; started once per test binary.

use round_server::ServerConfig;
use std::net::{SocketAddr, TcpStream};
use std::sync::{OnceLock, mpsc};
use std::time::Duration;

static BASE_URL: OnceLock<String> = OnceLock::new();

const READY_ATTEMPTS: usize = 100;
const READY_POLL: Duration = Duration::from_millis(20);

/// Returns the base URL of the shared server, starting it on first use.
pub fn ensure_server() -> &'static str {
    BASE_URL.get_or_init(|| {
        let addr = spawn_server_thread();
        wait_until_accepting(addr);
        format!("http://{addr}")
    })
}

// The server gets its own runtime so it survives each `#[tokio::test]` runtime.
fn spawn_server_thread() -> SocketAddr {
    let (addr_tx, addr_rx) = mpsc::channel();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("round server runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind ephemeral port");
            addr_tx
                .send(listener.local_addr().expect("listener address"))
                .expect("publish server address");

            // Tests drive every round explicitly.
            let config = ServerConfig {
                auto_start_delay_ms: 0,
                ..ServerConfig::default()
            };
            round_server::run(listener, config)
                .await
                .expect("round server stopped");
        });
    });

    addr_rx.recv().expect("server thread exited before binding")
}

fn wait_until_accepting(addr: SocketAddr) {
    for _ in 0..READY_ATTEMPTS {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        std::thread::sleep(READY_POLL);
    }
    panic!("round server at {addr} never accepted connections");
}
