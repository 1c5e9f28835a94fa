//! Shared utilities for integration and load testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use simple_lb::config::{BackendConfig, LbConfig};
use simple_lb::lifecycle::startup::build_pool;
use simple_lb::{HttpServer, Shutdown};

/// Start a simple mock backend that returns a fixed response.
pub async fn start_mock_backend(response: &'static str) -> SocketAddr {
    start_programmable_backend(move || async move { (200, response.to_string()) }).await
}

/// Start a programmable mock backend with async support.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let _ = read_head(&mut socket).await;
                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        write_response(&mut socket, status_text, &body).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a backend that answers with the request head it received.
#[allow(dead_code)]
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let head = read_head(&mut socket).await;
                write_response(&mut socket, "200 OK", &head).await;
            });
        }
    });

    addr
}

/// An address nothing is listening on.
#[allow(dead_code)]
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Config for a proxy on an ephemeral port in front of `backends`.
#[allow(dead_code)]
pub fn proxy_config(backends: &[SocketAddr]) -> LbConfig {
    let mut config = LbConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.backends = backends
        .iter()
        .map(|addr| BackendConfig::from(format!("http://{}", addr).as_str()))
        .collect();
    config.health_check.enabled = false;
    config.dispatch.retry_delay_ms = 1;
    config.timeouts.connect_secs = 1;
    config.timeouts.request_secs = 5;
    config
}

/// A running proxy; dropping it leaves the server up until `shutdown` fires.
#[allow(dead_code)]
pub struct RunningProxy {
    pub addr: SocketAddr,
    pub pool: Arc<simple_lb::BackendPool>,
    pub shutdown: Shutdown,
}

/// Build the pool, bind, and run the proxy in the background.
#[allow(dead_code)]
pub async fn start_proxy(config: LbConfig) -> RunningProxy {
    let pool = Arc::new(build_pool(&config).unwrap());
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, pool.clone());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    RunningProxy {
        addr,
        pool,
        shutdown,
    }
}

#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

async fn read_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

async fn write_response(socket: &mut TcpStream, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}
