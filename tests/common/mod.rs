//! Shared mock servers for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Read until the end of the request head so closing the socket never resets it.
async fn read_request_head(socket: &mut TcpStream) -> String {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
    String::from_utf8_lossy(&head).into_owned()
}

fn status_line(status: u16) -> &'static str {
    match status {
        200 => "200 OK",
        204 => "204 No Content",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    }
}

/// Start a health backend whose status comes from `f` on every request.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = u16> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                read_request_head(&mut socket).await;
                let status = f().await;
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status_line(status)
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Start a health backend that always answers with `status`.
#[allow(dead_code)]
pub async fn start_mock_backend(status: u16) -> SocketAddr {
    start_programmable_backend(move || async move { status }).await
}

/// Start a backend that accepts connections and never answers.
#[allow(dead_code)]
pub async fn start_silent_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// An address nothing listens on.
#[allow(dead_code)]
pub fn closed_port() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// One scripted connection to the mock API server.
#[allow(dead_code)]
pub enum Session {
    /// 200 response whose body is written chunk by chunk, then the connection drops.
    Stream(Vec<Chunk>),
    /// Non-success response with an empty body.
    Status(u16),
}

#[allow(dead_code)]
pub enum Chunk {
    Bytes(Vec<u8>),
    Pause(Duration),
}

#[allow(dead_code)]
pub fn data(text: &str) -> Chunk {
    Chunk::Bytes(text.as_bytes().to_vec())
}

#[allow(dead_code)]
pub fn pause(ms: u64) -> Chunk {
    Chunk::Pause(Duration::from_millis(ms))
}

/// Mock API server handle: address plus the request heads it received.
#[allow(dead_code)]
pub struct WatchServer {
    pub addr: SocketAddr,
    pub requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl WatchServer {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

/// Start a mock API server that plays `sessions` to successive connections.
///
/// Once the script is exhausted, further connections get a 200 with an
/// open, silent body.
#[allow(dead_code)]
pub async fn start_watch_server(sessions: Vec<Session>) -> WatchServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = requests.clone();

    tokio::spawn(async move {
        let mut sessions = sessions.into_iter();
        let mut held = Vec::new();

        while let Ok((mut socket, _)) = listener.accept().await {
            let head = read_request_head(&mut socket).await;
            log.lock().unwrap().push(head);

            match sessions.next() {
                Some(Session::Status(status)) => {
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        status_line(status)
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                }
                Some(Session::Stream(chunks)) => {
                    tokio::spawn(async move {
                        let _ = socket
                            .write_all(
                                b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nConnection: close\r\n\r\n",
                            )
                            .await;
                        for chunk in chunks {
                            match chunk {
                                Chunk::Bytes(bytes) => {
                                    let _ = socket.write_all(&bytes).await;
                                    let _ = socket.flush().await;
                                }
                                Chunk::Pause(delay) => tokio::time::sleep(delay).await,
                            }
                        }
                        let _ = socket.shutdown().await;
                    });
                }
                None => {
                    let _ = socket
                        .write_all(b"HTTP/1.1 200 OK\r\nConnection: close\r\n\r\n")
                        .await;
                    held.push(socket);
                }
            }
        }
    });

    WatchServer { addr, requests }
}

/// A watch line for a slice with `(address, ready)` members on port 8080.
#[allow(dead_code)]
pub fn slice_event(kind: &str, members: &[(&str, bool)]) -> String {
    let endpoints: Vec<serde_json::Value> = members
        .iter()
        .map(|(addr, ready)| {
            serde_json::json!({
                "addresses": [addr],
                "conditions": {"ready": ready},
                "targetRef": {"kind": "Pod", "name": format!("pod-{}", addr), "namespace": "prod"},
                "nodeName": "node-a"
            })
        })
        .collect();

    let event = serde_json::json!({
        "type": kind,
        "object": {
            "kind": "EndpointSlice",
            "metadata": {"name": "web-abc12", "namespace": "prod"},
            "addressType": "IPv4",
            "endpoints": endpoints,
            "ports": [{"name": "http", "port": 8080, "protocol": "TCP"}]
        }
    });

    format!("{}\n", event)
}
