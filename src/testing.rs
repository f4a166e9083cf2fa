//! Minimal HTTP/1.1 file server for exercising the downloader in tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub range: Option<String>,
}

#[derive(Default)]
struct ServerState {
    files: HashMap<String, Vec<u8>>,
    root_status: u16,
    /// Send only this many body bytes of a GET, then drop the connection.
    cut_after: Option<usize>,
    /// Keep each file GET waiting this long before answering.
    hold: Option<Duration>,
    in_flight: usize,
    peak_in_flight: usize,
    seen: Vec<SeenRequest>,
}

#[derive(Clone)]
pub struct TestServer {
    addr: SocketAddr,
    state: Arc<Mutex<ServerState>>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(ServerState {
            root_status: 200,
            ..ServerState::default()
        }));

        let server_state = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let state = Arc::clone(&server_state);
                tokio::spawn(async move {
                    let _ = handle(stream, state).await;
                });
            }
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Prefix under which files added with [`TestServer::add_file`] live.
    pub fn prefix(&self, model: &str) -> String {
        format!("{}/{model}/resolve/main/", self.base_url())
    }

    pub fn add_file(&self, model: &str, name: &str, body: Vec<u8>) {
        let path = format!("/{model}/resolve/main/{name}");
        self.state.lock().unwrap().files.insert(path, body);
    }

    pub fn set_root_status(&self, status: u16) {
        self.state.lock().unwrap().root_status = status;
    }

    pub fn cut_bodies_after(&self, bytes: Option<usize>) {
        self.state.lock().unwrap().cut_after = bytes;
    }

    pub fn hold_file_gets(&self, hold: Duration) {
        self.state.lock().unwrap().hold = Some(hold);
    }

    /// Most file GETs that were held at the same moment.
    pub fn peak_in_flight(&self) -> usize {
        self.state.lock().unwrap().peak_in_flight
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.state.lock().unwrap().seen.clone()
    }

    pub fn gets(&self) -> Vec<SeenRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "GET" && r.path != "/")
            .collect()
    }
}

async fn handle(mut stream: TcpStream, state: Arc<Mutex<ServerState>>) -> std::io::Result<()> {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        head.extend_from_slice(&buf[..n]);
    }

    let head = String::from_utf8_lossy(&head).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    let range = lines.find_map(|line| {
        let (name, value) = line.split_once(':')?;
        name.eq_ignore_ascii_case("range").then(|| value.trim().to_string())
    });

    let (status, body, cut_after, hold) = {
        let mut state = state.lock().unwrap();
        state.seen.push(SeenRequest {
            method: method.clone(),
            path: path.clone(),
            range: range.clone(),
        });
        let (status, body, cut_after) = if path == "/" {
            (state.root_status, b"ok".to_vec(), None)
        } else {
            match state.files.get(&path) {
                Some(file) => {
                    let start = range
                        .as_deref()
                        .and_then(|r| r.strip_prefix("bytes="))
                        .and_then(|r| r.trim_end_matches('-').parse::<usize>().ok());
                    match start {
                        Some(start) if start <= file.len() => {
                            (206, file[start..].to_vec(), state.cut_after)
                        }
                        Some(_) => (416, Vec::new(), None),
                        None => (200, file.clone(), state.cut_after),
                    }
                }
                None => (404, b"not found".to_vec(), None),
            }
        };

        let hold = state.hold.filter(|_| method == "GET" && matches!(status, 200 | 206));
        if hold.is_some() {
            state.in_flight += 1;
            state.peak_in_flight = state.peak_in_flight.max(state.in_flight);
        }
        (status, body, cut_after, hold)
    };

    // Leave the in-flight set before the client can see any byte of the
    // answer, so a follow-up request never overlaps a finished one.
    if let Some(hold) = hold {
        tokio::time::sleep(hold).await;
        state.lock().unwrap().in_flight -= 1;
    }

    let reason = match status {
        200 => "OK",
        202 => "Accepted",
        206 => "Partial Content",
        404 => "Not Found",
        416 => "Range Not Satisfiable",
        _ => "Status",
    };
    let header = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    stream.write_all(header.as_bytes()).await?;

    if method != "HEAD" {
        let sent = cut_after.map_or(body.len(), |n| n.min(body.len()));
        stream.write_all(&body[..sent]).await?;
    }
    stream.flush().await?;
    stream.shutdown().await
}

/// Deterministic, non-repeating-looking payload of `len` bytes.
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}
