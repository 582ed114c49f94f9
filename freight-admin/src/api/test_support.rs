// Loopback HTTP server for fetcher tests. Serves canned responses in order,
// one per connection, and records each raw request.

use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::config::ApiSettings;

pub struct Canned {
    status: u16,
    body: String,
    delay: Option<Duration>,
}

impl Canned {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            delay: None,
        }
    }

    pub fn delayed(mut self, millis: u64) -> Self {
        self.delay = Some(Duration::from_millis(millis));
        self
    }
}

pub struct CannedServer {
    addr: std::net::SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl CannedServer {
    pub async fn start(responses: Vec<Canned>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();
        tokio::spawn(async move {
            for canned in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let raw = read_request(&mut stream).await;
                seen.lock().unwrap().push(raw);
                if let Some(delay) = canned.delay {
                    tokio::time::sleep(delay).await;
                }
                let reply = format!(
                    "HTTP/1.1 {} Canned\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    canned.status,
                    canned.body.len(),
                    canned.body
                );
                let _ = stream.write_all(reply.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });
        Self { addr, requests }
    }

    /// Root URL with the `/api` prefix the backend uses.
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Root URL without a path prefix.
    pub fn root_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = find_header_end(&buf) {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Backend settings pointing at `base_url`, bypassing any system proxy.
pub fn settings_for(base_url: &str) -> ApiSettings {
    ApiSettings {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        use_system_proxy: false,
    }
}

/// Body of a recorded request (everything after the blank line).
pub fn body_of(raw: &str) -> &str {
    raw.split_once("\r\n\r\n").map(|(_, body)| body).unwrap_or("")
}
