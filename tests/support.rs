//! One-shot HTTP stub standing in for the Overpass interpreter.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;

pub struct StubServer {
    pub url: String,
    handle: JoinHandle<String>,
}

impl StubServer {
    /// Serves a single request with `status` and `body`.
    pub fn respond(status: &str, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub");
        let addr = listener.local_addr().expect("stub address");
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );

        let handle = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).expect("read request");
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            stream.write_all(response.as_bytes()).expect("write response");
            String::from_utf8_lossy(&request).into_owned()
        });

        Self {
            url: format!("http://{}/api/interpreter", addr),
            handle,
        }
    }

    /// The raw request the stub received.
    pub fn request(self) -> String {
        self.handle.join().expect("stub thread")
    }
}

/// A local URL nothing is listening on.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("address");
    drop(listener);
    format!("http://{}/api/interpreter", addr)
}

pub const SPRINGS: &str = r#"{
  "version": 0.6,
  "elements": [
    {"type": "node", "id": 101, "lat": 40.0, "lon": -0.25,
     "tags": {"name": "Spring A", "natural": "spring"}},
    {"type": "node", "id": 102, "lat": 40.02, "lon": -0.21,
     "tags": {"natural": "cave_entrance", "access": "yes"}},
    {"type": "node", "id": 103, "lat": 40.03, "lon": -0.2,
     "tags": {"name": "Castell", "historic": "castle"}}
  ]
}"#;

pub const NAMELESS: &str = r#"{
  "elements": [
    {"type": "node", "id": 201, "lat": 40.0, "lon": -0.25,
     "tags": {"name": "Font", "natural": "spring"}},
    {"type": "node", "id": 202, "lat": 40.0, "lon": -0.25,
     "tags": {"building": "hut"}}
  ]
}"#;
