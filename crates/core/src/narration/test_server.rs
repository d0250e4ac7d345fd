//! One-shot HTTP responder for exercising the service client offline.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

/// Answer the first request on an ephemeral port with `status` and `body`.
///
/// Returns the base endpoint (`http://127.0.0.1:<port>/v1`) and a handle
/// yielding the request body the client sent.
pub(crate) fn serve_once(status: u16, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let endpoint = format!("http://{}/v1", listener.local_addr().expect("local addr"));
    let body = body.to_string();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

        let mut content_length = 0;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).expect("read header") == 0 {
                break;
            }
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap_or(0);
                }
            }
        }
        let mut request = vec![0; content_length];
        reader.read_exact(&mut request).expect("read body");

        write!(
            stream,
            "HTTP/1.1 {} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
        .expect("write response");
        String::from_utf8_lossy(&request).into_owned()
    });

    (endpoint, handle)
}
