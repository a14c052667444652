//! Minimal HTTP/1.1 stub used by tests to stand in for addon hosts.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

type Route = (String, u16, Vec<u8>);

pub struct TestServer {
    base_url: String,
}

impl TestServer {
    /// Serves `(path, status, body)` routes on a random local port until the
    /// test process exits. Unknown paths answer 404.
    pub fn start<P: Into<String>>(routes: Vec<(P, u16, Vec<u8>)>) -> Self {
        Self::start_with(|_| routes)
    }

    /// Like [`TestServer::start`], for routes whose bodies link back to the
    /// server itself. `routes` receives the base URL.
    pub fn start_with<P, F>(routes: F) -> Self
    where
        P: Into<String>,
        F: FnOnce(&str) -> Vec<(P, u16, Vec<u8>)>,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let routes: Arc<Vec<Route>> = Arc::new(
            routes(&base_url)
                .into_iter()
                .map(|(path, status, body)| (path.into(), status, body))
                .collect(),
        );

        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&routes);
                thread::spawn(move || handle(stream, &routes));
            }
        });

        Self { base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn handle(mut stream: TcpStream, routes: &[Route]) {
    let Ok(read_half) = stream.try_clone() else {
        return;
    };
    let mut reader = BufReader::new(read_half);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    loop {
        let mut header = String::new();
        match reader.read_line(&mut header) {
            Ok(0) => break,
            Ok(_) if header == "\r\n" || header == "\n" => break,
            Ok(_) => {}
            Err(_) => return,
        }
    }

    let target = request_line.split_whitespace().nth(1).unwrap_or("/");
    let (status, body) = routes
        .iter()
        .find(|(path, _, _)| path == target)
        .map(|(_, status, body)| (*status, body.as_slice()))
        .unwrap_or((404, b"not found".as_slice()));

    let (head, body) = if status == 204 {
        ("HTTP/1.1 204 Stub\r\nConnection: close\r\n\r\n".to_string(), &[][..])
    } else {
        let head = format!(
            "HTTP/1.1 {} Stub\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        );
        (head, body)
    };
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}
