//! Black-box integration tests: drive a real `Server` over a real
//! `TcpStream`, the way a genuine HTTP client would.

use longlp_server::{Cache, NetAddress, Server};
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Starts a `Server` serving `directory` on `port` in a background thread
/// and returns a handle that stops it again on drop.
struct TestServer {
    port: u16,
    shutdown: longlp_server::server::ShutdownHandle,
    join: Option<thread::JoinHandle<()>>,
}

impl TestServer {
    fn start(port: u16, directory: &Path) -> Self {
        let address = NetAddress::new("127.0.0.1", port).unwrap();
        let mut server = Server::new(address, 2).unwrap();
        let shutdown = server.shutdown_handle();

        let cache = Arc::new(Cache::new(1 << 20));
        let serving_directory = directory.to_string_lossy().into_owned();
        server.on_handle(Arc::new(move |connection| {
            longlp_server::http::handle_request(connection, &serving_directory, &cache);
        }));

        let join = thread::spawn(move || {
            server.begin().unwrap();
        });

        let test_server = Self { port, shutdown, join: Some(join) };
        test_server.wait_until_listening();
        test_server
    }

    fn wait_until_listening(&self) {
        for _ in 0..200 {
            if TcpStream::connect(("127.0.0.1", self.port)).is_ok() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("server on port {} never started accepting", self.port);
    }

    fn connect(&self) -> TcpStream {
        TcpStream::connect(("127.0.0.1", self.port)).expect("connect")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}

fn send_request(stream: &mut TcpStream, raw: &str) -> String {
    stream.write_all(raw.as_bytes()).unwrap();
    let mut buf = [0u8; 8192];
    let n = stream.read(&mut buf).unwrap();
    String::from_utf8_lossy(&buf[..n]).into_owned()
}

#[test]
fn serves_static_file_with_200_and_keeps_connection_alive() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), b"hello from disk").unwrap();

    let server = TestServer::start(18_881, dir.path());
    let mut stream = server.connect();
    let response = send_request(
        &mut stream,
        "GET /index.html HTTP/1.1\r\nConnection: Keep-Alive\r\n\r\n",
    );

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Length:16\r\n"));
    assert!(response.contains("Content-Type:text/html\r\n"));
    assert!(response.contains("Connection:Keep-Alive\r\n"));
    assert!(response.ends_with("hello from disk"));

    // Connection: Keep-Alive means the socket is still usable.
    let second = send_request(
        &mut stream,
        "GET /index.html HTTP/1.1\r\nConnection: Keep-Alive\r\n\r\n",
    );
    assert!(second.starts_with("HTTP/1.1 200 OK\r\n"));
}

#[test]
fn missing_resource_is_404_and_closes() {
    let dir = tempfile::tempdir().unwrap();

    let server = TestServer::start(18_882, dir.path());
    let mut stream = server.connect();
    let response = send_request(&mut stream, "GET /nope.html HTTP/1.1\r\n\r\n");

    assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(response.contains("Connection:Close\r\n"));

    // Server closes after a Connection: Close response.
    let mut buf = [0u8; 16];
    let n = stream.read(&mut buf).unwrap();
    assert_eq!(n, 0, "expected socket to be closed by the server");
}

#[test]
fn malformed_request_is_400() {
    let dir = tempfile::tempdir().unwrap();

    let server = TestServer::start(18_883, dir.path());
    let mut stream = server.connect();
    let response = send_request(&mut stream, "not a request\r\n\r\n");

    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[test]
fn pipelined_requests_produce_two_responses_in_order() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.html"), b"AAA").unwrap();
    std::fs::write(dir.path().join("b.html"), b"BBBB").unwrap();

    let server = TestServer::start(18_884, dir.path());
    let mut stream = server.connect();

    let pipelined = "GET /a.html HTTP/1.1\r\nConnection: Keep-Alive\r\n\r\n\
                      GET /b.html HTTP/1.1\r\nConnection: Keep-Alive\r\n\r\n";
    stream.write_all(pipelined.as_bytes()).unwrap();

    let mut buf = [0u8; 8192];
    let mut received = String::new();
    // Read until both "200 OK" status lines have arrived.
    while received.matches("200 OK").count() < 2 {
        let n = stream.read(&mut buf).unwrap();
        assert!(n > 0, "connection closed before both responses arrived");
        received.push_str(&String::from_utf8_lossy(&buf[..n]));
    }

    let first_aaa = received.find("AAA").unwrap();
    let first_bbbb = received.find("BBBB").unwrap();
    assert!(first_aaa < first_bbbb, "responses arrived out of order");
}

#[test]
fn cgi_script_output_is_returned_with_recomputed_length() {
    let dir = tempfile::tempdir().unwrap();
    let cgi_bin = dir.path().join("cgi-bin");
    std::fs::create_dir(&cgi_bin).unwrap();
    std::os::unix::fs::symlink("/bin/echo", cgi_bin.join("echo")).unwrap();

    let server = TestServer::start(18_885, dir.path());
    let mut stream = server.connect();
    let response = send_request(
        &mut stream,
        "GET /cgi-bin/echo&hello HTTP/1.1\r\n\r\n",
    );

    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Content-Length:6\r\n"));
    assert!(response.ends_with("hello\n"));
}
