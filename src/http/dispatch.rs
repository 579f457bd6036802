//! The handler installed by [`crate::acceptor::Acceptor`] on every
//! accepted client connection: drains the socket, parses as many
//! pipelined requests as are fully buffered, and answers each with a
//! static-file or CGI response.

use crate::cache::Cache;
use crate::http::cgi::{CgiRunner, CGI_MARKER};
use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::reactor::Connection;
use std::path::Path;

/// Installed as the `on_handle` hook. Reads everything currently
/// available on `connection`, answers every complete request found in
/// it, and tells the owning `Looper` to drop the connection once a
/// response asked for `Connection: Close` (or the client disappeared).
pub fn handle_request(connection: &mut Connection, serving_directory: &str, cache: &Cache) {
    let (_read, peer_closed) = connection.receive();
    if peer_closed {
        connection.request_self_delete();
        return;
    }

    let mut finish = false;
    while let Some(raw) = connection.find_and_pop_till(b"\r\n\r\n") {
        let mut response_buf = Vec::new();

        match Request::parse(&raw) {
            Err(reason) => {
                tracing::info!(%reason, "invalid request");
                Response::make_400().serialize(&mut response_buf);
                finish = true;
            }
            Ok(request) => {
                let resource_path = format!("{serving_directory}{}", request.url);
                tracing::info!(%resource_path, "dispatching request");

                finish = if resource_path.contains(CGI_MARKER) {
                    handle_cgi(&request, &resource_path, &mut response_buf)
                } else {
                    handle_static(&request, &resource_path, cache, &mut response_buf)
                };
            }
        }

        connection.push_write(&response_buf);
        connection.send();
        if finish {
            break;
        }
    }

    if finish {
        connection.request_self_delete();
    }
}

fn handle_static(request: &Request, resource_path: &str, cache: &Cache, out: &mut Vec<u8>) -> bool {
    let path = Path::new(resource_path);
    if !path.exists() {
        Response::make_404().serialize(out);
        return true;
    }

    let response = Response::make_200(request.should_close, Some(path));
    response.serialize(out);

    if request.method == Method::Get {
        let mut body = Vec::new();
        if !cache.try_load(resource_path, &mut body) {
            if let Ok(contents) = std::fs::read(path) {
                body = contents;
                cache.try_insert(resource_path, body.clone());
            }
        }
        out.extend_from_slice(&body);
    }

    request.should_close
}

fn handle_cgi(request: &Request, resource_path: &str, out: &mut Vec<u8>) -> bool {
    let Some(runner) = CgiRunner::parse(resource_path) else {
        Response::make_400().serialize(out);
        return true;
    };

    if !Path::new(runner.program_path()).exists() {
        Response::make_404().serialize(out);
        return true;
    }

    let body = runner.run();
    let mut response = Response::make_200(request.should_close, None);
    response.change_header("Content-Length", body.len().to_string());
    response.serialize(out);
    out.extend_from_slice(&body);

    request.should_close
}
