use crate::config::Config;
use hyper::{Method, StatusCode, Uri, Version};
use std::net::SocketAddr;

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    println!("======================================");
    println!("Student data gateway started");
    println!("Listening on: http://{addr}");
    println!("Upstream API: {}", config.upstream.base_url);
    println!("Log level: {}", config.logging.level);
    if let Some(workers) = config.server.workers {
        println!("Worker threads: {workers}");
    }
    println!("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    println!("[Connection] Accepted from: {peer_addr}");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    eprintln!("[Error] Failed to serve connection: {err:?}");
}

pub fn log_request(method: &Method, uri: &Uri, version: Version) {
    println!("[Request] {method} {uri} {version:?}");
}

pub fn log_headers_count(count: usize, show: bool) {
    if show {
        println!("[Headers] Count: {count}");
    }
}

pub fn log_upstream_fetch(url: &str) {
    println!("[Upstream] GET {url}");
}

pub fn log_response(status: StatusCode) {
    println!("[Response] Sent {status}\n");
}

pub fn log_warning(msg: &str) {
    eprintln!("[WARN] {msg}");
}

pub fn log_error(msg: &str) {
    eprintln!("[ERROR] {msg}");
}
