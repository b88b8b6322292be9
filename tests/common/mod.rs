//! Shared fixtures for integration tests: a local HTTP server standing in for
//! the GitHub release index and artifact store, and a fake Guilded install.

#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tempfile::TempDir;
use tiny_http::{Header, Response, Server, StatusCode};

/// Canned answer for one path
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// 200 with a JSON body
    Json(String),
    /// 200 with a binary body
    Bytes(Vec<u8>),
    /// 302 to another path on the same server (absolute Location)
    RedirectTo(String),
    /// 302 with the Location header exactly as given
    RedirectRaw(String),
    /// Empty body with this status
    Status(u16),
}

/// A request the server received
#[derive(Clone, Debug)]
pub struct Hit {
    pub path: String,
    pub user_agent: Option<String>,
}

pub struct MockServer {
    base_url: String,
    stop: Arc<AtomicBool>,
    hits: Arc<Mutex<Vec<Hit>>>,
    handle: Option<JoinHandle<()>>,
}

impl MockServer {
    pub fn start(routes: Vec<(&str, MockResponse)>) -> Self {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let routes: HashMap<String, MockResponse> = routes
            .into_iter()
            .map(|(path, response)| (path.to_string(), response))
            .collect();
        let stop = Arc::new(AtomicBool::new(false));
        let hits = Arc::new(Mutex::new(Vec::new()));

        let handle = {
            let stop = Arc::clone(&stop);
            let hits = Arc::clone(&hits);
            let base_url = base_url.clone();
            std::thread::spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    let Ok(Some(request)) = server.recv_timeout(Duration::from_millis(20)) else {
                        continue;
                    };

                    let path = request.url().to_string();
                    let user_agent = request
                        .headers()
                        .iter()
                        .find(|h| h.field.equiv("User-Agent"))
                        .map(|h| h.value.to_string());
                    hits.lock().unwrap().push(Hit {
                        path: path.clone(),
                        user_agent,
                    });

                    let response = match routes.get(&path) {
                        Some(MockResponse::Json(body)) => Response::from_data(body.clone().into_bytes())
                            .with_header(header("Content-Type", "application/json")),
                        Some(MockResponse::Bytes(body)) => Response::from_data(body.clone())
                            .with_header(header("Content-Type", "application/octet-stream")),
                        Some(MockResponse::RedirectTo(target)) => redirect(&format!("{}{}", base_url, target)),
                        Some(MockResponse::RedirectRaw(location)) => redirect(location),
                        Some(MockResponse::Status(code)) => status(*code),
                        None => status(404),
                    };
                    let _ = request.respond(response);
                }
            })
        };

        Self {
            base_url,
            stop,
            hits,
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }

    pub fn hit_paths(&self) -> Vec<String> {
        self.hits().into_iter().map(|h| h.path).collect()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn header(name: &str, value: &str) -> Header {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).unwrap()
}

fn redirect(location: &str) -> Response<Cursor<Vec<u8>>> {
    Response::from_data(Vec::new())
        .with_status_code(StatusCode(302))
        .with_header(header("Location", location))
}

fn status(code: u16) -> Response<Cursor<Vec<u8>>> {
    Response::from_data(Vec::new()).with_status_code(StatusCode(code))
}

/// Temporary directory as a UTF-8 path
pub fn utf8_temp_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, path)
}

pub const ORIGINAL_ASAR: &[u8] = b"original guilded app.asar";

/// Create an unpatched Guilded resources directory:
/// `app.asar` plus `app.asar.unpacked/native/module.node`.
pub fn create_guilded_resources(resources_dir: &Utf8Path) {
    fs::create_dir_all(resources_dir.join("app.asar.unpacked").join("native")).unwrap();
    fs::write(resources_dir.join("app.asar"), ORIGINAL_ASAR).unwrap();
    fs::write(
        resources_dir
            .join("app.asar.unpacked")
            .join("native")
            .join("module.node"),
        b"native module",
    )
    .unwrap();
}
