//! Minimal HTTP interface.
//!
//! Hand-rolled HTTP/1.1 over [`TcpStream`], one thread per connection, one
//! request per connection. All responses are JSON. The routes are thin
//! plumbing around [`Recognizer`]:
//!
//! * `GET /health` — liveness check.
//! * `GET /labels` — the active label table.
//! * `POST /predict` — classify a flat landmark array, optionally routed by
//!   handedness.

use std::io::{self, prelude::*, BufRead, BufReader};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex};
use std::thread;

use anyhow::bail;
use serde::Deserialize;
use serde_json::json;

use crate::error::ShapeError;
use crate::landmark::Handedness;
use crate::recognizer::Recognizer;
use crate::timer::FpsCounter;

/// Request bodies larger than this are rejected outright.
const MAX_BODY_LEN: usize = 1 << 20;

#[derive(Deserialize)]
struct PredictRequest {
    /// Flat landmark coordinates, 42 or 63 values.
    landmarks: Vec<f32>,
    /// Which hand model to route to; right-handed when omitted.
    #[serde(default)]
    handedness: Handedness,
}

/// The HTTP server, bound to a socket and wired to a [`Recognizer`].
pub struct Server {
    listener: TcpListener,
    recognizer: Arc<Recognizer>,
}

impl Server {
    /// Binds to `addr` without accepting connections yet.
    pub fn bind<A: ToSocketAddrs>(addr: A, recognizer: Arc<Recognizer>) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self {
            listener,
            recognizer,
        })
    }

    /// Returns the bound socket address.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts and serves connections until the process exits.
    ///
    /// Each connection is handled on its own thread; the [`Recognizer`] is
    /// shared read-only, so request handling needs no synchronization.
    pub fn run(self) -> anyhow::Result<()> {
        log::info!("serving on http://{}", self.listener.local_addr()?);
        let fps = Arc::new(Mutex::new(FpsCounter::new("requests")));
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    let recognizer = self.recognizer.clone();
                    let fps = fps.clone();
                    thread::Builder::new()
                        .name("http connection".into())
                        .spawn(move || {
                            if let Err(e) = handle_connection(stream, &recognizer) {
                                log::debug!("connection error: {e:#}");
                            }
                            fps.lock().unwrap().tick_with(recognizer.timers());
                        })?;
                }
                Err(e) => log::warn!("failed to accept connection: {e}"),
            }
        }
        Ok(())
    }
}

fn handle_connection(stream: TcpStream, recognizer: &Recognizer) -> anyhow::Result<()> {
    let mut reader = BufReader::new(stream);

    let mut line = String::new();
    reader.read_line(&mut line)?;
    let mut parts = line.split_whitespace();
    let (Some(method), Some(path), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        bail!("malformed request line: {}", line.trim());
    };
    if !version.starts_with("HTTP/1.") {
        bail!("unsupported protocol version: {version}");
    }
    let (method, path) = (method.to_string(), path.to_string());

    let mut content_length = 0;
    loop {
        line.clear();
        reader.read_line(&mut line)?;
        if line == "\r\n" || line == "\n" || line.is_empty() {
            break;
        }
        let Some((name, value)) = line.split_once(':') else {
            bail!("malformed request header: {}", line.trim());
        };
        if name.eq_ignore_ascii_case("Content-Length") {
            content_length = value.trim().parse::<usize>()?;
        }
    }

    let (status, body) = if content_length > MAX_BODY_LEN {
        (400, json!({ "error": "request body too large" }))
    } else {
        let mut body = vec![0; content_length];
        reader.read_exact(&mut body)?;
        route(recognizer, &method, &path, &body)
    };

    log::debug!("{method} {path} -> {status}");

    let payload = serde_json::to_vec(&body)?;
    let stream = reader.get_mut();
    write!(
        stream,
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {len}\r\n\
         Connection: close\r\n\r\n",
        reason = reason(status),
        len = payload.len(),
    )?;
    stream.write_all(&payload)?;
    stream.flush()?;
    Ok(())
}

fn route(
    recognizer: &Recognizer,
    method: &str,
    path: &str,
    body: &[u8],
) -> (u16, serde_json::Value) {
    match (method, path) {
        ("GET", "/health") => (200, json!({ "status": "ok" })),
        ("GET", "/labels") => (200, json!({ "labels": recognizer.labels().as_slice() })),
        ("POST", "/predict") => {
            let request: PredictRequest = match serde_json::from_slice(body) {
                Ok(request) => request,
                Err(e) => return (400, json!({ "error": format!("malformed request: {e}") })),
            };
            predict(recognizer, &request)
        }
        _ => (404, json!({ "error": "not found" })),
    }
}

fn predict(recognizer: &Recognizer, request: &PredictRequest) -> (u16, serde_json::Value) {
    match recognizer.predict(&request.landmarks, request.handedness) {
        Ok(prediction) => match serde_json::to_value(&prediction) {
            Ok(value) => (200, value),
            Err(e) => {
                log::error!("failed to serialize prediction: {e}");
                (500, json!({ "error": "internal error" }))
            }
        },
        // Shape mismatches are the request's fault and leave the process
        // untouched; anything else is an inference failure on our side.
        Err(e) if e.downcast_ref::<ShapeError>().is_some() => {
            (400, json!({ "error": e.to_string() }))
        }
        Err(e) => {
            log::error!("inference failed: {e:#}");
            (500, json!({ "error": "internal error" }))
        }
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        _ => "Internal Server Error",
    }
}
