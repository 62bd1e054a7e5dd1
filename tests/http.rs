//! End-to-end tests for the HTTP interface, using stub classifiers so no
//! model files are needed.

use std::io::prelude::*;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread;

use handshape::labels::LabelTable;
use handshape::nn::Classifier;
use handshape::recognizer::Recognizer;
use handshape::server::Server;
use serde_json::{json, Value};

/// Always predicts the class at `favored` with high confidence.
struct StubClassifier {
    favored: usize,
    num_classes: usize,
}

impl Classifier for StubClassifier {
    fn input_len(&self) -> usize {
        42
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn infer(&self, _features: &[f32]) -> anyhow::Result<Vec<f32>> {
        let mut scores = vec![0.005; self.num_classes];
        scores[self.favored] = 0.9;
        Ok(scores)
    }
}

fn start_server() -> SocketAddr {
    let recognizer = Recognizer::new(
        Box::new(StubClassifier {
            favored: 1,
            num_classes: 27,
        }),
        Box::new(StubClassifier {
            favored: 0,
            num_classes: 27,
        }),
        Some(LabelTable::fallback(27).unwrap()),
        0.4,
    )
    .unwrap();

    let server = Server::bind("127.0.0.1:0", Arc::new(recognizer)).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.run().unwrap());
    addr
}

/// Sends one request and returns the status code and decoded JSON body.
fn request(addr: SocketAddr, method: &str, path: &str, body: Option<&Value>) -> (u16, Value) {
    let mut stream = TcpStream::connect(addr).unwrap();
    let body = body.map(|b| serde_json::to_vec(b).unwrap()).unwrap_or_default();
    write!(
        stream,
        "{method} {path} HTTP/1.1\r\nHost: test\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .unwrap();
    stream.write_all(&body).unwrap();

    // The server closes the connection after one response.
    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    let response = String::from_utf8(response).unwrap();

    let (head, payload) = response.split_once("\r\n\r\n").unwrap();
    let status: u16 = head
        .split_whitespace()
        .nth(1)
        .unwrap()
        .parse()
        .unwrap();
    (status, serde_json::from_str(payload).unwrap())
}

fn landmarks_63() -> Value {
    let values: Vec<f32> = (0..63).map(|i| (i as f32 * 0.21).sin()).collect();
    json!(values)
}

#[test]
fn health_endpoint() {
    let addr = start_server();
    let (status, body) = request(addr, "GET", "/health", None);
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}

#[test]
fn labels_endpoint() {
    let addr = start_server();
    let (status, body) = request(addr, "GET", "/labels", None);
    assert_eq!(status, 200);
    let labels = body["labels"].as_array().unwrap();
    assert_eq!(labels.len(), 27);
    assert_eq!(labels[0], "a");
    assert_eq!(labels[26], "space");
}

#[test]
fn predict_routes_by_handedness() {
    let addr = start_server();

    let (status, body) = request(
        addr,
        "POST",
        "/predict",
        Some(&json!({ "landmarks": landmarks_63(), "handedness": "Left" })),
    );
    assert_eq!(status, 200);
    assert_eq!(body["prediction"], "b");
    assert_eq!(body["model_used"], "Left Hand");
    assert_eq!(body["uncertain"], false);
    assert_eq!(body["top3"].as_array().unwrap().len(), 3);
    assert_eq!(body["top3"][0]["label"], "b");

    // Handedness defaults to Right when omitted.
    let (status, body) = request(
        addr,
        "POST",
        "/predict",
        Some(&json!({ "landmarks": landmarks_63() })),
    );
    assert_eq!(status, 200);
    assert_eq!(body["prediction"], "a");
    assert_eq!(body["handedness"], "Right");
    assert_eq!(body["model_used"], "Right Hand");
}

#[test]
fn predict_rejects_bad_shapes() {
    let addr = start_server();

    let (status, body) = request(
        addr,
        "POST",
        "/predict",
        Some(&json!({ "landmarks": [0.0, 1.0, 2.0] })),
    );
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("landmark"));

    let (status, _) = request(
        addr,
        "POST",
        "/predict",
        Some(&json!({ "nothing": true })),
    );
    assert_eq!(status, 400);
}

#[test]
fn unknown_route_is_404() {
    let addr = start_server();
    let (status, _) = request(addr, "GET", "/nope", None);
    assert_eq!(status, 404);

    let (status, _) = request(addr, "GET", "/predict", None);
    assert_eq!(status, 404);
}
