//! Canonical request hashing for Connect JWTs.
//!
//! The `qsh` claim binds a symmetric token to one specific request:
//! `sha256("METHOD&path&canonicalQuery")` over the canonicalized method,
//! path and query of the request being authenticated.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

/// Literal `qsh` value carried by context tokens instead of a request hash.
pub const CONTEXT_QSH: &str = "context-qsh";

/// The parts of an inbound HTTP request a Connect JWT is verified against.
#[derive(Debug, Clone)]
pub struct JwtRequest {
    pub method: String,
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl JwtRequest {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            query: Vec::new(),
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// Computes the query string hash of the given request.
pub fn compute_query_string_hash(request: &JwtRequest) -> String {
    let canonical = canonical_request(request);
    let digest = Sha256::digest(canonical.as_bytes());
    hex_encode(&digest)
}

fn canonical_request(request: &JwtRequest) -> String {
    format!(
        "{}&{}&{}",
        request.method.to_uppercase(),
        canonical_path(&request.path),
        canonical_query(&request.query)
    )
}

fn canonical_path(path: &str) -> String {
    let mut path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    path
}

/// Parameters are percent-encoded, grouped by key, values sorted and joined
/// with `,`, then pairs sorted by encoded key. The `jwt` parameter itself is
/// excluded from the hash.
fn canonical_query(query: &[(String, String)]) -> String {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in query {
        if key == "jwt" {
            continue;
        }
        grouped
            .entry(encode_component(key))
            .or_default()
            .push(encode_component(value));
    }

    grouped
        .into_iter()
        .map(|(key, mut values)| {
            values.sort();
            format!("{}={}", key, values.join(","))
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_component(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
