//! Trace headers for server-side request profiling.
//!
//! When a profiling key is configured every request carries `X-Trace-Info`
//! (base64 JSON naming the trace) and `X-Trace-HMAC` (hex HMAC-SHA1 of that
//! value under the shared key), which lets the server attribute its spans to
//! this invocation.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha1::Sha1;
use uuid::Uuid;

use crate::error::{ClientError, Result};

/// Header carrying the encoded trace ids.
pub const TRACE_INFO_HEADER: &str = "X-Trace-Info";

/// Header carrying the signature of [`TRACE_INFO_HEADER`].
pub const TRACE_HMAC_HEADER: &str = "X-Trace-HMAC";

#[derive(Debug, Serialize)]
struct TraceInfo {
    base_id: String,
    parent_id: String,
}

/// One trace shared by every request of an invocation.
#[derive(Debug, Clone)]
pub struct Profiler {
    key: String,
    base_id: Uuid,
}

impl Profiler {
    /// Starts a new trace signed with `key`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            base_id: Uuid::new_v4(),
        }
    }

    /// Trace id reported to the user so the trace can be looked up later.
    #[must_use]
    pub const fn trace_id(&self) -> Uuid {
        self.base_id
    }

    /// Header pairs for one request. Each request is a child of the base trace.
    pub fn headers(&self) -> Result<[(&'static str, String); 2]> {
        self.headers_with_parent(Uuid::new_v4())
    }

    fn headers_with_parent(&self, parent: Uuid) -> Result<[(&'static str, String); 2]> {
        let info = serde_json::to_vec(&TraceInfo {
            base_id: self.base_id.to_string(),
            parent_id: parent.to_string(),
        })?;
        let encoded = STANDARD.encode(info);
        let signature = sign(&self.key, encoded.as_bytes())?;
        Ok([(TRACE_INFO_HEADER, encoded), (TRACE_HMAC_HEADER, signature)])
    }
}

/// Hex-encoded HMAC-SHA1 of `data` under `key`.
pub fn sign(key: &str, data: &[u8]) -> Result<String> {
    let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
        .map_err(|e| ClientError::Config(format!("invalid profiling key: {e}")))?;
    mac.update(data);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_matches_rfc2202_vector() {
        // RFC 2202 test case 2.
        assert_eq!(
            sign("Jefe", b"what do ya want for nothing?").expect("sign"),
            "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79"
        );
    }

    #[test]
    fn headers_carry_base_and_parent() {
        let profiler = Profiler::new("SECRET_KEY");
        let parent = Uuid::new_v4();
        let [(info_name, info), (hmac_name, hmac)] =
            profiler.headers_with_parent(parent).expect("headers");

        assert_eq!(info_name, TRACE_INFO_HEADER);
        assert_eq!(hmac_name, TRACE_HMAC_HEADER);

        let decoded: serde_json::Value =
            serde_json::from_slice(&STANDARD.decode(&info).expect("base64")).expect("json");
        assert_eq!(decoded["base_id"], profiler.trace_id().to_string());
        assert_eq!(decoded["parent_id"], parent.to_string());
        assert_eq!(hmac, sign("SECRET_KEY", info.as_bytes()).expect("sign"));
    }

    #[test]
    fn requests_get_distinct_parents() {
        let profiler = Profiler::new("k");
        let a = profiler.headers().expect("headers");
        let b = profiler.headers().expect("headers");
        assert_ne!(a[0].1, b[0].1);
    }
}
