//! Small helpers shared by the managers and the CLI.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{ClientError, Result};

/// Encodes a plaintext password the way the API expects it on the wire.
///
/// This is a transport convention, not encryption.
#[must_use]
pub fn encode_password(plain: &str) -> String {
    STANDARD.encode(plain.as_bytes())
}

/// Reverses [`encode_password`].
pub fn decode_password(encoded: &str) -> Result<String> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ClientError::Decode(format!("invalid base64 password: {e}")))?;
    String::from_utf8(bytes).map_err(|e| ClientError::Decode(format!("password is not UTF-8: {e}")))
}

/// Renders a boolean the way the API's form and query parameters expect it.
#[must_use]
pub const fn bool_flag(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Lenient deserializers for server fields whose JSON type varies between
/// releases (ids sent as numbers or strings, counters sent as strings, ...).
pub(crate) mod de {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    fn stringify(value: Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            other => Some(other.to_string()),
        }
    }

    /// Required identifier: string or number.
    pub(crate) fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        stringify(Value::deserialize(deserializer)?)
            .ok_or_else(|| D::Error::custom("identifier must not be null"))
    }

    /// Optional scalar rendered as a string; `null` maps to `None`.
    pub(crate) fn opt_string<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(stringify(Value::deserialize(deserializer)?))
    }
}
