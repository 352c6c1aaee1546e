use serde::{Deserialize, Serialize};

/// Shape returned by every read endpoint: `{success, data, stats, source, message, error?}`.
///
/// A failed read still produces an envelope (with `success: false` and no data)
/// so the dashboard never has to handle a bare error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T, S = serde_json::Value> {
    pub success: bool,
    pub data: Vec<T>,
    pub stats: S,
    pub source: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T, S> Envelope<T, S> {
    pub fn ok(data: Vec<T>, stats: S, source: &str, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            stats,
            source: source.to_string(),
            message: message.into(),
            error: None,
        }
    }

    pub fn failed(stats: S, source: &str, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            stats,
            source: source.to_string(),
            message: message.into(),
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failed_envelope_is_well_formed() {
        let env: Envelope<String> = Envelope::failed(json!({}), "provider", "Could not load bookings", "HTTP 500");
        let v = serde_json::to_value(&env).unwrap();
        assert_eq!(v["success"], json!(false));
        assert_eq!(v["data"], json!([]));
        assert_eq!(v["error"], json!("HTTP 500"));
    }

    #[test]
    fn ok_envelope_omits_error() {
        let env = Envelope::ok(vec![1, 2], json!({"total": 2}), "provider", "2 bookings");
        let v = serde_json::to_value(&env).unwrap();
        assert!(v.get("error").is_none());
        assert_eq!(v["stats"]["total"], json!(2));
    }
}
