//! Status / transport outcome → [`PipelineError`].

use super::PipelineError;
use crate::transport::TransportError;
use serde_json::Value;

/// Classify a non-2xx response by status code.
pub(crate) fn from_status(status: u16, body: &str) -> PipelineError {
    match status {
        401 => PipelineError::Unauthorized,
        403 => PipelineError::Forbidden,
        404 => PipelineError::NotFound,
        422 => PipelineError::ValidationFailed(validation_details(body)),
        500..=599 => PipelineError::ServerFault { status },
        _ => PipelineError::Unknown {
            status: Some(status),
            raw: body.to_string(),
        },
    }
}

/// Classify a failure where the transport itself errored.
pub(crate) fn from_transport(err: &TransportError) -> PipelineError {
    if err.is_no_response() {
        return PipelineError::NetworkUnreachable(err.to_string());
    }
    let status = match err {
        TransportError::Http(e) => e.status().map(|s| s.as_u16()),
        TransportError::Other(_) => None,
    };
    PipelineError::Unknown {
        status,
        raw: err.to_string(),
    }
}

/// The server's structured payload; non-JSON bodies are kept as a string.
fn validation_details(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn maps_the_normative_statuses() {
        assert_eq!(from_status(401, ""), PipelineError::Unauthorized);
        assert_eq!(from_status(403, ""), PipelineError::Forbidden);
        assert_eq!(from_status(404, "{}"), PipelineError::NotFound);
        assert_eq!(
            from_status(500, ""),
            PipelineError::ServerFault { status: 500 }
        );
        assert_eq!(
            from_status(503, "busy"),
            PipelineError::ServerFault { status: 503 }
        );
    }

    #[test]
    fn validation_carries_structured_detail() {
        let body = r#"{"detail":[{"loc":["body","name"],"msg":"field required"}]}"#;
        assert_eq!(
            from_status(422, body),
            PipelineError::ValidationFailed(json!({
                "detail": [{"loc": ["body", "name"], "msg": "field required"}]
            }))
        );
        assert_eq!(
            from_status(422, "plain text"),
            PipelineError::ValidationFailed(json!("plain text"))
        );
    }

    #[test]
    fn everything_else_is_unknown_with_raw_body() {
        for status in [400u16, 409, 418, 429, 302] {
            assert_eq!(
                from_status(status, "nope"),
                PipelineError::Unknown {
                    status: Some(status),
                    raw: "nope".into()
                }
            );
        }
    }

    #[test]
    fn non_reqwest_transport_errors_are_unknown() {
        let err = from_transport(&TransportError::Other("tls setup".into()));
        assert!(matches!(err, PipelineError::Unknown { status: None, .. }));
    }
}
