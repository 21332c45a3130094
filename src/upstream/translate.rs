//! Translation of raw upstream answers into gateway results.

use serde_json::Value;
use tracing::warn;

use crate::error::{AppError, AppResult};

/// How much of an unparseable body is kept in the error for the logs.
const MAX_LOGGED_BODY_CHARS: usize = 512;

/// Map an upstream status and body to the outward JSON value.
///
/// - any status other than 200 becomes [`AppError::Upstream`] carrying the
///   status and body untouched
/// - a 200 body that is not JSON becomes [`AppError::Parse`], for every
///   endpoint
pub fn translate(status: u16, body: String) -> AppResult<Value> {
    if status != 200 {
        return Err(AppError::Upstream {
            status,
            detail: body,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        let excerpt: String = body.chars().take(MAX_LOGGED_BODY_CHARS).collect();
        warn!(error = %e, body = %excerpt, "Upstream returned 200 with a non-JSON body");
        AppError::Parse(format!("{e} (body: {excerpt})"))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_success_json() {
        let value = translate(200, r#"{"a":1}"#.to_string()).unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_success_scalar_json() {
        assert_eq!(translate(200, "true".to_string()).unwrap(), json!(true));
        assert_eq!(translate(200, "[]".to_string()).unwrap(), json!([]));
    }

    #[test]
    fn test_non_200_preserves_status_and_detail() {
        match translate(404, "not found".to_string()) {
            Err(AppError::Upstream { status, detail }) => {
                assert_eq!(status, 404);
                assert_eq!(detail, "not found");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn test_other_2xx_is_still_an_upstream_error() {
        assert!(matches!(
            translate(201, "{}".to_string()),
            Err(AppError::Upstream { status: 201, .. })
        ));
    }

    #[test]
    fn test_non_json_success_is_parse_error() {
        let result = translate(200, "<html>oops</html>".to_string());
        assert!(matches!(result, Err(AppError::Parse(_))));

        let result = translate(200, String::new());
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn test_parse_error_excerpt_is_bounded() {
        let body = "x".repeat(10_000);
        match translate(200, body) {
            Err(AppError::Parse(msg)) => assert!(msg.len() < 1_000),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
