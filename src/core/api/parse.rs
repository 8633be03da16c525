//! Response body classification for both endpoints.

use serde_json::Value;

use super::error::ApiError;

fn parse_json(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(ApiError::EmptyResponse);
    }
    serde_json::from_slice(body).map_err(ApiError::Parse)
}

/// `{"response": [string, ...]}` -> model ids in server order.
pub fn parse_models_body(body: &[u8]) -> Result<Vec<String>, ApiError> {
    let json = parse_json(body)?;
    let Some(items) = json.get("response").and_then(Value::as_array) else {
        return Err(ApiError::unexpected(body));
    };
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ApiError::unexpected(body))
        })
        .collect()
}

/// `{"response": "OK", "message": string}` -> the message text.
pub fn parse_query_body(body: &[u8]) -> Result<String, ApiError> {
    let json = parse_json(body)?;
    let status = json.get("response").and_then(Value::as_str);
    match (status, json.get("message").and_then(Value::as_str)) {
        (Some("OK"), Some(message)) => Ok(message.to_string()),
        _ => Err(ApiError::unexpected(body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_in_server_order() {
        let ids = parse_models_body(br#"{"response":["m1","m2"]}"#).unwrap();
        assert_eq!(ids, vec!["m1", "m2"]);
    }

    #[test]
    fn models_empty_array_is_ok() {
        assert!(parse_models_body(br#"{"response":[]}"#).unwrap().is_empty());
    }

    #[test]
    fn models_wrong_shape_is_unexpected_format() {
        let err = parse_models_body(br#"{"foo":1}"#).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedFormat { .. }));
    }

    #[test]
    fn models_non_string_entry_is_unexpected_format() {
        let err = parse_models_body(br#"{"response":["a",2]}"#).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedFormat { .. }));
    }

    #[test]
    fn models_non_json_is_parse_error() {
        let err = parse_models_body(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }

    #[test]
    fn empty_body_is_empty_response() {
        assert!(matches!(
            parse_models_body(b"").unwrap_err(),
            ApiError::EmptyResponse
        ));
        assert!(matches!(
            parse_query_body(b"  \n").unwrap_err(),
            ApiError::EmptyResponse
        ));
    }

    #[test]
    fn query_ok_yields_message() {
        let text = parse_query_body(br#"{"response":"OK","message":"hi"}"#).unwrap();
        assert_eq!(text, "hi");
    }

    #[test]
    fn query_error_status_is_unexpected_format_with_body() {
        let err = parse_query_body(br#"{"response":"ERROR"}"#).unwrap_err();
        match err {
            ApiError::UnexpectedFormat { body } => assert!(body.contains("ERROR")),
            other => panic!("expected UnexpectedFormat, got {:?}", other),
        }
    }

    #[test]
    fn query_ok_without_message_is_unexpected_format() {
        let err = parse_query_body(br#"{"response":"OK"}"#).unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedFormat { .. }));
    }

    #[test]
    fn query_non_object_json_is_unexpected_format() {
        let err = parse_query_body(b"[1,2,3]").unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedFormat { .. }));
    }
}
