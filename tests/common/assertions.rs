use reqwest::Response;
use serde_json::Value;

/// Assert that an HTTP response has the expected status code
pub async fn assert_status(response: Response, expected: u16) -> Response {
    let status = response.status();
    assert_eq!(
        status.as_u16(),
        expected,
        "Expected status {}, got {}",
        expected,
        status
    );
    response
}

pub async fn json_body(response: Response) -> Value {
    let body_text = response.text().await.expect("Failed to read response body");
    serde_json::from_str(&body_text)
        .unwrap_or_else(|_| panic!("Response body is not JSON: {}", body_text))
}

/// Assert that a response has an expected status and error message in the body
pub async fn assert_error(response: Response, expected_status: u16, expected_error: &str) {
    let response = assert_status(response, expected_status).await;
    let body = json_body(response).await;

    let error = body["error"]
        .as_str()
        .expect("Response body should have an 'error' field");

    assert_eq!(
        error, expected_error,
        "Expected error '{}', got '{}'",
        expected_error, error
    );
}

/// Ids of the objects in a JSON array, in order
pub fn ids(list: &Value) -> Vec<i64> {
    list.as_array()
        .expect("Expected a JSON array")
        .iter()
        .map(|item| item["id"].as_i64().expect("Item should have an id"))
        .collect()
}
