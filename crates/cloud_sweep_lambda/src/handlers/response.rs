use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Value returned to the scheduled trigger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    pub fn body_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

#[derive(Serialize)]
struct ReportBody<'a, R> {
    message: &'a str,
    report: R,
}

pub fn report_response(status_code: u16, message: &str, report: impl Serialize) -> HandlerResponse {
    match serde_json::to_string(&ReportBody { message, report }) {
        Ok(body) => HandlerResponse { status_code, body },
        Err(error) => error_response(500, &format!("failed to serialize sweep report: {error}")),
    }
}

pub fn error_response(status_code: u16, message: &str) -> HandlerResponse {
    HandlerResponse {
        status_code,
        body: json!({ "message": message }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_uses_trigger_field_names() {
        let response = report_response(200, "done", json!({"deleted": 2}));
        let value = serde_json::to_value(&response).expect("response should serialize");

        assert_eq!(value["statusCode"], 200);
        let body = response.body_json().expect("body should be json");
        assert_eq!(body["message"], "done");
        assert_eq!(body["report"]["deleted"], 2);
    }

    #[test]
    fn error_response_carries_message_only() {
        let response = error_response(500, "bucket listing failed");
        let body = response.body_json().expect("body should be json");
        assert_eq!(body, json!({"message": "bucket listing failed"}));
    }
}
