//! Classification of failed HTTP responses.
//!
//! The metadata service reports failures in three shapes:
//! - `text/plain` bodies, usually from a gateway in front of the service
//! - a JSON envelope `{"code", "message", "messageArgs"}` on 4xx responses
//! - arbitrary bodies on 5xx and any other status
//!
//! [`classify`] folds all three into a single [`ApiError`].

use derive_more::{Display, Error};
use serde_json::Value;

use crate::Response;

/// Content type prefix that marks an opaque, plain text error body.
const PLAIN_TEXT: &str = "text/plain";

/// Error reported by the metadata service.
///
/// The [`Display`](std::fmt::Display) output is the message alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Error)]
#[display("{message}")]
pub struct ApiError {
    error_code: String,
    message: String,
}

impl ApiError {
    /// Code used when the response carried no structured cause.
    pub const UNKNOWN_CODE: &'static str = "UNK0001";

    /// Creates an error from a code and an already rendered message.
    #[must_use]
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }

    /// The error code: a decimal HTTP status, [`Self::UNKNOWN_CODE`], or empty.
    #[must_use]
    pub fn error_code(&self) -> &str {
        &self.error_code
    }

    /// Human readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` for plain text errors without a structured cause.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.error_code == Self::UNKNOWN_CODE
    }

    /// The HTTP status carried in the error code, for 4xx errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.error_code.parse().ok()
    }
}

impl From<&Response> for ApiError {
    fn from(response: &Response) -> Self {
        classify(response)
    }
}

/// Turns a failed response into an [`ApiError`].
///
/// This never fails: an undecodable envelope yields an empty message and
/// invalid UTF-8 is replaced.
#[must_use]
pub fn classify(response: &Response) -> ApiError {
    if response
        .content_type()
        .is_some_and(|ct| ct.starts_with(PLAIN_TEXT))
    {
        return ApiError::new(ApiError::UNKNOWN_CODE, response.text_lossy());
    }

    let status = response.status();
    if status.is_client_error() {
        let envelope = ErrorEnvelope::decode(response.body());
        return ApiError::new(status.as_str(), envelope.into_template().render());
    }

    ApiError::new(String::new(), response.text_lossy())
}

/// Fields of a 4xx error body.
///
/// Decoding is field by field: a null or mistyped field is left empty
/// without discarding the others. The envelope's `code` is never read.
#[derive(Debug, Default)]
struct ErrorEnvelope {
    message: String,
    message_args: String,
}

impl ErrorEnvelope {
    fn decode(body: &[u8]) -> Self {
        let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(body) else {
            return Self::default();
        };
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned()
        };

        Self {
            message: text("message"),
            message_args: text("messageArgs"),
        }
    }

    fn into_template(self) -> MessageTemplate {
        MessageTemplate::new(self.message, self.message_args)
    }
}

/// A message template with a single substitution argument.
///
/// The first `%s` (or `%v`) placeholder is replaced by the argument and
/// `%%` renders as `%`. Any further placeholder is kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageTemplate {
    template: String,
    argument: String,
}

impl MessageTemplate {
    /// Creates a template.
    #[must_use]
    pub fn new(template: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            argument: argument.into(),
        }
    }

    /// Renders the message.
    #[must_use]
    pub fn render(&self) -> String {
        let mut rendered = String::with_capacity(self.template.len() + self.argument.len());
        let mut substituted = false;
        let mut chars = self.template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                rendered.push(c);
                continue;
            }
            match chars.peek() {
                Some('%') => {
                    chars.next();
                    rendered.push('%');
                }
                Some(&(verb @ ('s' | 'v'))) => {
                    chars.next();
                    if substituted {
                        rendered.push('%');
                        rendered.push(verb);
                    } else {
                        rendered.push_str(&self.argument);
                        substituted = true;
                    }
                }
                _ => rendered.push('%'),
            }
        }

        rendered
    }
}

#[cfg(test)]
mod tests {
    use assert2::{check, let_assert};
    use bytes::Bytes;
    use http::header::CONTENT_TYPE;
    use http::{HeaderValue, StatusCode};

    use super::*;

    fn status(code: u16) -> StatusCode {
        let_assert!(Ok(status) = StatusCode::from_u16(code));
        status
    }

    fn response(code: u16, content_type: &'static str, body: &str) -> Response {
        Response::new(status(code), body.to_string())
            .with_header(CONTENT_TYPE, HeaderValue::from_static(content_type))
    }

    #[test]
    fn plain_text_is_unknown() {
        let error = classify(&response(403, "text/plain; charset=utf-8", "Forbidden by gateway"));

        check!(error.error_code() == "UNK0001");
        check!(error.message() == "Forbidden by gateway");
        check!(error.is_unknown());
    }

    #[test]
    fn plain_text_wins_over_status_band() {
        let error = classify(&response(502, "text/plain", "Bad Gateway"));
        check!(error.error_code() == ApiError::UNKNOWN_CODE);
        check!(error.message() == "Bad Gateway");
    }

    #[test]
    fn client_error_uses_status_not_envelope_code() {
        let body = r#"{"code":"X","message":"%s boom","messageArgs":"bad input"}"#;
        let error = classify(&response(422, "application/json", body));

        check!(error.error_code() == "422");
        check!(error.message() == "bad input boom");
        check!(error.status() == Some(422));
        insta::assert_snapshot!(error.to_string(), @"bad input boom");
    }

    #[test]
    fn client_error_with_malformed_body_has_empty_message() {
        let error = classify(&response(400, "application/json", "<html>oops</html>"));
        check!(error.error_code() == "400");
        check!(error.message().is_empty());
    }

    #[test]
    fn client_error_with_partial_envelope() {
        let error = classify(&response(404, "application/json", r#"{"message":"Not found"}"#));
        check!(error.error_code() == "404");
        check!(error.message() == "Not found");
    }

    #[test]
    fn client_error_with_null_argument() {
        let body = r#"{"code":"X","message":"Invalid %s","messageArgs":null}"#;
        let error = classify(&response(400, "application/json", body));
        check!(error.error_code() == "400");
        check!(error.message() == "Invalid ");
    }

    #[test]
    fn client_error_with_mistyped_fields_keeps_the_rest() {
        let body = r#"{"code":1001,"message":"Invalid speed class","messageArgs":""}"#;
        let error = classify(&response(400, "application/json", body));
        check!(error.message() == "Invalid speed class");

        let body = r#"{"message":"Limit is %s","messageArgs":42}"#;
        let error = classify(&response(400, "application/json", body));
        check!(error.message() == "Limit is ");
    }

    #[test]
    fn client_error_with_non_object_body_has_empty_message() {
        let error = classify(&response(400, "application/json", r#"["message"]"#));
        check!(error.message().is_empty());
    }

    #[test]
    fn client_error_without_content_type() {
        let response = Response::new(
            status(409),
            Bytes::from_static(br#"{"message":"conflict on %s","messageArgs":"tags"}"#),
        );
        let error = classify(&response);
        check!(error.error_code() == "409");
        check!(error.message() == "conflict on tags");
    }

    #[test]
    fn server_error_keeps_raw_body() {
        let error = classify(&response(500, "application/json", r#"{"message":"boom"}"#));
        check!(error.error_code().is_empty());
        check!(error.message() == r#"{"message":"boom"}"#);
        check!(error.status().is_none());
    }

    #[test]
    fn other_status_keeps_raw_body() {
        let error = classify(&response(302, "text/html", "moved"));
        check!(error.error_code().is_empty());
        check!(error.message() == "moved");
    }

    #[test]
    fn from_response_matches_classify() {
        let response = response(400, "text/plain", "nope");
        check!(ApiError::from(&response) == classify(&response));
        check!(ApiError::from(&response).is_unknown());
    }

    #[test]
    fn invalid_utf8_body_is_replaced() {
        let response = Response::new(status(503), Bytes::from_static(b"down \xff"));
        check!(classify(&response).message() == "down \u{fffd}");
    }

    #[test]
    fn template_substitutes_first_placeholder() {
        check!(MessageTemplate::new("%s boom", "bad input").render() == "bad input boom");
        check!(MessageTemplate::new("value %v rejected", "s1.fast").render() == "value s1.fast rejected");
    }

    #[test]
    fn template_without_placeholder_ignores_argument() {
        check!(MessageTemplate::new("Invalid request", "ignored").render() == "Invalid request");
        check!(MessageTemplate::default().render().is_empty());
    }

    #[test]
    fn template_escapes_and_extra_placeholders() {
        check!(MessageTemplate::new("100%% of %s", "quota").render() == "100% of quota");
        check!(MessageTemplate::new("%s and %s", "one").render() == "one and %s");
        check!(MessageTemplate::new("ends with %", "x").render() == "ends with %");
        check!(MessageTemplate::new("%d items", "x").render() == "%d items");
    }
}
