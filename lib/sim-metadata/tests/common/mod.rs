//! In-memory metadata service used as a transport in tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use percent_encoding::percent_decode_str;
use serde::Deserialize;
use sim_metadata::header::CONTENT_TYPE;
use sim_metadata::{
    HeaderValue, Method, MetadataClient, Request, Response, Result, StatusCode, Subscriber, Tag,
    Transport,
};

const ENDPOINT: &str = "http://metadata.test/v1";

#[derive(Debug)]
struct State {
    subscriber: Subscriber,
    reject_without_group: bool,
}

/// Stateful stand-in for the metadata service.
///
/// Clones share the same subscriber.
#[derive(Debug, Clone)]
pub struct FakeMetadataService {
    state: Arc<Mutex<State>>,
    requests: Arc<AtomicUsize>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpeedClassBody {
    speed_class: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpiryBody {
    expiry_time: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupBody {
    group_id: String,
}

impl FakeMetadataService {
    pub fn new(subscriber: Subscriber) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                subscriber,
                reject_without_group: false,
            })),
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Answer every call with a gateway error once the group is unset.
    pub fn rejecting_without_group(self) -> Self {
        self.lock().reject_without_group = true;
        self
    }

    /// A fresh client bound to this service.
    pub fn client(&self) -> MetadataClient<Self> {
        MetadataClient::new(self.clone(), ENDPOINT).expect("valid endpoint")
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn subscriber(&self) -> Subscriber {
        self.lock().subscriber.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle(&self, request: &Request) -> Response {
        let mut state = self.lock();
        if state.reject_without_group && state.subscriber.group_id.is_none() {
            return text(StatusCode::FORBIDDEN, "Forbidden");
        }

        let path = request.url().path().trim_start_matches("/v1/").to_string();
        let body = request.body().cloned().unwrap_or_default();
        let subscriber = &mut state.subscriber;

        match (request.method(), path.as_str()) {
            (Method::Get, "subscriber") => {}
            (Method::Get, "userdata") => return text(StatusCode::OK, r#"{"sensor":"on"}"#),
            (Method::Post, "subscriber/update_speed_class") => {
                let Ok(update) = serde_json::from_slice::<SpeedClassBody>(&body) else {
                    return bad_request("speedClass");
                };
                if update.speed_class.is_empty() {
                    return bad_request("speedClass");
                }
                subscriber.speed_class = update.speed_class;
            }
            (Method::Post, "subscriber/enable_termination") => {
                subscriber.termination_enabled = true;
            }
            (Method::Post, "subscriber/disable_termination") => {
                subscriber.termination_enabled = false;
            }
            (Method::Post, "subscriber/set_expiry_time") => {
                let Ok(update) = serde_json::from_slice::<ExpiryBody>(&body) else {
                    return bad_request("expiryTime");
                };
                subscriber.expired_at = chrono::DateTime::from_timestamp_millis(update.expiry_time);
            }
            (Method::Post, "subscriber/unset_expiry_time") => subscriber.expired_at = None,
            (Method::Post, "subscriber/set_group") => {
                let Ok(update) = serde_json::from_slice::<GroupBody>(&body) else {
                    return bad_request("groupId");
                };
                subscriber.group_id = Some(update.group_id);
            }
            (Method::Post, "subscriber/unset_group") => subscriber.group_id = None,
            (Method::Put, "subscriber/tags") => {
                let Ok(tags) = serde_json::from_slice::<Vec<Tag>>(&body) else {
                    return bad_request("tags");
                };
                for tag in tags {
                    subscriber.tags.insert(tag.tag_name, tag.tag_value);
                }
            }
            (Method::Delete, other) if other.starts_with("subscriber/tags/") => {
                let encoded = other.trim_start_matches("subscriber/tags/");
                let name = percent_decode_str(encoded).decode_utf8_lossy().into_owned();
                if subscriber.tags.remove(&name).is_none() {
                    return envelope(StatusCode::NOT_FOUND, "SEM0005", "Tag %s is not found", &name);
                }
                return Response::new(StatusCode::NO_CONTENT, "");
            }
            _ => return envelope(StatusCode::NOT_FOUND, "COM0001", "Resource %s not found", &path),
        }

        json(subscriber)
    }
}

impl Transport for FakeMetadataService {
    async fn send(&self, request: Request) -> Result<Response> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        Ok(self.handle(&request))
    }
}

fn typed(response: Response, content_type: &'static str) -> Response {
    response.with_header(CONTENT_TYPE, HeaderValue::from_static(content_type))
}

fn text(status: StatusCode, body: &'static str) -> Response {
    typed(Response::new(status, body), "text/plain; charset=utf-8")
}

fn json(subscriber: &Subscriber) -> Response {
    let body = serde_json::to_vec(subscriber).expect("serializable subscriber");
    typed(Response::new(StatusCode::OK, body), "application/json")
}

fn envelope(status: StatusCode, code: &str, message: &str, args: &str) -> Response {
    let body = serde_json::json!({ "code": code, "message": message, "messageArgs": args });
    typed(Response::new(status, body.to_string()), "application/json")
}

fn bad_request(field: &str) -> Response {
    envelope(StatusCode::BAD_REQUEST, "COM0006", "Invalid value for %s", field)
}

/// A subscriber in a group, with one tag.
pub fn subscriber() -> Subscriber {
    let mut subscriber = Subscriber::new("s1.standard");
    subscriber.imsi = Some("440101234567890".to_string());
    subscriber.group_id = Some("group-a".to_string());
    subscriber
        .tags
        .insert("name".to_string(), "sensor-1".to_string());
    subscriber
}
