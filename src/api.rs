use crate::db;
use crate::error::Error;
use crate::events::{self, EventCreation, Requester};
use crate::registrations;
use crate::templates;
use crate::users::{self, Login, Signup};
use crate::Settings;

use diesel::prelude::*;
use futures::{Future, Stream};
use gotham::handler::{HandlerError, HandlerFuture};
use gotham::helpers::http::response::create_response;
use gotham::state::{FromState, State};
use gotham_derive::{StateData, StaticResponseExtender};
use hyper::header::CONTENT_TYPE;
use hyper::{Body, HeaderMap, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_derive::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Clone, StateData)]
pub struct AppState {
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(settings: Settings) -> AppState {
        AppState {
            settings: Arc::new(settings),
        }
    }

    fn connect(&self) -> Result<SqliteConnection, Error> {
        db::connect(&self.settings.db_path)
    }
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct EventPath {
    id: String,
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct UserPath {
    email: String,
}

#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct EmailQuery {
    email: Option<String>,
}

fn connect(state: &State) -> Result<SqliteConnection, Error> {
    AppState::borrow_from(state).connect()
}

fn success(payload: Value) -> Value {
    let mut body = json!({ "success": true });
    if let (Some(body), Value::Object(payload)) = (body.as_object_mut(), payload) {
        body.extend(payload);
    }
    body
}

fn respond(state: &State, result: Result<Value, Error>) -> Response<Body> {
    match result {
        Ok(payload) => create_response(
            state,
            StatusCode::OK,
            mime::APPLICATION_JSON,
            success(payload).to_string(),
        ),
        Err(err) => err.as_response(state),
    }
}

fn parse_body<T>(state: &State, body: &[u8]) -> Result<T, Error>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    let is_form = HeaderMap::borrow_from(state)
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| {
            value.starts_with(mime::APPLICATION_WWW_FORM_URLENCODED.as_ref())
        });
    if is_form {
        serde_urlencoded::from_bytes(body).map_err(|_| Error::MalformedBody)
    } else {
        serde_json::from_slice(body).map_err(|_| Error::MalformedBody)
    }
}

fn with_body<T, F>(mut state: State, handle: F) -> Box<HandlerFuture>
where
    T: DeserializeOwned + Default + 'static,
    F: FnOnce(&State, T) -> Result<Value, Error> + Send + 'static,
{
    let f = Body::take_from(&mut state).concat2().then(
        move |body| -> Result<(State, Response<Body>), (State, HandlerError)> {
            let result = match body {
                Ok(body) => parse_body::<T>(&state, &body.into_bytes())
                    .and_then(|request| handle(&state, request)),
                Err(err) => Err(Error::Inner(Box::new(err))),
            };
            let response = respond(&state, result);
            Ok((state, response))
        },
    );
    Box::new(f)
}

fn to_json<T: serde::Serialize>(value: T) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|err| Error::Inner(Box::new(err)))
}

pub fn serve_index(state: State) -> (State, Response<Body>) {
    let site_name = AppState::borrow_from(&state).settings.site_name.as_str();
    let mut buf = Vec::new();
    let response = match templates::index(&mut buf, site_name) {
        Ok(()) => create_response(&state, StatusCode::OK, mime::TEXT_HTML_UTF_8, buf),
        Err(err) => Error::Inner(Box::new(err)).as_response(&state),
    };
    (state, response)
}

pub fn serve_stylesheet(state: State) -> (State, Response<Body>) {
    let response = create_response(
        &state,
        StatusCode::OK,
        mime::TEXT_CSS,
        templates::statics::style_css.content,
    );
    (state, response)
}

pub fn signup(state: State) -> Box<HandlerFuture> {
    with_body(state, |state, request: Signup| {
        let user = users::signup(&connect(state)?, &request)?;
        Ok(json!({ "message": "Account created successfully!", "user": to_json(user)? }))
    })
}

pub fn login(state: State) -> Box<HandlerFuture> {
    with_body(state, |state, request: Login| {
        let user = users::login(&connect(state)?, &request)?;
        Ok(json!({ "message": "Login successful!", "user": to_json(user)? }))
    })
}

pub fn list_users(state: State) -> (State, Response<Body>) {
    let result = connect(&state)
        .and_then(|conn| users::list_users(&conn))
        .and_then(|users| Ok(json!({ "users": to_json(users)? })));
    let response = respond(&state, result);
    (state, response)
}

pub fn get_user(state: State) -> (State, Response<Body>) {
    let result = connect(&state)
        .and_then(|conn| users::get_user(&conn, &UserPath::borrow_from(&state).email))
        .and_then(|user| Ok(json!({ "user": to_json(user)? })));
    let response = respond(&state, result);
    (state, response)
}

pub fn list_events(state: State) -> (State, Response<Body>) {
    let result = connect(&state)
        .and_then(|conn| events::list_events(&conn))
        .and_then(|events| Ok(json!({ "events": to_json(events)? })));
    let response = respond(&state, result);
    (state, response)
}

pub fn create_event(state: State) -> Box<HandlerFuture> {
    with_body(state, |state, request: EventCreation| {
        let restricted = AppState::borrow_from(state).settings.restrict_event_creation;
        let event = events::create_event(&connect(state)?, &request, restricted)?;
        Ok(json!({ "message": "Event created successfully!", "event": to_json(event)? }))
    })
}

pub fn delete_event(state: State) -> Box<HandlerFuture> {
    with_body(state, |state, request: Requester| {
        let email = request.email()?;
        let conn = connect(state)?;
        events::delete_event(&conn, email, &EventPath::borrow_from(state).id)?;
        Ok(json!({ "message": "Event deleted" }))
    })
}

pub fn register(state: State) -> Box<HandlerFuture> {
    with_body(state, |state, request: Requester| {
        let email = request.email()?;
        let conn = connect(state)?;
        let events = registrations::register(&conn, email, &EventPath::borrow_from(state).id)?;
        Ok(json!({ "message": "Registered for event", "events": events }))
    })
}

pub fn registered_events(state: State) -> (State, Response<Body>) {
    let result = Requester {
        email: EmailQuery::borrow_from(&state).email.clone(),
    }
    .email()
    .and_then(|email| {
        let conn = connect(&state)?;
        let events = registrations::registered_events(&conn, email)?;
        Ok(json!({ "events": to_json(events)? }))
    });
    let response = respond(&state, result);
    (state, response)
}
