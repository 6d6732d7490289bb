use gotham::helpers::http::response::create_response;
use gotham::state::State;
use hyper::StatusCode;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub enum Error {
    MissingField(&'static str),
    PasswordMismatch,
    InvalidEmail,
    InvalidEventId(String),
    MalformedBody,
    UnknownRole(String),
    EmailTaken,
    UserNotFound(String),
    AccountNotFound,
    EventNotFound(String),
    WrongPassword,
    Unauthorized,
    DatabaseConnection(diesel::ConnectionError),
    Database(diesel::result::Error),
    Inner(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn as_response(&self, state: &State) -> http::Response<hyper::Body> {
        let status = self.status_code();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!(error = ?self, "request failed");
        }
        let body = json!({
            "success": false,
            "message": self.to_string(),
        });
        create_response(state, status, mime::APPLICATION_JSON, body.to_string())
    }

    pub fn status_code(&self) -> StatusCode {
        use Error::*;
        match self {
            UserNotFound(..) | EventNotFound(..) => StatusCode::NOT_FOUND,
            Unauthorized => StatusCode::FORBIDDEN,
            MissingField(..) | PasswordMismatch | InvalidEmail | InvalidEventId(..)
            | MalformedBody | UnknownRole(..) | EmailTaken | AccountNotFound | WrongPassword => {
                StatusCode::BAD_REQUEST
            }
            DatabaseConnection(..) | Database(..) | Inner(..) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<diesel::result::Error> for Error {
    fn from(err: diesel::result::Error) -> Error {
        Error::Database(err)
    }
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        use Error::*;
        match self {
            MissingField(message) => write!(f, "{}", message),
            PasswordMismatch => write!(f, "Passwords do not match"),
            InvalidEmail => write!(f, "Invalid email format"),
            InvalidEventId(id) => write!(f, "Invalid event id: {}", id),
            MalformedBody => write!(f, "Malformed request body"),
            UnknownRole(role) => write!(f, "Unknown role: {}", role),
            EmailTaken => write!(f, "Email already registered"),
            UserNotFound(..) | AccountNotFound => write!(f, "User not found"),
            EventNotFound(..) => write!(f, "Event not found"),
            WrongPassword => write!(f, "Incorrect password"),
            Unauthorized => write!(f, "Unauthorized"),
            DatabaseConnection(..) => write!(f, "Database connection error"),
            Database(..) => write!(f, "Database error"),
            Inner(..) => write!(f, "Unexpected error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_http_statuses() {
        assert_eq!(Error::MissingField("Email is required").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::EmailTaken.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::WrongPassword.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::AccountNotFound.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::UserNotFound("ada@x.com".to_owned()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(Error::Unauthorized.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            Error::Database(diesel::result::Error::RollbackTransaction).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = Error::Inner(Box::new(std::io::Error::new(
            std::io::ErrorKind::Other,
            "disk on fire",
        )));
        assert_eq!(err.to_string(), "Unexpected error");
    }
}
