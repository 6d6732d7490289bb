use crate::error::Error;
use crate::models::{non_empty, NewUser, Registration, Role, User, UserProfile};
use crate::schema::{registrations, users};

use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use lazy_static::lazy_static;
use regex::Regex;
use serde_derive::Deserialize;
use tracing::{info, warn};

lazy_static! {
    static ref EMAIL_FORMAT: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signup {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Login {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub fn find_user(conn: &SqliteConnection, email: &str) -> Result<Option<User>, Error> {
    users::table
        .filter(users::email.eq(email))
        .first::<User>(conn)
        .optional()
        .map_err(Error::Database)
}

pub fn signup(conn: &SqliteConnection, signup: &Signup) -> Result<UserProfile, Error> {
    if signup.password != signup.confirm_password {
        return Err(Error::PasswordMismatch);
    }
    let (full_name, email, password) = match (
        non_empty(&signup.full_name),
        non_empty(&signup.email),
        non_empty(&signup.password),
    ) {
        (Some(full_name), Some(email), Some(password)) => (full_name, email, password),
        _ => return Err(Error::MissingField("All fields are required")),
    };

    if find_user(conn, email)?.is_some() {
        return Err(Error::EmailTaken);
    }

    diesel::insert_into(users::table)
        .values(&NewUser {
            email,
            full_name,
            password,
            role: Role::Student.as_str(),
        })
        .execute(conn)
        .map_err(|err| match err {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                Error::EmailTaken
            }
            err => Error::Database(err),
        })?;
    info!(email, "account created");

    let user = find_user(conn, email)?.ok_or_else(|| Error::UserNotFound(email.to_owned()))?;
    Ok(UserProfile::new(user, Vec::new()))
}

pub fn login(conn: &SqliteConnection, login: &Login) -> Result<UserProfile, Error> {
    let (email, password) = match (non_empty(&login.email), non_empty(&login.password)) {
        (Some(email), Some(password)) => (email, password),
        _ => return Err(Error::MissingField("Email and password are required")),
    };
    let user = find_user(conn, email)?.ok_or(Error::AccountNotFound)?;
    if user.password != password {
        warn!(email, "rejected login with incorrect password");
        return Err(Error::WrongPassword);
    }
    profile(conn, user)
}

/// The acting user is whoever the caller claims to be; nothing binds the
/// request to that email.
pub fn require_role(conn: &SqliteConnection, email: &str, allowed: &[Role]) -> Result<User, Error> {
    match find_user(conn, email)? {
        Some(user) if user.role().map_or(false, |role| allowed.contains(&role)) => Ok(user),
        Some(user) => {
            warn!(email, role = %user.role, "role not permitted");
            Err(Error::Unauthorized)
        }
        None => {
            warn!(email, "unknown user attempted a privileged operation");
            Err(Error::Unauthorized)
        }
    }
}

pub fn registrations_of(conn: &SqliteConnection, user: &User) -> Result<Vec<Registration>, Error> {
    Registration::belonging_to(user)
        .order(registrations::id.asc())
        .load::<Registration>(conn)
        .map_err(Error::Database)
}

pub fn profile(conn: &SqliteConnection, user: User) -> Result<UserProfile, Error> {
    let registrations = registrations_of(conn, &user)?;
    Ok(UserProfile::new(user, registrations))
}

pub fn get_user(conn: &SqliteConnection, email: &str) -> Result<UserProfile, Error> {
    if email.trim().is_empty() {
        return Err(Error::MissingField("Email is required"));
    }
    if !EMAIL_FORMAT.is_match(email) {
        return Err(Error::InvalidEmail);
    }
    let user = find_user(conn, email)?.ok_or_else(|| Error::UserNotFound(email.to_owned()))?;
    profile(conn, user)
}

pub fn list_users(conn: &SqliteConnection) -> Result<Vec<UserProfile>, Error> {
    let users = users::table
        .order(users::id.asc())
        .load::<User>(conn)
        .map_err(Error::Database)?;
    let registrations = Registration::belonging_to(&users)
        .order(registrations::id.asc())
        .load::<Registration>(conn)
        .map_err(Error::Database)?
        .grouped_by(&users);
    Ok(users
        .into_iter()
        .zip(registrations)
        .map(|(user, registrations)| UserProfile::new(user, registrations))
        .collect())
}

pub fn set_role(conn: &SqliteConnection, email: &str, role: Role) -> Result<(), Error> {
    let updated = diesel::update(users::table.filter(users::email.eq(email)))
        .set(users::role.eq(role.as_str()))
        .execute(conn)
        .map_err(Error::Database)?;
    if updated == 0 {
        return Err(Error::UserNotFound(email.to_owned()));
    }
    info!(email, %role, "role updated");
    Ok(())
}

#[cfg(test)]
pub fn signup_request(full_name: &str, email: &str, password: &str, confirm: &str) -> Signup {
    Signup {
        full_name: Some(full_name.to_owned()),
        email: Some(email.to_owned()),
        password: Some(password.to_owned()),
        confirm_password: Some(confirm.to_owned()),
    }
}
