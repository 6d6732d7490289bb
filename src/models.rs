use crate::error::Error;
use crate::schema::*;

use serde_derive::Serialize;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_STATUS: &str = "Published";

pub fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_ref().map(String::as_str).filter(|value| !value.is_empty())
}

#[derive(Debug, Identifiable, Queryable, Serialize)]
pub struct Event {
    #[serde(skip)]
    pub id: i32,
    #[serde(rename = "id")]
    pub uuid: String,
    pub title: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub description: String,
    pub status: String,
    pub attendees: i32,
}

#[derive(Debug, Insertable)]
#[table_name = "events"]
pub struct NewEvent<'a> {
    pub uuid: &'a str,
    pub title: &'a str,
    pub date: &'a str,
    pub time: &'a str,
    pub location: &'a str,
    pub description: &'a str,
    pub status: &'a str,
    pub attendees: i32,
}

#[derive(Debug, Identifiable, Queryable)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub role: String,
}

impl User {
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

#[derive(Debug, Insertable)]
#[table_name = "users"]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub full_name: &'a str,
    pub password: &'a str,
    pub role: &'a str,
}

#[derive(Associations, Debug, Identifiable, Queryable)]
#[belongs_to(User)]
pub struct Registration {
    pub id: i32,
    pub user_id: i32,
    pub event_uuid: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub full_name: String,
    pub email: String,
    pub role: String,
    pub events: Vec<String>,
}

impl UserProfile {
    pub fn new(user: User, registrations: Vec<Registration>) -> UserProfile {
        UserProfile {
            full_name: user.full_name,
            email: user.email,
            role: user.role,
            events: registrations
                .into_iter()
                .map(|registration| registration.event_uuid)
                .collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Student,
    Organizer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Organizer => "organizer",
            Role::Admin => "admin",
        }
    }
}

impl Default for Role {
    fn default() -> Role {
        Role::Student
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Role, Error> {
        match s {
            "student" => Ok(Role::Student),
            "organizer" => Ok(Role::Organizer),
            "admin" => Ok(Role::Admin),
            other => Err(Error::UnknownRole(other.to_owned())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
