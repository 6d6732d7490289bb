use crate::error::Error;
use crate::models::{non_empty, Event, NewEvent, Role, DEFAULT_STATUS};
use crate::schema::{events, registrations};
use crate::users::require_role;

use diesel::prelude::*;
use serde_derive::Deserialize;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct EventCreation {
    pub title: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub attendees: Option<i32>,
    /// Only consulted when event creation is restricted to organizers.
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Requester {
    pub email: Option<String>,
}

impl Requester {
    pub fn email(&self) -> Result<&str, Error> {
        non_empty(&self.email).ok_or(Error::MissingField("Email is required"))
    }
}

pub fn parse_event_id(id: &str) -> Result<String, Error> {
    id.parse::<Uuid>()
        .map(|uuid| format!("{}", uuid))
        .map_err(|_| Error::InvalidEventId(id.to_owned()))
}

pub fn find_event(conn: &SqliteConnection, event_uuid: &str) -> Result<Event, Error> {
    events::table
        .filter(events::uuid.eq(event_uuid))
        .first::<Event>(conn)
        .map_err(|err| match err {
            diesel::result::Error::NotFound => Error::EventNotFound(event_uuid.to_owned()),
            err => Error::Database(err),
        })
}

pub fn list_events(conn: &SqliteConnection) -> Result<Vec<Event>, Error> {
    events::table
        .order(events::id.asc())
        .load::<Event>(conn)
        .map_err(Error::Database)
}

pub fn create_event(
    conn: &SqliteConnection,
    creation: &EventCreation,
    restricted: bool,
) -> Result<Event, Error> {
    if restricted {
        let email = non_empty(&creation.email).ok_or(Error::MissingField("Email is required"))?;
        require_role(conn, email, &[Role::Organizer, Role::Admin])?;
    }

    let fields = (
        non_empty(&creation.title),
        non_empty(&creation.date),
        non_empty(&creation.time),
        non_empty(&creation.location),
        non_empty(&creation.description),
    );
    let (title, date, time, location, description) = match fields {
        (Some(title), Some(date), Some(time), Some(location), Some(description)) => {
            (title, date, time, location, description)
        }
        _ => return Err(Error::MissingField("All fields are required")),
    };

    let generated_uuid = format!("{}", Uuid::new_v4());
    diesel::insert_into(events::table)
        .values(&NewEvent {
            uuid: &generated_uuid,
            title,
            date,
            time,
            location,
            description,
            status: non_empty(&creation.status).unwrap_or(DEFAULT_STATUS),
            attendees: creation.attendees.unwrap_or(0),
        })
        .execute(conn)
        .map_err(Error::Database)?;
    info!(event = %generated_uuid, title, "event created");

    find_event(conn, &generated_uuid)
}

/// Admin-only. The delete and the removal of every registration pointing at
/// the event commit together or not at all.
pub fn delete_event(conn: &SqliteConnection, requester: &str, event_id: &str) -> Result<(), Error> {
    require_role(conn, requester, &[Role::Admin])?;
    // No stored event can carry an id that is not a UUID.
    let event_uuid =
        parse_event_id(event_id).map_err(|_| Error::EventNotFound(event_id.to_owned()))?;

    let cascaded = conn.transaction::<_, Error, _>(|| {
        let deleted = diesel::delete(events::table.filter(events::uuid.eq(&event_uuid)))
            .execute(conn)?;
        if deleted == 0 {
            return Err(Error::EventNotFound(event_uuid.clone()));
        }
        let cascaded = diesel::delete(
            registrations::table.filter(registrations::event_uuid.eq(&event_uuid)),
        )
        .execute(conn)?;
        Ok(cascaded)
    })?;
    info!(event = %event_uuid, requester, cascaded, "event deleted");
    Ok(())
}

#[cfg(test)]
pub fn fair() -> EventCreation {
    EventCreation {
        title: Some("Fair".to_owned()),
        date: Some("2024-05-01".to_owned()),
        time: Some("10:00".to_owned()),
        location: Some("Hall".to_owned()),
        description: Some("desc".to_owned()),
        ..EventCreation::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_connection;
    use crate::registrations::{register, registered_events};
    use crate::users::{set_role, signup, signup_request};

    fn with_admin_and_student(conn: &SqliteConnection) {
        signup(conn, &signup_request("Ada", "ada@x.com", "p1", "p1")).unwrap();
        signup(conn, &signup_request("Root", "admin@x.com", "p1", "p1")).unwrap();
        set_role(conn, "admin@x.com", Role::Admin).unwrap();
    }

    #[test]
    fn create_event_applies_defaults() {
        let conn = test_connection();
        let event = create_event(&conn, &fair(), false).unwrap();
        assert_eq!(event.title, "Fair");
        assert_eq!(event.status, "Published");
        assert_eq!(event.attendees, 0);
        assert!(event.uuid.parse::<Uuid>().is_ok());
        assert_eq!(list_events(&conn).unwrap().len(), 1);
    }

    #[test]
    fn create_event_keeps_supplied_status_and_attendees() {
        let conn = test_connection();
        let event = create_event(
            &conn,
            &EventCreation {
                status: Some("Draft".to_owned()),
                attendees: Some(12),
                ..fair()
            },
            false,
        )
        .unwrap();
        assert_eq!(event.status, "Draft");
        assert_eq!(event.attendees, 12);
    }

    #[test]
    fn create_event_requires_every_display_field() {
        let conn = test_connection();
        let result = create_event(
            &conn,
            &EventCreation {
                location: Some(String::new()),
                ..fair()
            },
            false,
        );
        match result {
            Err(Error::MissingField(..)) => {}
            other => panic!("Expected MissingField, got {:?}", other),
        }
        assert!(list_events(&conn).unwrap().is_empty());
    }

    #[test]
    fn restricted_creation_needs_organizer_or_admin() {
        let conn = test_connection();
        with_admin_and_student(&conn);
        let as_student = EventCreation {
            email: Some("ada@x.com".to_owned()),
            ..fair()
        };
        match create_event(&conn, &as_student, true) {
            Err(Error::Unauthorized) => {}
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
        let as_admin = EventCreation {
            email: Some("admin@x.com".to_owned()),
            ..fair()
        };
        assert!(create_event(&conn, &as_admin, true).is_ok());
        // The same student may create when the restriction is off.
        assert!(create_event(&conn, &as_student, false).is_ok());
    }

    #[test]
    fn non_admin_delete_leaves_event_store_unchanged() {
        let conn = test_connection();
        with_admin_and_student(&conn);
        let event = create_event(&conn, &fair(), false).unwrap();
        match delete_event(&conn, "ada@x.com", &event.uuid) {
            Err(Error::Unauthorized) => {}
            other => panic!("Expected Unauthorized, got {:?}", other),
        }
        assert!(find_event(&conn, &event.uuid).is_ok());
    }

    #[test]
    fn delete_unknown_event_is_not_found() {
        let conn = test_connection();
        with_admin_and_student(&conn);
        let missing = format!("{}", Uuid::new_v4());
        match delete_event(&conn, "admin@x.com", &missing) {
            Err(Error::EventNotFound(id)) => assert_eq!(id, missing),
            other => panic!("Expected EventNotFound, got {:?}", other),
        }
    }

    #[test]
    fn delete_malformed_event_id_is_not_found() {
        let conn = test_connection();
        with_admin_and_student(&conn);
        create_event(&conn, &fair(), false).unwrap();
        match delete_event(&conn, "admin@x.com", "not-a-uuid") {
            Err(Error::EventNotFound(id)) => assert_eq!(id, "not-a-uuid"),
            other => panic!("Expected EventNotFound, got {:?}", other),
        }
        assert_eq!(list_events(&conn).unwrap().len(), 1);
    }

    #[test]
    fn delete_cascades_to_every_registration() {
        let conn = test_connection();
        with_admin_and_student(&conn);
        signup(&conn, &signup_request("Bob", "bob@x.com", "p1", "p1")).unwrap();
        let doomed = create_event(&conn, &fair(), false).unwrap();
        let kept = create_event(&conn, &fair(), false).unwrap();
        for email in &["ada@x.com", "bob@x.com", "admin@x.com"] {
            register(&conn, email, &doomed.uuid).unwrap();
        }
        register(&conn, "bob@x.com", &kept.uuid).unwrap();

        delete_event(&conn, "admin@x.com", &doomed.uuid).unwrap();

        let dangling: i64 = registrations::table
            .filter(registrations::event_uuid.eq(&doomed.uuid))
            .count()
            .get_result(&conn)
            .unwrap();
        assert_eq!(dangling, 0);
        assert!(registered_events(&conn, "ada@x.com").unwrap().is_empty());
        let bobs: Vec<String> = registered_events(&conn, "bob@x.com")
            .unwrap()
            .into_iter()
            .map(|event| event.uuid)
            .collect();
        assert_eq!(bobs, vec![kept.uuid]);
    }

    #[test]
    fn event_ids_are_normalized() {
        let id = "936DA01F-9ABD-4D9D-80C7-02AF85C822A8";
        assert_eq!(
            parse_event_id(id).unwrap(),
            "936da01f-9abd-4d9d-80c7-02af85c822a8"
        );
        match parse_event_id("not-a-uuid") {
            Err(Error::InvalidEventId(..)) => {}
            other => panic!("Expected InvalidEventId, got {:?}", other),
        }
    }
}
