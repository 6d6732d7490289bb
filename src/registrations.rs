use crate::error::Error;
use crate::events::parse_event_id;
use crate::models::Event;
use crate::schema::{events, registrations};
use crate::users::{find_user, registrations_of};

use diesel::prelude::*;
use tracing::info;

/// The event itself is not looked up; unknown ids are registered as given.
pub fn register(conn: &SqliteConnection, email: &str, event_id: &str) -> Result<Vec<String>, Error> {
    let user = find_user(conn, email)?.ok_or_else(|| Error::UserNotFound(email.to_owned()))?;
    let event_uuid = parse_event_id(event_id)?;

    let inserted = diesel::insert_or_ignore_into(registrations::table)
        .values((
            registrations::user_id.eq(user.id),
            registrations::event_uuid.eq(&event_uuid),
        ))
        .execute(conn)
        .map_err(Error::Database)?;
    if inserted > 0 {
        info!(email, event = %event_uuid, "registered for event");
    }

    Ok(registrations_of(conn, &user)?
        .into_iter()
        .map(|registration| registration.event_uuid)
        .collect())
}

pub fn registered_events(conn: &SqliteConnection, email: &str) -> Result<Vec<Event>, Error> {
    let user = find_user(conn, email)?.ok_or_else(|| Error::UserNotFound(email.to_owned()))?;
    registrations::table
        .inner_join(events::table.on(events::uuid.eq(registrations::event_uuid)))
        .filter(registrations::user_id.eq(user.id))
        .order(registrations::id.asc())
        .select(events::all_columns)
        .load::<Event>(conn)
        .map_err(Error::Database)
}
