table! {
    users (id) {
        id -> Integer,
        email -> Text,
        full_name -> Text,
        password -> Text,
        role -> Text,
    }
}

table! {
    events (id) {
        id -> Integer,
        uuid -> Text,
        title -> Text,
        date -> Text,
        time -> Text,
        location -> Text,
        description -> Text,
        status -> Text,
        attendees -> Integer,
    }
}

table! {
    registrations (id) {
        id -> Integer,
        user_id -> Integer,
        event_uuid -> Text,
    }
}

joinable!(registrations -> users (user_id));

allow_tables_to_appear_in_same_query!(events, registrations, users,);
