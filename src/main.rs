#[macro_use]
extern crate diesel;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use gotham::middleware::state::StateMiddleware;
use gotham::pipeline::new_pipeline;
use gotham::pipeline::single::single_pipeline;
use gotham::router::{builder::*, Router};
use serde_derive::Deserialize;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::models::Role;

mod api;
mod db;
mod error;
mod events;
mod models;
mod registrations;
mod schema;
mod users;

include!(concat!(env!("OUT_DIR"), "/templates.rs"));

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub site_name: String,
    pub db_path: PathBuf,
    /// When set, only organizers and admins may create events.
    pub restrict_event_creation: bool,
}

impl Settings {
    /// `path` names a settings file without its extension; it may be absent.
    /// `CAMPUS_*` environment variables override whatever it contains.
    fn load(path: &str) -> Result<Settings, config::ConfigError> {
        let mut settings = config::Config::default();
        settings
            .set_default("host", "127.0.0.1")?
            .set_default("port", 3000_i64)?
            .set_default("site_name", "Campus Events")?
            .set_default("db_path", "campus-events.db")?
            .set_default("restrict_event_creation", false)?;
        settings.merge(config::File::with_name(path).required(false))?;
        settings.merge(config::Environment::with_prefix("CAMPUS"))?;
        settings.try_into::<Settings>()
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run(&cli().get_matches()) {
        error!(error = ?err, "{}", err);
        std::process::exit(1);
    }
}

fn cli<'a, 'b>() -> App<'a, 'b> {
    App::new("campus-events")
        .version(clap::crate_version!())
        .about("Campus events REST server")
        .setting(AppSettings::VersionlessSubcommands)
        .arg(
            Arg::with_name("settings")
                .long("settings")
                .value_name("FILE")
                .help("Settings file, without extension")
                .takes_value(true)
                .default_value("settings"),
        )
        .subcommand(SubCommand::with_name("serve").about("Runs the HTTP server (default)"))
        .subcommand(
            SubCommand::with_name("set-role")
                .about("Changes the role of an existing user")
                .arg(Arg::with_name("email").required(true))
                .arg(
                    Arg::with_name("role")
                        .required(true)
                        .possible_values(&["student", "organizer", "admin"]),
                ),
        )
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::load(matches.value_of("settings").unwrap_or("settings"))?;
    let conn = db::connect(&settings.db_path)?;
    db::migrate(&conn)?;

    match matches.subcommand() {
        ("set-role", Some(args)) => {
            let email = args.value_of("email").ok_or("email is required")?;
            let role = args
                .value_of("role")
                .ok_or("role is required")?
                .parse::<Role>()?;
            users::set_role(&conn, email, role)?;
            println!("{} is now {}", email, role);
            Ok(())
        }
        _ => {
            drop(conn);
            let address = format!("{}:{}", settings.host, settings.port);
            info!(%address, db = %settings.db_path.display(), "starting server");
            gotham::start(address, router(AppState::new(settings)));
            Ok(())
        }
    }
}

fn router(app_state: AppState) -> Router {
    let (chain, pipelines) =
        single_pipeline(new_pipeline().add(StateMiddleware::new(app_state)).build());

    build_router(chain, pipelines, |route| {
        route.get("/").to(api::serve_index);
        route.get("/style.css").to(api::serve_stylesheet);

        route.post("/api/signup").to(api::signup);
        route.post("/api/login").to(api::login);
        route.get("/api/users").to(api::list_users);
        route
            .get("/api/user/:email")
            .with_path_extractor::<api::UserPath>()
            .to(api::get_user);

        route.get("/api/events").to(api::list_events);
        route.post("/api/events").to(api::create_event);
        route
            .get("/api/events/registered")
            .with_query_string_extractor::<api::EmailQuery>()
            .to(api::registered_events);
        route
            .delete("/api/events/:id")
            .with_path_extractor::<api::EventPath>()
            .to(api::delete_event);
        route
            .post("/api/events/:id/register")
            .with_path_extractor::<api::EventPath>()
            .to(api::register);
    })
}
