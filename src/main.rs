mod config;
mod contact;
mod creation;
mod db;
mod error;
mod history;
mod listing;
mod loader;
mod location;
mod logging;
mod navigation;
mod query;
mod search;
mod session;
#[cfg(test)]
mod testing;
mod ui;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tracing::{info, warn};

use config::Config;
use contact::ContactStore;
use db::Database;
use location::Location;
use logging::Verbosity;
use session::{ContactAction, Session};

#[derive(Parser, Debug)]
#[command(name = "rolo", version, about = "Terminal contact manager")]
struct Cli {
    /// Configuration file (default: <config dir>/rolo/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Contact database, overriding the configured one
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Location to open the TUI at, e.g. "/?q=al" or "/contacts/1a2b3c4d"
    #[arg(long, value_name = "LOCATION")]
    url: Option<String>,

    #[arg(short, long, global = true)]
    verbose: bool,

    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List contacts, optionally filtered by name
    List(ListArgs),
    /// Create a blank contact and print its edit location
    New,
    /// Show one contact
    Show(IdArgs),
    /// Change fields of a contact
    Edit(EditArgs),
    /// Delete a contact
    Delete(IdArgs),
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Search filter (matches first and last name)
    query: Option<String>,

    /// Print the contacts as JSON instead of the list view
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct IdArgs {
    id: String,
}

#[derive(Args, Debug)]
struct EditArgs {
    id: String,
    #[arg(long)]
    first: Option<String>,
    #[arg(long)]
    last: Option<String>,
    #[arg(long)]
    twitter: Option<String>,
    #[arg(long)]
    avatar: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long, value_name = "BOOL")]
    favorite: Option<bool>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);

    if cli.command.is_some() {
        logging::init_stderr(verbosity);
    } else {
        logging::init_file(verbosity, &config::default_log_path()?)?;
    }

    let mut config = config::load(cli.config.as_deref())?;
    if let Some(db_path) = cli.db {
        config.db_path = db_path;
    }
    if let Some(path) = &config.config_path {
        info!(path = %path.display(), "configuration loaded");
    }

    let db = Database::open_at(&config.db_path)?;

    match cli.command {
        Some(Command::List(args)) => handle_list(&db, &config, args),
        Some(Command::New) => handle_new(&db),
        Some(Command::Show(args)) => handle_show(&db, &config, &args.id),
        Some(Command::Edit(args)) => handle_edit(&db, args),
        Some(Command::Delete(args)) => handle_delete(&db, &args.id),
        None => run_tui(&db, &config, cli.url.as_deref()),
    }
}

fn run_tui(db: &Database, config: &Config, url: Option<&str>) -> Result<()> {
    let location = match url {
        Some(href) => Location::parse(href).with_context(|| format!("invalid location {}", href))?,
        None => Location::root(),
    };

    let initial = match session::load_route(db, &location) {
        Ok(data) => data,
        Err(err) => {
            warn!(error = %err, "initial location failed to load, starting at the index");
            session::load_route(db, &Location::root())?
        }
    };

    let mut app = ui::app::App::new(db, config, Session::new(initial));
    app.run()
}

fn handle_list(db: &Database, config: &Config, args: ListArgs) -> Result<()> {
    let location = match args.query.as_deref() {
        Some(q) => Location::search(q),
        None => Location::root(),
    };
    let session = Session::new(session::load_route(db, &location)?);

    if args.json {
        println!("{}", serde_json::to_string_pretty(session.contacts())?);
    } else {
        println!("{}", session.list().to_text(&config.ui.labels));
    }
    Ok(())
}

fn handle_new(db: &Database) -> Result<()> {
    let mut session = Session::new(session::load_route(db, &Location::root())?);
    let ticket = session.create_contact(db)?;
    println!("{}", ticket.location.href());
    Ok(())
}

fn handle_show(db: &Database, config: &Config, id: &str) -> Result<()> {
    let Some(contact) = db.get_contact(id)? else {
        bail!("no contact with id {}", id);
    };

    let created = OffsetDateTime::from_unix_timestamp(contact.created_at)
        .ok()
        .and_then(|ts| ts.format(&Rfc3339).ok())
        .unwrap_or_else(|| contact.created_at.to_string());
    let name = contact
        .full_name()
        .unwrap_or_else(|| config.ui.labels.no_name.clone());

    println!("id:       {}", contact.id);
    println!("name:     {}", name);
    if contact.favorite {
        println!("favorite: {}", config.ui.labels.favorite);
    }
    for (label, value) in [
        ("twitter", &contact.twitter),
        ("avatar", &contact.avatar),
        ("notes", &contact.notes),
    ] {
        if let Some(value) = value {
            println!("{:<9} {}", format!("{}:", label), value);
        }
    }
    println!("created:  {}", created);
    Ok(())
}

fn handle_edit(db: &Database, args: EditArgs) -> Result<()> {
    let mut session = Session::new(session::load_route(db, &Location::contact(&args.id))?);
    let Some(contact) = session.detail().cloned() else {
        bail!("no contact with id {}", args.id);
    };

    let mut draft = contact.draft();
    let mut changed = false;
    for (slot, value) in [
        (&mut draft.first, args.first),
        (&mut draft.last, args.last),
        (&mut draft.twitter, args.twitter),
        (&mut draft.avatar, args.avatar),
        (&mut draft.notes, args.notes),
    ] {
        if let Some(value) = value {
            *slot = value;
            changed = true;
        }
    }

    if changed {
        let ticket = session.perform(
            db,
            ContactAction::Save {
                id: contact.id.clone(),
                draft,
            },
        )?;
        info!(location = %ticket.location, "contact saved");
    }
    if args.favorite.is_some_and(|favorite| favorite != contact.favorite) {
        session.perform(db, ContactAction::ToggleFavorite { id: contact.id.clone() })?;
    }

    println!("{}", Location::contact(&contact.id).href());
    Ok(())
}

fn handle_delete(db: &Database, id: &str) -> Result<()> {
    let mut session = Session::new(session::load_route(db, &Location::contact(id))?);
    let ticket = session.perform(db, ContactAction::Delete { id: id.to_string() })?;
    println!("{}", ticket.location.href());
    Ok(())
}
