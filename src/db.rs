use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::contact::{Contact, ContactDraft, ContactStore};
use crate::search;

const APP_NAME: &str = "rolo";
const DB_FILE_NAME: &str = "contacts.db";
const ID_LEN: usize = 8;
const MAX_ID_ATTEMPTS: usize = 5;

const CONTACT_COLUMNS: &str =
    "id, first, last, favorite, avatar, twitter, notes, created_at";

/// SQLite-backed contact store.
///
/// Each connection is single-threaded; background loaders open their own
/// connection to the same file.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// `<data dir>/rolo/contacts.db`
    pub fn default_path() -> Result<PathBuf> {
        let base = BaseDirs::new().context("unable to determine data directories")?;
        Ok(base.data_dir().join(APP_NAME).join(DB_FILE_NAME))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create data dir: {}", parent.display())
                })?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;
        let mut db = Self {
            conn,
            path: path.to_path_buf(),
        };
        db.setup()?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn setup(&mut self) -> Result<()> {
        self.conn.busy_timeout(Duration::from_secs(5))?;
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "FULL")?;

        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS contacts (
              id         TEXT PRIMARY KEY,
              first      TEXT,
              last       TEXT,
              first_norm TEXT NOT NULL DEFAULT '',
              last_norm  TEXT NOT NULL DEFAULT '',
              favorite   INTEGER NOT NULL DEFAULT 0,
              avatar     TEXT,
              twitter    TEXT,
              notes      TEXT,
              created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_contacts_last ON contacts(last COLLATE NOCASE);
            CREATE INDEX IF NOT EXISTS idx_contacts_first_norm ON contacts(first_norm);
            CREATE INDEX IF NOT EXISTS idx_contacts_last_norm ON contacts(last_norm);
        "#,
        )?;
        Ok(())
    }

    fn insert_blank(&self, id: &str, created_at: i64) -> rusqlite::Result<usize> {
        self.conn.execute(
            "INSERT INTO contacts (id, created_at) VALUES (?1, ?2)",
            params![id, created_at],
        )
    }
}

impl ContactStore for Database {
    fn list_contacts(&self, filter: Option<&str>) -> Result<Vec<Contact>> {
        let mut sql = format!("SELECT {} FROM contacts", CONTACT_COLUMNS);

        let pattern = filter
            .and_then(search::normalize_query)
            .map(|normalized| search::like_pattern(&normalized));
        if pattern.is_some() {
            sql.push_str(
                r" WHERE first_norm LIKE ?1 ESCAPE '\'
                    OR last_norm LIKE ?1 ESCAPE '\'
                    OR (first_norm || ' ' || last_norm) LIKE ?1 ESCAPE '\'",
            );
        }
        sql.push_str(" ORDER BY COALESCE(last, '') COLLATE NOCASE, created_at, id");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = match pattern.as_deref() {
            Some(pattern) => stmt.query_map([pattern], row_to_contact)?,
            None => stmt.query_map([], row_to_contact)?,
        };

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        debug!(filter = ?filter, count = out.len(), "listed contacts");
        Ok(out)
    }

    fn get_contact(&self, id: &str) -> Result<Option<Contact>> {
        let sql = format!("SELECT {} FROM contacts WHERE id = ?1", CONTACT_COLUMNS);
        let contact = self
            .conn
            .query_row(&sql, [id], row_to_contact)
            .optional()?;
        Ok(contact)
    }

    fn create_contact(&self) -> Result<Contact> {
        let created_at = OffsetDateTime::now_utc().unix_timestamp();
        for attempt in 1..=MAX_ID_ATTEMPTS {
            let id = new_contact_id();
            match self.insert_blank(&id, created_at) {
                Ok(_) => {
                    debug!(%id, "created contact");
                    return Ok(Contact::blank(id, created_at));
                }
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    warn!(%id, attempt, "contact id collision");
                }
                Err(err) => return Err(err).context("failed to insert contact"),
            }
        }
        bail!(
            "could not allocate a contact id after {} attempts",
            MAX_ID_ATTEMPTS
        )
    }

    fn update_contact(&self, id: &str, draft: &ContactDraft) -> Result<Contact> {
        let Some(mut contact) = self.get_contact(id)? else {
            bail!("no contact with id {}", id);
        };
        draft.apply_to(&mut contact);

        self.conn.execute(
            r#"
            UPDATE contacts SET
              first = ?2,
              last = ?3,
              first_norm = ?4,
              last_norm = ?5,
              avatar = ?6,
              twitter = ?7,
              notes = ?8
            WHERE id = ?1
        "#,
            params![
                id,
                contact.first,
                contact.last,
                search::normalize(contact.first.as_deref().unwrap_or("")),
                search::normalize(contact.last.as_deref().unwrap_or("")),
                contact.avatar,
                contact.twitter,
                contact.notes,
            ],
        )?;
        debug!(%id, "updated contact");
        Ok(contact)
    }

    fn set_favorite(&self, id: &str, favorite: bool) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE contacts SET favorite = ?2 WHERE id = ?1",
            params![id, if favorite { 1 } else { 0 }],
        )?;
        if changed == 0 {
            bail!("no contact with id {}", id);
        }
        Ok(())
    }

    fn delete_contact(&self, id: &str) -> Result<()> {
        let changed = self
            .conn
            .execute("DELETE FROM contacts WHERE id = ?1", params![id])?;
        if changed == 0 {
            bail!("no contact with id {}", id);
        }
        debug!(%id, "deleted contact");
        Ok(())
    }
}

fn new_contact_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(ID_LEN);
    id
}

fn row_to_contact(row: &Row<'_>) -> rusqlite::Result<Contact> {
    Ok(Contact {
        id: row.get(0)?,
        first: row.get(1)?,
        last: row.get(2)?,
        favorite: row.get::<_, i64>(3)? != 0,
        avatar: row.get(4)?,
        twitter: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
    })
}
