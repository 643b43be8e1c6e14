use anyhow::Result;
use serde::Serialize;

/// A contact record as the store hands it out.
///
/// `id` is assigned by the store on creation and never changes afterwards.
/// `first` and `last` may both be missing; that is a valid, unnamed contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub id: String,
    pub first: Option<String>,
    pub last: Option<String>,
    pub favorite: bool,
    pub avatar: Option<String>,
    pub twitter: Option<String>,
    pub notes: Option<String>,
    /// Unix timestamp (seconds) of creation; secondary sort key in listings
    pub created_at: i64,
}

impl Contact {
    /// A blank contact with just an id, as produced by `create_contact`.
    pub fn blank(id: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            first: None,
            last: None,
            favorite: false,
            avatar: None,
            twitter: None,
            notes: None,
            created_at,
        }
    }

    /// `first last`, trimmed. `None` when neither part has any text.
    pub fn full_name(&self) -> Option<String> {
        let joined = format!(
            "{} {}",
            self.first.as_deref().unwrap_or(""),
            self.last.as_deref().unwrap_or("")
        );
        let trimmed = joined.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn draft(&self) -> ContactDraft {
        ContactDraft {
            first: self.first.clone().unwrap_or_default(),
            last: self.last.clone().unwrap_or_default(),
            avatar: self.avatar.clone().unwrap_or_default(),
            twitter: self.twitter.clone().unwrap_or_default(),
            notes: self.notes.clone().unwrap_or_default(),
        }
    }
}

/// Editable fields of a contact, as submitted by the edit form.
/// Empty strings mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDraft {
    pub first: String,
    pub last: String,
    pub avatar: String,
    pub twitter: String,
    pub notes: String,
}

impl ContactDraft {
    pub fn apply_to(&self, contact: &mut Contact) {
        contact.first = non_empty(&self.first);
        contact.last = non_empty(&self.last);
        contact.avatar = non_empty(&self.avatar);
        contact.twitter = non_empty(&self.twitter);
        contact.notes = non_empty(&self.notes);
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Persistent contact storage.
///
/// Listing order is owned by the implementation; callers must not re-sort.
pub trait ContactStore {
    /// Contacts matching `filter` (`None` or blank means all contacts).
    fn list_contacts(&self, filter: Option<&str>) -> Result<Vec<Contact>>;

    fn get_contact(&self, id: &str) -> Result<Option<Contact>>;

    /// Allocate a fresh id and store a blank contact under it.
    fn create_contact(&self) -> Result<Contact>;

    fn update_contact(&self, id: &str, draft: &ContactDraft) -> Result<Contact>;

    fn set_favorite(&self, id: &str, favorite: bool) -> Result<()>;

    fn delete_contact(&self, id: &str) -> Result<()>;
}
