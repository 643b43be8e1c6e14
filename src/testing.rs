//! Test doubles shared by unit tests.

use std::cell::{Cell, RefCell};

use anyhow::{anyhow, bail, Result};

use crate::contact::{Contact, ContactDraft, ContactStore};

pub fn person(id: &str, first: &str, last: &str) -> Contact {
    let mut contact = Contact::blank(id, 0);
    contact.first = Some(first.to_string());
    contact.last = Some(last.to_string());
    contact
}

/// In-memory store with call counters and switchable failures.
#[derive(Default)]
pub struct FakeStore {
    pub contacts: RefCell<Vec<Contact>>,
    pub next_id: RefCell<Option<String>>,
    pub fail_create: Cell<bool>,
    pub fail_list: Cell<bool>,
    pub list_calls: Cell<usize>,
    pub create_calls: Cell<usize>,
}

impl FakeStore {
    pub fn with_contacts(contacts: Vec<Contact>) -> Self {
        Self {
            contacts: RefCell::new(contacts),
            ..Self::default()
        }
    }
}

impl ContactStore for FakeStore {
    fn list_contacts(&self, filter: Option<&str>) -> Result<Vec<Contact>> {
        self.list_calls.set(self.list_calls.get() + 1);
        if self.fail_list.get() {
            bail!("disk on fire");
        }
        let needle = filter.map(|f| f.trim().to_lowercase()).unwrap_or_default();
        Ok(self
            .contacts
            .borrow()
            .iter()
            .filter(|c| {
                needle.is_empty()
                    || c.full_name()
                        .map(|name| name.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    fn get_contact(&self, id: &str) -> Result<Option<Contact>> {
        Ok(self.contacts.borrow().iter().find(|c| c.id == id).cloned())
    }

    fn create_contact(&self) -> Result<Contact> {
        self.create_calls.set(self.create_calls.get() + 1);
        if self.fail_create.get() {
            return Err(anyhow!("no ids left"));
        }
        let id = self
            .next_id
            .borrow_mut()
            .take()
            .unwrap_or_else(|| format!("c{}", self.contacts.borrow().len() + 1));
        let contact = Contact::blank(id, 0);
        self.contacts.borrow_mut().push(contact.clone());
        Ok(contact)
    }

    fn update_contact(&self, id: &str, draft: &ContactDraft) -> Result<Contact> {
        let mut contacts = self.contacts.borrow_mut();
        let Some(contact) = contacts.iter_mut().find(|c| c.id == id) else {
            bail!("no contact with id {}", id);
        };
        draft.apply_to(contact);
        Ok(contact.clone())
    }

    fn set_favorite(&self, id: &str, favorite: bool) -> Result<()> {
        let mut contacts = self.contacts.borrow_mut();
        let Some(contact) = contacts.iter_mut().find(|c| c.id == id) else {
            bail!("no contact with id {}", id);
        };
        contact.favorite = favorite;
        Ok(())
    }

    fn delete_contact(&self, id: &str) -> Result<()> {
        let mut contacts = self.contacts.borrow_mut();
        let before = contacts.len();
        contacts.retain(|c| c.id != id);
        if contacts.len() == before {
            bail!("no contact with id {}", id);
        }
        Ok(())
    }
}
