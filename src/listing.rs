use crate::contact::Contact;
use crate::navigation::LinkState;

/// Texts the list falls back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListLabels {
    pub no_name: String,
    pub favorite: String,
    pub empty: String,
}

impl Default for ListLabels {
    fn default() -> Self {
        Self {
            no_name: "No Name".to_string(),
            favorite: "★".to_string(),
            empty: "No contacts".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryLabel {
    Name(String),
    /// Neither first nor last name is set
    NoName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// Contact id; stable across re-renders
    pub key: String,
    pub href: String,
    pub label: EntryLabel,
    pub favorite: bool,
    pub link: LinkState,
}

impl ListEntry {
    pub fn text(&self, labels: &ListLabels) -> String {
        let mut text = match &self.label {
            EntryLabel::Name(name) => name.clone(),
            EntryLabel::NoName => labels.no_name.clone(),
        };
        if self.favorite {
            text.push(' ');
            text.push_str(&labels.favorite);
        }
        text
    }
}

/// The rendered sidebar list. `Empty` is its own marker so an empty result
/// never looks like a list that has not loaded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListMarkup {
    Empty,
    Entries(Vec<ListEntry>),
}

impl ListMarkup {
    pub fn entries(&self) -> &[ListEntry] {
        match self {
            ListMarkup::Empty => &[],
            ListMarkup::Entries(entries) => entries,
        }
    }

    pub fn is_empty_marker(&self) -> bool {
        matches!(self, ListMarkup::Empty)
    }

    /// Plain-text form: one `id<TAB>label` line per entry.
    pub fn to_text(&self, labels: &ListLabels) -> String {
        match self {
            ListMarkup::Empty => labels.empty.clone(),
            ListMarkup::Entries(entries) => entries
                .iter()
                .map(|entry| format!("{}\t{}", entry.key, entry.text(labels)))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

pub fn contact_href(id: &str) -> String {
    format!("contacts/{}", id)
}

/// Project contacts into list entries, keeping the store's order.
/// `link_state` is asked for each entry's href; the renderer does not
/// decide active/pending itself.
pub fn render<F>(contacts: &[Contact], link_state: F) -> ListMarkup
where
    F: Fn(&str) -> LinkState,
{
    if contacts.is_empty() {
        return ListMarkup::Empty;
    }
    let entries = contacts
        .iter()
        .map(|contact| {
            let href = contact_href(&contact.id);
            ListEntry {
                key: contact.id.clone(),
                link: link_state(&href),
                href,
                label: contact
                    .full_name()
                    .map(EntryLabel::Name)
                    .unwrap_or(EntryLabel::NoName),
                favorite: contact.favorite,
            }
        })
        .collect();
    ListMarkup::Entries(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn contact(id: &str, first: &str, last: &str, favorite: bool) -> Contact {
        let mut contact = Contact::blank(id, 0);
        contact.first = Some(first.to_string());
        contact.last = Some(last.to_string());
        contact.favorite = favorite;
        contact
    }

    #[test]
    fn empty_input_renders_marker() {
        let markup = render(&[], |_| LinkState::Idle);
        assert!(markup.is_empty_marker());
        assert!(markup.entries().is_empty());
        assert_eq!(markup.to_text(&ListLabels::default()), "No contacts");
    }

    #[test]
    fn unnamed_favorite_gets_placeholder_and_star() {
        let markup = render(&[contact("1", "", "", true)], |_| LinkState::Idle);
        let labels = ListLabels::default();

        assert_eq!(
            markup.entries(),
            &[ListEntry {
                key: "1".into(),
                href: "contacts/1".into(),
                label: EntryLabel::NoName,
                favorite: true,
                link: LinkState::Idle,
            }]
        );
        assert_eq!(markup.entries()[0].text(&labels), "No Name ★");
    }

    #[test]
    fn keeps_store_order_and_passes_link_state_through() {
        let contacts = vec![
            contact("b", "Zed", "Alpha", false),
            contact("a", "Amy", "", false),
        ];
        let markup = render(&contacts, |href| {
            if href == "contacts/a" {
                LinkState::Pending
            } else {
                LinkState::Active
            }
        });

        let keys: Vec<&str> = markup.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(markup.entries()[0].link, LinkState::Active);
        assert_eq!(markup.entries()[1].link, LinkState::Pending);
        assert_eq!(markup.entries()[1].label, EntryLabel::Name("Amy".into()));
        assert_eq!(
            markup.to_text(&ListLabels::default()),
            "b\tZed Alpha\na\tAmy"
        );
    }
}
