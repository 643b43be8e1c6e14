//! The single owner of list/search/navigation state.
//!
//! Everything that changes what the user sees goes through a `Session`:
//! keystrokes and clicks become navigations, navigations become loader
//! tickets, and loader results come back through [`Session::resolve`],
//! which is the only place the list, the detail contact and the committed
//! `q` are replaced.

use tracing::{debug, warn};

use crate::contact::{Contact, ContactDraft, ContactStore};
use crate::creation;
use crate::error::AppError;
use crate::history::History;
use crate::listing::{self, ListMarkup};
use crate::location::{Location, Route};
use crate::navigation::{NavigationMode, NavigationStatus, NavigationTicket, Navigator};
use crate::query::QueryController;

/// What a route needs on screen: the (filtered) list, plus the contact
/// for detail and edit routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteData {
    pub location: Location,
    pub contacts: Vec<Contact>,
    pub detail: Option<Contact>,
}

/// Run the loaders for `location` against `store`.
pub fn load_route(store: &dyn ContactStore, location: &Location) -> Result<RouteData, AppError> {
    let href = location.href();
    let route = location.route();
    if route == Route::Unknown {
        return Err(AppError::fetch_failed(href, "no route matches this location"));
    }

    let contacts = store
        .list_contacts(location.q())
        .map_err(|err| AppError::fetch_failed(&href, format!("{:#}", err)))?;

    let detail = match route.contact_id() {
        Some(id) => {
            let contact = store
                .get_contact(id)
                .map_err(|err| AppError::fetch_failed(&href, format!("{:#}", err)))?
                .ok_or_else(|| AppError::fetch_failed(&href, format!("no contact with id {}", id)))?;
            Some(contact)
        }
        None => None,
    };

    Ok(RouteData {
        location: location.clone(),
        contacts,
        detail,
    })
}

/// How a loader result was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Committed,
    /// The newest navigation failed; state is unchanged apart from the error.
    Failed,
    /// Superseded by a newer navigation; dropped without a trace on screen.
    Discarded,
}

/// Mutations offered by the detail pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactAction {
    Save { id: String, draft: ContactDraft },
    ToggleFavorite { id: String },
    Delete { id: String },
}

#[derive(Debug)]
pub struct Session {
    navigator: Navigator,
    query: QueryController,
    contacts: Vec<Contact>,
    detail: Option<Contact>,
    error: Option<AppError>,
    discarded: u64,
}

impl Session {
    /// Mount with already-loaded data for the initial location.
    pub fn new(initial: RouteData) -> Self {
        let query = QueryController::new(initial.location.q().map(str::to_string));
        Self {
            navigator: Navigator::new(initial.location),
            query,
            contacts: initial.contacts,
            detail: initial.detail,
            error: None,
            discarded: 0,
        }
    }

    pub fn query(&self) -> &QueryController {
        &self.query
    }

    pub fn location(&self) -> &Location {
        self.navigator.location()
    }

    pub fn route(&self) -> Route {
        self.navigator.location().route()
    }

    pub fn history(&self) -> &History {
        self.navigator.history()
    }

    pub fn pending(&self) -> Option<&Location> {
        self.navigator.pending()
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn detail(&self) -> Option<&Contact> {
        self.detail.as_ref()
    }

    pub fn error(&self) -> Option<&AppError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Number of loader results dropped as stale so far.
    pub fn discarded_count(&self) -> u64 {
        self.discarded
    }

    pub fn status(&self) -> NavigationStatus {
        self.navigator.status()
    }

    pub fn list(&self) -> ListMarkup {
        listing::render(&self.contacts, |href| self.navigator.link_state(href))
    }

    pub fn on_filter_changed(&mut self, raw: &str) -> NavigationTicket {
        let submission = self.query.on_filter_changed(raw);
        self.navigator.navigate(submission.location, submission.mode)
    }

    pub fn navigate(&mut self, location: Location) -> NavigationTicket {
        self.navigator.navigate(location, NavigationMode::Push)
    }

    pub fn follow_link(&mut self, href: &str) -> Result<NavigationTicket, url::ParseError> {
        let location = Location::parse(href)?;
        Ok(self.navigate(location))
    }

    pub fn back(&mut self) -> Option<NavigationTicket> {
        self.navigator.back()
    }

    pub fn forward(&mut self) -> Option<NavigationTicket> {
        self.navigator.forward()
    }

    /// Reload the committed location in place.
    pub fn revalidate(&mut self) -> NavigationTicket {
        let location = self.navigator.location().clone();
        self.navigator.navigate(location, NavigationMode::Replace)
    }

    pub fn create_contact(
        &mut self,
        store: &dyn ContactStore,
    ) -> Result<NavigationTicket, AppError> {
        creation::create_and_edit_new_contact(store, &mut self.navigator)
            .inspect_err(|err| self.error = Some(err.clone()))
    }

    /// Leave the edit form: back if there is somewhere to go back to,
    /// otherwise to the contact's detail view.
    pub fn cancel_edit(&mut self) -> Option<NavigationTicket> {
        if self.navigator.history().can_go_back() {
            return self.back();
        }
        match self.route() {
            Route::EditContact(id) => Some(self.navigate(Location::contact(&id))),
            _ => None,
        }
    }

    pub fn perform(
        &mut self,
        store: &dyn ContactStore,
        action: ContactAction,
    ) -> Result<NavigationTicket, AppError> {
        let outcome = match &action {
            ContactAction::Save { id, draft } => store
                .update_contact(id, draft)
                .map(|contact| Location::contact(&contact.id)),
            ContactAction::ToggleFavorite { id } => {
                let favorite = self
                    .detail
                    .as_ref()
                    .filter(|contact| &contact.id == id)
                    .map(|contact| contact.favorite)
                    .unwrap_or(false);
                store.set_favorite(id, !favorite).map(|()| self.location().clone())
            }
            ContactAction::Delete { id } => store.delete_contact(id).map(|()| Location::root()),
        };

        match outcome {
            Ok(target) => {
                debug!(?action, target = %target, "contact action done");
                let mode = match action {
                    ContactAction::ToggleFavorite { .. } => NavigationMode::Replace,
                    _ => NavigationMode::Push,
                };
                Ok(self.navigator.navigate(target, mode))
            }
            Err(err) => {
                warn!(?action, error = %format!("{:#}", err), "contact action failed");
                let err = AppError::store_unavailable(&err);
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Apply a loader result. Only the newest navigation may land.
    pub fn resolve(&mut self, seq: u64, outcome: Result<RouteData, AppError>) -> Resolution {
        match outcome {
            Ok(data) => match self.navigator.commit(seq) {
                Ok(location) => {
                    let q = location.q().map(str::to_string);
                    self.contacts = data.contacts;
                    self.detail = data.detail;
                    self.error = None;
                    if self.query.sync_external(q.as_deref()) {
                        debug!(q = ?q, "search input resynced");
                    }
                    Resolution::Committed
                }
                Err(stale) => self.discard(stale.seq, stale.latest),
            },
            Err(err) => match self.navigator.abandon(seq) {
                Ok(target) => {
                    warn!(target = %target, error = %err, "navigation failed");
                    if self.query.revert_display() {
                        debug!(q = ?self.query.query(), "search input reverted");
                    }
                    self.error = Some(err);
                    Resolution::Failed
                }
                Err(stale) => self.discard(stale.seq, stale.latest),
            },
        }
    }

    fn discard(&mut self, seq: u64, latest: u64) -> Resolution {
        self.discarded += 1;
        debug!(seq, latest, total = self.discarded, "stale navigation discarded");
        Resolution::Discarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::EntryLabel;
    use crate::navigation::LinkState;
    use crate::testing::{person, FakeStore};
    use pretty_assertions::assert_eq;

    fn store() -> FakeStore {
        FakeStore::with_contacts(vec![
            person("1", "Alice", "Arnold"),
            person("2", "Alina", "Baker"),
            person("3", "Bob", "Cole"),
            person("4", "Alan", "Dunn"),
        ])
    }

    fn mount(store: &FakeStore, location: Location) -> Session {
        Session::new(load_route(store, &location).unwrap())
    }

    fn land(session: &mut Session, store: &FakeStore, ticket: &NavigationTicket) -> Resolution {
        let outcome = load_route(store, &ticket.location);
        session.resolve(ticket.seq, outcome)
    }

    fn ids(session: &Session) -> Vec<String> {
        session.contacts().iter().map(|c| c.id.clone()).collect()
    }

    #[test]
    fn last_submitted_query_wins_in_any_completion_order() {
        let store = store();
        let orders = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];

        for order in orders {
            let mut session = mount(&store, Location::root());
            let tickets = [
                session.on_filter_changed("a"),
                session.on_filter_changed("al"),
                session.on_filter_changed("ali"),
            ];
            // load everything up front, as overlapping fetches would
            let outcomes: Vec<_> = tickets
                .iter()
                .map(|t| load_route(&store, &t.location))
                .collect();

            for index in order {
                session.resolve(tickets[index].seq, outcomes[index].clone());
            }

            assert_eq!(ids(&session), vec!["1", "2"], "order {:?}", order);
            assert_eq!(session.query().query(), Some("ali"));
            assert_eq!(session.query().display_value(), "ali");
            assert_eq!(session.discarded_count(), 2);
            assert_eq!(session.status(), NavigationStatus::Idle);
        }
    }

    #[test]
    fn first_search_pushes_later_ones_replace() {
        let store = store();
        let mut session = mount(&store, Location::root());
        assert_eq!(session.history().len(), 1);

        let ticket = session.on_filter_changed("al");
        land(&mut session, &store, &ticket);
        assert_eq!(session.history().len(), 2);

        let ticket = session.on_filter_changed("ali");
        land(&mut session, &store, &ticket);
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.location().q(), Some("ali"));
        assert_eq!(session.history().get(0), Some(&Location::root()));
    }

    #[test]
    fn detail_navigation_is_not_a_search() {
        let store = store();
        let mut session = mount(&store, Location::search("al"));

        session.navigate(Location::contact("42"));
        assert!(!session.status().searching());
        assert!(session.status().loading_detail_pane());

        session.on_filter_changed("b");
        assert!(session.status().searching());
        assert!(!session.status().loading_detail_pane());
    }

    #[test]
    fn stale_response_does_not_clobber_typing() {
        let store = store();
        let mut session = mount(&store, Location::search("a"));
        let slow = session.on_filter_changed("al");
        session.on_filter_changed("ali");
        let _ = session.on_filter_changed("alic");

        assert_eq!(land(&mut session, &store, &slow), Resolution::Discarded);
        assert_eq!(session.query().display_value(), "alic");
        assert_eq!(session.query().query(), Some("a"));
    }

    #[test]
    fn back_navigation_resyncs_search_input() {
        let store = store();
        let mut session = mount(&store, Location::root());
        let ticket = session.on_filter_changed("bob");
        land(&mut session, &store, &ticket);
        assert_eq!(ids(&session), vec!["3"]);

        let back = session.back().unwrap();
        assert!(!session.status().searching());
        land(&mut session, &store, &back);

        assert_eq!(session.query().display_value(), "");
        assert_eq!(session.query().query(), None);
        assert_eq!(ids(&session).len(), 4);

        // the next search is a first search again
        let ticket = session.on_filter_changed("x");
        land(&mut session, &store, &ticket);
        assert_eq!(session.history().index(), 1);
        assert!(session.list().is_empty_marker());
    }

    #[test]
    fn failed_fetch_keeps_last_good_list_and_recovers() {
        let store = store();
        let mut session = mount(&store, Location::root());

        store.fail_list.set(true);
        let ticket = session.on_filter_changed("al");
        assert_eq!(land(&mut session, &store, &ticket), Resolution::Failed);

        assert_eq!(ids(&session).len(), 4);
        assert!(matches!(session.error(), Some(AppError::FetchFailed { .. })));
        assert_eq!(session.location(), &Location::root());
        assert_eq!(session.status(), NavigationStatus::Idle);
        assert_eq!(session.query().display_value(), "");

        store.fail_list.set(false);
        let ticket = session.on_filter_changed("ali");
        assert_eq!(land(&mut session, &store, &ticket), Resolution::Committed);
        assert_eq!(ids(&session), vec!["1", "2"]);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn reload_after_failed_search_shows_committed_q() {
        let store = store();
        let mut session = mount(&store, Location::search("al"));

        store.fail_list.set(true);
        let ticket = session.on_filter_changed("alx");
        assert_eq!(land(&mut session, &store, &ticket), Resolution::Failed);
        assert_eq!(session.query().display_value(), "al");

        store.fail_list.set(false);
        let ticket = session.revalidate();
        assert_eq!(land(&mut session, &store, &ticket), Resolution::Committed);
        assert_eq!(session.pending(), None);
        assert_eq!(session.query().query(), Some("al"));
        assert_eq!(session.query().display_value(), "al");
    }

    #[test]
    fn stale_failure_after_commit_is_discarded() {
        let store = store();
        let mut session = mount(&store, Location::root());
        let old = session.on_filter_changed("a");
        let new = session.on_filter_changed("bo");
        assert_eq!(land(&mut session, &store, &new), Resolution::Committed);

        let outcome = Err(AppError::fetch_failed(old.location.href(), "connection reset"));
        assert_eq!(session.resolve(old.seq, outcome), Resolution::Discarded);

        assert_eq!(session.error(), None);
        assert_eq!(session.query().query(), Some("bo"));
        assert_eq!(session.query().display_value(), "bo");
        assert_eq!(session.discarded_count(), 1);
        assert_eq!(ids(&session), vec!["3"]);
    }

    #[test]
    fn stale_failure_while_newer_pending_is_discarded() {
        let store = store();
        let mut session = mount(&store, Location::root());
        let old = session.on_filter_changed("a");
        let new = session.on_filter_changed("bo");

        let outcome = Err(AppError::fetch_failed(old.location.href(), "connection reset"));
        assert_eq!(session.resolve(old.seq, outcome), Resolution::Discarded);

        assert_eq!(session.error(), None);
        assert_eq!(session.pending(), Some(&new.location));
        assert!(session.status().searching());
        assert_eq!(session.query().display_value(), "bo");
        assert_eq!(session.discarded_count(), 1);
        assert_eq!(ids(&session).len(), 4);

        assert_eq!(land(&mut session, &store, &new), Resolution::Committed);
        assert_eq!(session.query().query(), Some("bo"));
    }

    #[test]
    fn unknown_contact_is_a_fetch_failure() {
        let store = store();
        let mut session = mount(&store, Location::root());
        let ticket = session.navigate(Location::contact("nope"));
        assert_eq!(land(&mut session, &store, &ticket), Resolution::Failed);
        assert_eq!(session.route(), Route::Index);
    }

    #[test]
    fn failed_creation_leaves_state_alone() {
        let store = store();
        let mut session = mount(&store, Location::contact("3"));
        store.fail_create.set(true);

        let before = (session.contacts().to_vec(), session.detail().cloned());
        let err = session.create_contact(&store).unwrap_err();

        assert!(matches!(err, AppError::StoreUnavailable(_)));
        assert_eq!(session.pending(), None);
        assert_eq!(session.location(), &Location::contact("3"));
        assert_eq!((session.contacts().to_vec(), session.detail().cloned()), before);
        assert_eq!(session.error(), Some(&err));
    }

    #[test]
    fn created_contact_shows_up_after_redirect_lands() {
        let store = store();
        *store.next_id.borrow_mut() = Some("99".into());
        let mut session = mount(&store, Location::root());

        let ticket = session.create_contact(&store).unwrap();
        assert_eq!(session.contacts().len(), 4);
        land(&mut session, &store, &ticket);

        assert_eq!(session.route(), Route::EditContact("99".into()));
        assert_eq!(session.detail().map(|c| c.id.as_str()), Some("99"));
        let entries = session.list();
        let created = entries.entries().iter().find(|e| e.key == "99").unwrap();
        assert_eq!(created.label, EntryLabel::NoName);
    }

    #[test]
    fn save_toggle_and_delete() {
        let store = store();
        let mut session = mount(&store, Location::edit_contact("3"));

        let draft = ContactDraft {
            first: "Robert".into(),
            last: "Cole".into(),
            ..ContactDraft::default()
        };
        let ticket = session
            .perform(&store, ContactAction::Save { id: "3".into(), draft })
            .unwrap();
        land(&mut session, &store, &ticket);
        assert_eq!(session.route(), Route::Contact("3".into()));
        assert_eq!(session.detail().unwrap().first.as_deref(), Some("Robert"));

        let len = session.history().len();
        let ticket = session
            .perform(&store, ContactAction::ToggleFavorite { id: "3".into() })
            .unwrap();
        land(&mut session, &store, &ticket);
        assert!(session.detail().unwrap().favorite);
        assert_eq!(session.history().len(), len);

        let ticket = session
            .perform(&store, ContactAction::Delete { id: "3".into() })
            .unwrap();
        land(&mut session, &store, &ticket);
        assert_eq!(session.route(), Route::Index);
        assert_eq!(session.detail(), None);
        assert!(!ids(&session).contains(&"3".to_string()));

        let err = session
            .perform(&store, ContactAction::Delete { id: "3".into() })
            .unwrap_err();
        assert!(matches!(err, AppError::StoreUnavailable(_)));
    }

    #[test]
    fn list_marks_active_and_pending_links() {
        let store = store();
        let mut session = mount(&store, Location::contact("1"));
        session.follow_link("contacts/2").unwrap();

        let list = session.list();
        let links: Vec<_> = list.entries().iter().map(|e| (e.key.as_str(), e.link)).collect();
        assert_eq!(
            links,
            vec![
                ("1", LinkState::Active),
                ("2", LinkState::Pending),
                ("3", LinkState::Idle),
                ("4", LinkState::Idle),
            ]
        );
    }

    #[test]
    fn cancel_edit_goes_back_or_to_detail() {
        let store = store();
        let mut session = mount(&store, Location::edit_contact("2"));
        let ticket = session.cancel_edit().unwrap();
        assert_eq!(ticket.location, Location::contact("2"));

        land(&mut session, &store, &ticket);
        let ticket = session.navigate(Location::edit_contact("2"));
        land(&mut session, &store, &ticket);
        let back = session.cancel_edit().unwrap();
        assert_eq!(back.location, Location::contact("2"));
        land(&mut session, &store, &back);
        assert_eq!(session.history().index(), 1);
    }
}
