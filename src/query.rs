use crate::location::Location;
use crate::navigation::NavigationMode;

/// A search-box change turned into a navigation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSubmission {
    pub location: Location,
    pub mode: NavigationMode,
}

/// Owns the search filter.
///
/// `external` is the `q` of the committed location (what the last
/// successful load was for). `display` is what the search box shows. Typing
/// moves `display` ahead of `external`; whenever `external` changes,
/// `display` snaps back to it.
#[derive(Debug, Clone, Default)]
pub struct QueryController {
    external: Option<String>,
    display: String,
}

impl QueryController {
    pub fn new(external: Option<String>) -> Self {
        let display = external.clone().unwrap_or_default();
        Self { external, display }
    }

    /// The authoritative filter.
    pub fn query(&self) -> Option<&str> {
        self.external.as_deref()
    }

    pub fn display_value(&self) -> &str {
        &self.display
    }

    /// Called on every change to the search box.
    ///
    /// The first search of a session (no `q` on the committed location)
    /// pushes a history entry; later ones replace it. An explicitly empty
    /// `q` counts as a search already made.
    pub fn on_filter_changed(&mut self, raw: &str) -> SearchSubmission {
        self.display = raw.to_string();
        let mode = if self.external.is_none() {
            NavigationMode::Push
        } else {
            NavigationMode::Replace
        };
        SearchSubmission {
            location: Location::search(raw),
            mode,
        }
    }

    /// Drop typed text that never landed, putting the committed `q` back in
    /// the box. Returns true when the display value changed.
    pub fn revert_display(&mut self) -> bool {
        let committed = self.query().unwrap_or_default();
        if self.display == committed {
            return false;
        }
        self.display = committed.to_string();
        true
    }

    /// Adopt the `q` of a newly committed location. Returns true when the
    /// display value was reset.
    pub fn sync_external(&mut self, q: Option<&str>) -> bool {
        if self.external.as_deref() == q {
            return false;
        }
        self.external = q.map(str::to_string);
        self.display = self.external.clone().unwrap_or_default();
        true
    }
}
