//! In-app locations: a path plus the single recognized query key `q`.
//!
//! Locations are written and parsed like URLs relative to the app root, so
//! `contacts/42`, `/contacts/42` and `/?q=al` all resolve the way a browser
//! would resolve them from `/`.

use std::fmt;

use url::{form_urlencoded, Url};

const BASE: &str = "rolo://app/";
const QUERY_KEY: &str = "q";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    path: String,
    q: Option<String>,
}

/// What a location's path points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Index,
    Contact(String),
    EditContact(String),
    Unknown,
}

impl Location {
    pub fn new(path: impl Into<String>, q: Option<String>) -> Self {
        let mut path = path.into();
        if !path.starts_with('/') {
            path.insert(0, '/');
        }
        Self { path, q }
    }

    pub fn root() -> Self {
        Self::new("/", None)
    }

    /// The location a search form submits to. An empty `q` is still a
    /// present key (`/?q=`), distinct from no key at all.
    pub fn search(q: &str) -> Self {
        Self::new("/", Some(q.to_string()))
    }

    pub fn contact(id: &str) -> Self {
        Self::new(format!("/contacts/{}", id), None)
    }

    pub fn edit_contact(id: &str) -> Self {
        Self::new(format!("/contacts/{}/edit", id), None)
    }

    pub fn parse(href: &str) -> Result<Self, url::ParseError> {
        let base = Url::parse(BASE)?;
        let url = base.join(href.trim())?;
        let q = url
            .query_pairs()
            .find(|(key, _)| key == QUERY_KEY)
            .map(|(_, value)| value.into_owned());
        Ok(Self::new(url.path().to_string(), q))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }

    /// True when the query string carries `q` at all, empty value included.
    pub fn has_query(&self) -> bool {
        self.q.is_some()
    }

    pub fn href(&self) -> String {
        match &self.q {
            Some(q) => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .append_pair(QUERY_KEY, q)
                    .finish();
                format!("{}?{}", self.path, query)
            }
            None => self.path.clone(),
        }
    }

    /// Whether this location's path is `path` itself or nested below it.
    pub fn is_within(&self, path: &str) -> bool {
        let path = path.trim_matches('/');
        let own = self.path.trim_matches('/');
        if path.is_empty() {
            return own.is_empty();
        }
        own == path || own.starts_with(&format!("{}/", path))
    }

    pub fn route(&self) -> Route {
        Route::from_path(&self.path)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.href())
    }
}

impl Route {
    pub fn from_path(path: &str) -> Self {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Index,
            ["contacts", id] => Route::Contact((*id).to_string()),
            ["contacts", id, "edit"] => Route::EditContact((*id).to_string()),
            _ => Route::Unknown,
        }
    }

    pub fn contact_id(&self) -> Option<&str> {
        match self {
            Route::Contact(id) | Route::EditContact(id) => Some(id),
            Route::Index | Route::Unknown => None,
        }
    }
}
