use crate::location::Location;

/// Session history: a stack of visited locations and a cursor into it.
///
/// Pushing drops any forward entries, like a browser does.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Location>,
    index: usize,
}

impl History {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
        }
    }

    pub fn current(&self) -> &Location {
        &self.entries[self.index]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn push(&mut self, location: Location) {
        self.entries.truncate(self.index + 1);
        self.entries.push(location);
        self.index = self.entries.len() - 1;
    }

    pub fn replace(&mut self, location: Location) {
        self.entries[self.index] = location;
    }

    /// Move the cursor to `index`. Returns false if it is out of range.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index < self.entries.len() {
            self.index = index;
            true
        } else {
            false
        }
    }

    pub fn get(&self, index: usize) -> Option<&Location> {
        self.entries.get(index)
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }
}
