//! Comma separated name lists as typed by users or joined from selected records.

/// A parsed name list. Blank entries are kept so that the list always has one
/// element more than the input has commas, but they never count as names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NameList(Vec<String>);

impl NameList {
    #[must_use]
    pub fn parse(input: &str) -> Self {
        Self(input.split(',').map(|name| name.trim().to_owned()).collect())
    }

    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of entries that actually name someone or something.
    #[must_use]
    pub fn count(&self) -> usize {
        self.names().count()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str).filter(|name| !name.is_empty())
    }
}

/// Joins names resolved from selected records into the field format the
/// backend expects.
pub fn join<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names.into_iter().collect::<Vec<_>>().join(", ")
}
