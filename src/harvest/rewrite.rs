//! Element-URI rewrites.
//!
//! Applied to every element URI of a feed page before it is fetched, always
//! in the same order: keep-only filter, then replace, then append.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementRewrite {
    /// Keep only URIs containing this substring.
    pub filter: Option<String>,
    /// Replace every occurrence of the first string with the second.
    pub replace: Option<(String, String)>,
    /// Suffix appended to every URI.
    pub append: Option<String>,
}

impl ElementRewrite {
    /// Whether no rewrite is configured.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.filter.is_none() && self.replace.is_none() && self.append.is_none()
    }

    /// Rewrites one URI, or drops it when the filter does not match.
    #[must_use]
    pub fn apply(&self, uri: &str) -> Option<String> {
        if let Some(filter) = &self.filter {
            if !uri.contains(filter.as_str()) {
                return None;
            }
        }
        let mut location = match &self.replace {
            Some((from, to)) if !from.is_empty() => uri.replace(from.as_str(), to),
            _ => uri.to_string(),
        };
        if let Some(suffix) = &self.append {
            location.push_str(suffix);
        }
        Some(location)
    }
}
