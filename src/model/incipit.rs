//! Musical incipits in Plaine & Easie notation.

use oxrdf::Term;

use super::Canonical;
use super::label::Label;
use super::uri::Uri;

/// The opening notes of a musical work.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Incipit {
    pub uri: Uri,
    pub clef: Label,
    pub key_signature: Label,
    pub time_signature: Label,
    pub pattern: Label,
}

impl Incipit {
    #[must_use]
    pub fn new(uri: Uri, clef: &str, key_signature: &str, time_signature: &str, pattern: &str) -> Self {
        Self {
            uri,
            clef: Label::new(clef),
            key_signature: Label::new(key_signature),
            time_signature: Label::new(time_signature),
            pattern: Label::new(pattern),
        }
    }
}

impl Canonical for Incipit {
    fn has_content(&self) -> bool {
        self.uri.has_content()
            || self.clef.has_content()
            || self.key_signature.has_content()
            || self.time_signature.has_content()
            || self.pattern.has_content()
    }

    fn to_text(&self) -> String {
        [&self.clef, &self.key_signature, &self.time_signature, &self.pattern]
            .into_iter()
            .filter(|label| label.has_content())
            .map(Label::to_text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn to_terms(&self) -> Vec<Term> {
        if self.uri.has_content() {
            self.uri.to_terms()
        } else {
            self.pattern.to_terms()
        }
    }
}
