//! The final report of a run.

use std::fmt;

use serde::Serialize;

use super::harvester::CrawlState;
use crate::compile::CompileSummary;

const FEED_OK: &str = "All feed pages were processed.";
const ELEMENTS_OK: &str = "All elements were processed.";

/// Outcome of one run.
///
/// `success` is false only when a feed page failed; missing and
/// incompatible elements are partial failures that leave it true.
#[derive(Debug, Clone, Serialize)]
pub struct HarvestReport {
    pub success: bool,
    pub feed_status: String,
    pub element_status: String,
    /// Element locations that could not be fetched.
    pub missing: Vec<String>,
    /// Element locations that were fetched but could not be read.
    pub incompatible: Vec<String>,
    pub pages: usize,
    pub elements_written: usize,
    pub final_state: CrawlState,
    #[serde(skip)]
    pub compiled: Vec<CompileSummary>,
}

impl fmt::Display for HarvestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.success { "succeeded" } else { "failed" };
        writeln!(
            f,
            "Harvest {outcome}: {} {}, {} {} written.",
            self.pages,
            plural(self.pages, "page", "pages"),
            self.elements_written,
            plural(self.elements_written, "element", "elements"),
        )?;
        writeln!(f, "{}", self.feed_status)?;
        write!(f, "{}", self.element_status)?;
        for (title, list) in [
            ("Missing elements", &self.missing),
            ("Incompatible elements", &self.incompatible),
        ] {
            if !list.is_empty() {
                write!(f, "\n{title}:")?;
                for location in list {
                    write!(f, "\n  {location}")?;
                }
            }
        }
        Ok(())
    }
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 { one } else { many }
}

/// Bookkeeping of a run in progress.
#[derive(Debug, Default)]
pub(crate) struct RunTally {
    pub missing: Vec<String>,
    pub incompatible: Vec<String>,
    pub pages: usize,
    pub elements_written: usize,
    /// Sentence describing the fatal feed failure.
    pub feed_failure: Option<String>,
    /// Set when the pagination ceiling stopped the run.
    pub pagination_limit: Option<usize>,
}

impl RunTally {
    pub fn into_report(self, final_state: CrawlState, compiled: Vec<CompileSummary>) -> HarvestReport {
        let feed_status = match (&self.feed_failure, self.pagination_limit) {
            (Some(failure), _) => failure.clone(),
            (None, Some(limit)) => format!(
                "Stopped after {limit} {}: the pagination limit was reached.",
                plural(limit, "page", "pages")
            ),
            (None, None) => FEED_OK.to_string(),
        };

        let mut problems = Vec::new();
        if !self.missing.is_empty() {
            problems.push(format!(
                "{} {} could not be fetched",
                self.missing.len(),
                plural(self.missing.len(), "element", "elements")
            ));
        }
        if !self.incompatible.is_empty() {
            problems.push(format!(
                "{} {} could not be read",
                self.incompatible.len(),
                plural(self.incompatible.len(), "element", "elements")
            ));
        }
        let element_status = if problems.is_empty() {
            ELEMENTS_OK.to_string()
        } else {
            format!("{}.", problems.join(" and "))
        };

        HarvestReport {
            success: self.feed_failure.is_none(),
            feed_status,
            element_status,
            missing: self.missing,
            incompatible: self.incompatible,
            pages: self.pages,
            elements_written: self.elements_written,
            final_state,
            compiled,
        }
    }
}
