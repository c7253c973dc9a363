//! User-Agent string and robots.txt token for harvest traffic.
//!
//! Feed and robots.txt requests share one identity so site operators can
//! match log entries against their robots rules.

/// Project URL for User-Agent identification (RFC 9308 good citizenship).
const PROJECT_UA_URL: &str = "https://github.com/nicksrandall/harvester";

/// Product token matched against `User-agent:` groups in robots.txt.
pub const ROBOTS_TOKEN: &str = "harvester";

/// Default User-Agent for feed, element and robots.txt requests.
#[must_use]
pub fn harvest_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{ROBOTS_TOKEN}/{version} (metadata-harvester; +{PROJECT_UA_URL})")
}
