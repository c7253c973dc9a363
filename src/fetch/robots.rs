//! Politeness delay from robots.txt.
//!
//! Reads the `Request-rate` and `Crawl-delay` extensions for our product
//! token (falling back to the `*` group). Any failure along the way yields
//! the default delay; robots.txt problems never stop a run.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, instrument};

use super::client::is_remote;
use super::constants::DEFAULT_POLITENESS_DELAY;
use crate::user_agent::ROBOTS_TOKEN;

/// Rules read from one `User-agent` group.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct GroupRules {
    request_rate: Option<Duration>,
    crawl_delay: Option<Duration>,
}

impl GroupRules {
    fn delay(self) -> Option<Duration> {
        self.request_rate.or(self.crawl_delay)
    }
}

/// Determines the delay between requests for a run starting at `location`.
///
/// Priority: `Request-rate` (period divided by count), then `Crawl-delay`,
/// then 500 ms. Local locations always get the default.
#[instrument(skip(client))]
pub async fn resolve_politeness_delay(client: &Client, location: &str) -> Duration {
    if !is_remote(location) {
        return DEFAULT_POLITENESS_DELAY;
    }
    let Some(origin) = origin_for_robots(location) else {
        return DEFAULT_POLITENESS_DELAY;
    };
    let delay = match fetch_robots_txt(&origin, client).await {
        Some(body) => politeness_delay(&body, ROBOTS_TOKEN),
        None => None,
    };
    let delay = delay.unwrap_or(DEFAULT_POLITENESS_DELAY);
    debug!(origin = %origin, delay_ms = delay.as_millis(), "resolved politeness delay");
    delay
}

/// Builds the origin string (scheme + host + port) from a URL.
#[must_use]
pub fn origin_for_robots(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let scheme = parsed.scheme();
    let host = parsed.host_str()?;
    let origin = match parsed.port() {
        Some(port) => format!("{scheme}://{host}:{port}"),
        None => format!("{scheme}://{host}"),
    };
    Some(origin)
}

/// Body of `<origin>/robots.txt`; a 404 counts as empty, other failures as
/// absent.
async fn fetch_robots_txt(origin: &str, client: &Client) -> Option<String> {
    let robots_url = format!("{}/robots.txt", origin.trim_end_matches('/'));
    let response = match client.get(&robots_url).send().await {
        Ok(response) => response,
        Err(error) => {
            debug!(%error, url = %robots_url, "robots.txt unreachable");
            return None;
        }
    };
    let status = response.status();
    if status.as_u16() == 404 {
        return Some(String::new());
    }
    if !status.is_success() {
        debug!(status = status.as_u16(), url = %robots_url, "robots.txt not available");
        return None;
    }
    response.text().await.ok()
}

/// Delay requested for `token`, or for `*` when no group names the token.
fn politeness_delay(body: &str, token: &str) -> Option<Duration> {
    let token = token.to_ascii_lowercase();
    let mut ours = None;
    let mut star = None;

    // Consecutive User-agent lines share the rules that follow them.
    let mut agents: Vec<String> = Vec::new();
    let mut rules = GroupRules::default();
    let mut in_rules = false;

    let mut close_group = |agents: &[String], rules: GroupRules| {
        if agents.iter().any(|a| token.starts_with(a.as_str()) && a != "*") {
            ours.get_or_insert(rules);
        } else if agents.iter().any(|a| a == "*") {
            star.get_or_insert(rules);
        }
    };

    for line in body.lines() {
        let line = line.split('#').next().unwrap_or_default().trim();
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let field = field.trim().to_ascii_lowercase();
        let value = value.trim();
        match field.as_str() {
            "user-agent" => {
                if in_rules {
                    close_group(&agents, rules);
                    agents.clear();
                    rules = GroupRules::default();
                    in_rules = false;
                }
                agents.push(value.to_ascii_lowercase());
            }
            "request-rate" => {
                in_rules = true;
                rules.request_rate = rules.request_rate.or_else(|| parse_request_rate(value));
            }
            "crawl-delay" => {
                in_rules = true;
                rules.crawl_delay = rules.crawl_delay.or_else(|| parse_crawl_delay(value));
            }
            _ => in_rules = true,
        }
    }
    if !agents.is_empty() {
        close_group(&agents, rules);
    }

    ours.or(star).and_then(GroupRules::delay)
}

/// `n/period` with an optional `s`, `m` or `h` unit on the period.
fn parse_request_rate(value: &str) -> Option<Duration> {
    let value = value.split_whitespace().next()?;
    let (count, period) = value.split_once('/')?;
    let count: u32 = count.trim().parse().ok().filter(|n| *n > 0)?;
    let period = period.trim();
    let (number, unit_secs) = match period.char_indices().last()? {
        (i, 's') => (&period[..i], 1.0),
        (i, 'm') => (&period[..i], 60.0),
        (i, 'h') => (&period[..i], 3600.0),
        _ => (period, 1.0),
    };
    let number: f64 = number.trim().parse().ok()?;
    let seconds = number * unit_secs / f64::from(count);
    Duration::try_from_secs_f64(seconds).ok()
}

fn parse_crawl_delay(value: &str) -> Option<Duration> {
    let seconds: f64 = value.parse().ok()?;
    Duration::try_from_secs_f64(seconds).ok()
}
