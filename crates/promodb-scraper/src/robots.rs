//! Minimal `robots.txt` evaluation for the bot's own user agent.

use crate::fetch::PageFetcher;

/// Product token matched against `User-agent:` lines.
pub const BOT_AGENT: &str = "PromoDbBot";

#[derive(Debug, Default)]
struct Group {
    agents: Vec<String>,
    /// `(allow, path_prefix)` in file order.
    rules: Vec<(bool, String)>,
}

impl Group {
    fn applies_to(&self, agent: &str) -> bool {
        self.agents.iter().any(|a| a != "*" && agent.contains(a.as_str()))
    }

    fn is_default(&self) -> bool {
        self.agents.iter().any(|a| a == "*")
    }

    /// The longest matching prefix decides; `Allow` wins a tie. Empty
    /// rules match nothing.
    fn allows(&self, path: &str) -> bool {
        self.rules
            .iter()
            .filter(|(_, prefix)| !prefix.is_empty() && path.starts_with(prefix.as_str()))
            .max_by_key(|(allow, prefix)| (prefix.len(), *allow))
            .is_none_or(|(allow, _)| *allow)
    }
}

fn parse_groups(body: &str) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut current = Group::default();
    let mut in_rules = false;

    for raw in body.lines() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let field = field.trim().to_ascii_lowercase();
        let value = value.trim();

        match field.as_str() {
            "user-agent" => {
                if in_rules {
                    groups.push(std::mem::take(&mut current));
                    in_rules = false;
                }
                current.agents.push(value.to_ascii_lowercase());
            }
            "allow" | "disallow" => {
                if current.agents.is_empty() {
                    continue;
                }
                in_rules = true;
                current.rules.push((field == "allow", value.to_string()));
            }
            _ => {}
        }
    }

    if !current.agents.is_empty() {
        groups.push(current);
    }
    groups
}

/// Whether `body` permits `agent` to fetch `path`.
///
/// A group naming the agent takes precedence over the `*` group; within a
/// group the most specific (longest) matching rule wins.
#[must_use]
pub fn robots_txt_allows(body: &str, agent: &str, path: &str) -> bool {
    let agent = agent
        .split('/')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let groups = parse_groups(body);

    if let Some(group) = groups.iter().find(|g| g.applies_to(&agent)) {
        return group.allows(path);
    }
    groups
        .iter()
        .find(|g| g.is_default())
        .is_none_or(|g| g.allows(path))
}

#[must_use]
pub fn robots_url(domain: &str) -> String {
    format!("https://{domain}/robots.txt")
}

/// Check `robots_url` on behalf of [`BOT_AGENT`] for the site root.
///
/// Fetch errors and `401`/`403` responses are treated as disallowed; any
/// other non-success status (such as a missing file) allows.
pub async fn robots_allowed<F: PageFetcher>(fetcher: &F, robots_url: &str) -> bool {
    match fetcher.fetch(robots_url).await {
        Ok(page) if page.is_success() => robots_txt_allows(&page.body, BOT_AGENT, "/"),
        Ok(page) if page.status == 401 || page.status == 403 => {
            tracing::info!(url = robots_url, status = page.status, "robots.txt access denied");
            false
        }
        Ok(_) => true,
        Err(e) => {
            tracing::warn!(url = robots_url, error = %e, "robots.txt fetch failed");
            false
        }
    }
}
