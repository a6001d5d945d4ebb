use serde::{Deserialize, Serialize};

/// How blacklist patterns are compared against a source application name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Case-insensitive equality with the window class.
    #[default]
    Exact,
    /// Case-insensitive substring containment.
    Substring,
}

/// Decides whether a capture from a given application may be persisted.
#[derive(Debug, Clone)]
pub struct Blacklist {
    patterns: Vec<String>,
    rule: MatchRule,
}

impl Blacklist {
    pub fn new(patterns: &[String], rule: MatchRule) -> Self {
        Self {
            patterns: patterns.iter().map(|p| p.to_lowercase()).collect(),
            rule,
        }
    }

    /// True when the capture must be discarded. An unknown source app is
    /// never blocked.
    pub fn blocks(&self, source_app: Option<&str>) -> bool {
        let Some(app) = source_app else {
            return false;
        };
        let app = app.to_lowercase();
        self.patterns.iter().any(|p| match self.rule {
            MatchRule::Exact => app == *p,
            MatchRule::Substring => app.contains(p.as_str()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Vec<String> {
        vec!["KeePassXC".into(), "Bitwarden".into()]
    }

    #[test]
    fn exact_match_is_case_insensitive() {
        let bl = Blacklist::new(&patterns(), MatchRule::Exact);
        assert!(bl.blocks(Some("keepassxc")));
        assert!(bl.blocks(Some("KeePassXC")));
        assert!(!bl.blocks(Some("keepassxc-browser")));
    }

    #[test]
    fn substring_rule_catches_variants() {
        let bl = Blacklist::new(&patterns(), MatchRule::Substring);
        assert!(bl.blocks(Some("org.keepassxc.KeePassXC")));
        assert!(!bl.blocks(Some("firefox")));
    }

    #[test]
    fn unknown_source_is_allowed() {
        let bl = Blacklist::new(&patterns(), MatchRule::Exact);
        assert!(!bl.blocks(None));
    }
}
