use regex::Regex;

/// Natural keys for section paths without one configured default to this.
const DEFAULT_NATURAL_KEY: &str = "name";

/// Diff policy, consulted whenever a natural-key, deletion, creation or
/// ordering decision has to be made for a section path.
///
/// All lookups are pure functions of the path, matched against glob-style
/// patterns (`*` and `?` wildcards). The defaults encode known router
/// quirks: physical ethernet interfaces can be renamed but never created
/// or deleted, and firewall chains are order-sensitive.
///
/// ```
/// use ros_diff::Policy;
///
/// let policy = Policy::default();
/// assert_eq!(policy.natural_key("/ip address"), "address");
/// assert!(!policy.deletion_allowed("/interface ethernet"));
/// assert!(policy.order_important("/ip firewall nat"));
/// ```
#[derive(Debug, Clone)]
pub struct Policy {
    natural_keys: Vec<(Regex, String)>,
    no_deletions: Vec<Regex>,
    no_creations: Vec<Regex>,
    order_important: Vec<Regex>,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            natural_keys: compile_keys(&[
                ("/interface ethernet", "default-name"),
                ("/ip address", "address"),
                ("/ipv6 address", "address"),
                ("/routing ospf interface", "interface"),
                ("/routing ospf-v3 interface", "interface"),
                ("/routing ospf network", "network"),
                ("/routing ospf-v3 network", "network"),
                ("/mpls ldp interface", "interface"),
                ("/ip dhcp-server network", "address"),
            ]),
            no_deletions: compile_patterns(&[
                "/interface ethernet",
                "/interface wireless security-profiles",
            ]),
            no_creations: compile_patterns(&["/interface ethernet"]),
            order_important: compile_patterns(&[
                "/ip firewall calea",
                "/ip firewall filter",
                "/ip firewall mangle",
                "/ip firewall nat",
            ]),
        }
    }
}

impl Policy {
    /// A policy with no configured entries: every path uses the `name`
    /// natural key and allows everything.
    pub fn permissive() -> Self {
        Policy {
            natural_keys: Vec::new(),
            no_deletions: Vec::new(),
            no_creations: Vec::new(),
            order_important: Vec::new(),
        }
    }

    /// Replace the natural-key table.
    pub fn with_natural_keys(mut self, entries: &[(&str, &str)]) -> Self {
        self.natural_keys = compile_keys(entries);
        self
    }

    /// Replace the set of paths in which deletions are forbidden.
    pub fn with_no_deletions(mut self, patterns: &[&str]) -> Self {
        self.no_deletions = compile_patterns(patterns);
        self
    }

    /// Replace the set of paths in which creations are forbidden.
    pub fn with_no_creations(mut self, patterns: &[&str]) -> Self {
        self.no_creations = compile_patterns(patterns);
        self
    }

    /// Replace the set of paths in which expression order must be kept.
    pub fn with_order_important(mut self, patterns: &[&str]) -> Self {
        self.order_important = compile_patterns(patterns);
        self
    }

    /// The natural key for the given section path; `name` when unset.
    pub fn natural_key(&self, section_path: &str) -> &str {
        self.natural_keys
            .iter()
            .find(|(pattern, _)| pattern.is_match(section_path))
            .map(|(_, key)| key.as_str())
            .unwrap_or(DEFAULT_NATURAL_KEY)
    }

    pub fn deletion_allowed(&self, section_path: &str) -> bool {
        !self.no_deletions.iter().any(|p| p.is_match(section_path))
    }

    pub fn creation_allowed(&self, section_path: &str) -> bool {
        !self.no_creations.iter().any(|p| p.is_match(section_path))
    }

    pub fn order_important(&self, section_path: &str) -> bool {
        self.order_important.iter().any(|p| p.is_match(section_path))
    }
}

fn compile_keys(entries: &[(&str, &str)]) -> Vec<(Regex, String)> {
    entries
        .iter()
        .filter_map(|(pattern, key)| Some((glob_to_regex(pattern)?, key.to_string())))
        .collect()
}

fn compile_patterns(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().filter_map(|p| glob_to_regex(p)).collect()
}

/// Compile a glob pattern into an anchored regex. Escaping every literal
/// character keeps the result valid for any input.
fn glob_to_regex(pattern: &str) -> Option<Regex> {
    let mut src = String::with_capacity(pattern.len() + 8);
    src.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => src.push_str(".*"),
            '?' => src.push('.'),
            c => src.push_str(&regex::escape(&c.to_string())),
        }
    }
    src.push('$');
    Regex::new(&src).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_key_defaults() {
        let policy = Policy::default();
        assert_eq!(policy.natural_key("/interface ethernet"), "default-name");
        assert_eq!(policy.natural_key("/routing ospf instance"), "name");
    }

    #[test]
    fn test_gating_defaults() {
        let policy = Policy::default();
        assert!(!policy.creation_allowed("/interface ethernet"));
        assert!(!policy.deletion_allowed("/interface wireless security-profiles"));
        assert!(policy.deletion_allowed("/routing ospf instance"));
    }

    #[test]
    fn test_glob_wildcards() {
        let policy = Policy::permissive().with_order_important(&["/ip firewall*"]);
        assert!(policy.order_important("/ip firewall nat"));
        assert!(policy.order_important("/ip firewall filter"));
        assert!(!policy.order_important("/ip route"));
    }
}
