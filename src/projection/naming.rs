use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::CodegenConfig;

static SEGMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z][^A-Z]*|[^A-Z]+").unwrap());

pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Keeps the first one or two characters of every capitalized segment:
/// `ThisIsATest` → `ThIsATe`.
pub fn shorten(name: &str) -> String {
    SEGMENT_RE
        .find_iter(name)
        .map(|segment| segment.as_str().chars().take(2).collect::<String>())
        .collect()
}

#[derive(Debug, Clone)]
pub struct NamingPolicy {
    shorten_long_names: bool,
    max_prefix_length: usize,
}

impl NamingPolicy {
    pub fn new(shorten_long_names: bool, max_prefix_length: usize) -> Self {
        Self { shorten_long_names, max_prefix_length }
    }

    pub fn from_config(config: &CodegenConfig) -> Self {
        Self::new(config.shorten_long_names, config.max_prefix_length)
    }

    pub fn root_prefix(&self, field_name: &str) -> String {
        capitalize(field_name)
    }

    pub fn root_name(&self, prefix: &str) -> String {
        format!("{prefix}ProjectionRoot")
    }

    pub fn node_name(&self, prefix: &str, type_name: &str) -> String {
        format!("{prefix}{type_name}Projection")
    }

    /// Prefix for the node reached through `field_name`.
    pub fn field_prefix(&self, prefix: &str, field_name: &str) -> String {
        self.fit(format!("{prefix}{}", capitalize(field_name)))
    }

    /// Prefix for the children of a fragment narrowing to `type_name`.
    pub fn fragment_prefix(&self, prefix: &str, type_name: &str) -> String {
        self.fit(format!("{prefix}{type_name}"))
    }

    fn fit(&self, prefix: String) -> String {
        if self.shorten_long_names && prefix.len() > self.max_prefix_length {
            shorten(&prefix)
        } else {
            prefix
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("ThisIsATest", "ThIsATe")]
    #[test_case("PersonsFriendsFriends", "PeFrFr")]
    #[test_case("A", "A")]
    #[test_case("already", "al")]
    #[test_case("XMLHttp", "XMLHt")]
    fn shorten_cases(input: &str, expected: &str) {
        assert_eq!(shorten(input), expected);
    }

    #[test]
    fn capitalize_first_char_only() {
        assert_eq!(capitalize("friends"), "Friends");
        assert_eq!(capitalize("iD"), "ID");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn long_prefixes_shorten_only_when_enabled() {
        let long = "VeryLongPrefixThatKeepsGoingAndGoing";
        let off = NamingPolicy::new(false, 10);
        assert_eq!(off.field_prefix(long, "friends"), format!("{long}Friends"));
        let on = NamingPolicy::new(true, 10);
        assert_eq!(on.field_prefix(long, "friends"), "VeLoPrThKeGoAnGoFr");
        assert_eq!(on.field_prefix("Short", "x"), "ShortX");
    }
}
