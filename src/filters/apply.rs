use chrono::{DateTime, Utc};

use super::ast::{FilterSpec, TextMatch};

impl TextMatch {
    /// A match in either the URL or the title qualifies
    pub fn matches(&self, url: &str, title: &str) -> bool {
        match self {
            TextMatch::Substring(needle) => {
                url.to_lowercase().contains(needle.as_str()) || title.to_lowercase().contains(needle.as_str())
            }
            TextMatch::Pattern(regex) => regex.is_match(url) || regex.is_match(title),
        }
    }
}

impl FilterSpec {
    /// `after`/`days_back` inclusive, `before` exclusive
    pub fn in_range(&self, visit_time: DateTime<Utc>) -> bool {
        if let Some(lower) = self.lower_bound()
            && visit_time < lower
        {
            return false;
        }
        if let Some(upper) = self.upper_bound()
            && visit_time >= upper
        {
            return false;
        }
        true
    }

    /// Whether a history row passes every active predicate
    pub fn accepts(&self, url: &str, title: &str, visit_time: DateTime<Utc>) -> bool {
        self.in_range(visit_time) && self.text.as_ref().is_none_or(|text| text.matches(url, title))
    }
}
