//! Gmail search queries, labels and keywords for the job-application tracker
//!
//! Exclusion entries are accumulated false positives from real mailboxes. They are
//! kept verbatim and extended by hand whenever a new one shows up.

/// Destination workbook (a directory name for the CSV store, a row id for PostgreSQL)
pub const SPREADSHEET_ID: &str = "1kehm_gWNazhhOz4TJIA3Ar1ClxMmEsv5jfinlVoe7Lg";

pub const CONFIRMATION_SHEET_NAME: &str = "Email Data";
pub const CONFIRMATION_LABEL_NAME: &str = "Applied";
pub const CONFIRMATION_PHRASES: &[&str] = &[
    "Thank you for applying",
    "received your application",
];

pub const ACTION_SHEET_NAME: &str = "Actionable Jobs";
pub const ACTION_LABEL_NAME: &str = "Action Required: Follow Up";

pub const INTERVIEW_TERMS: &[&str] = &[
    "interview",
    "assessment",
    "next steps",
    "we would like to proceed",
];

pub const SCHEDULING_TERMS: &[&str] = &[
    "schedule",
    "book time",
    "find a time",
    "availability",
    "calendy",
];

/// Trailing search window in months
pub const ACTION_WINDOW_MONTHS: u32 = 4;

pub const EXCLUDED_SUBJECTS: &[&str] = &[
    "Job Alert",
    "Here's today's action plan",
];

pub const EXCLUDED_SENDERS: &[&str] = &[
    "github.com",
    "redditmail.com",
    "medium.com",
    "likewise.com",
    "Planet Fitness",
];

pub const EXCLUDED_PHRASES: &[&str] = &[
    "Blaine Beebe",
    "Olivia Mendenall",
    "Longliveproductions",
    "StatonSamuels",
    "Tatlyn",
    "VBANWRKFOURNIER",
    "DARA-MICHELLE S GS-09 USAF AFMC 96 FSS/FSH",
    "models",
];

/// Body keywords, checked in this order; the first hit is the one reported
pub const ACTION_KEYWORDS: &[&str] = &[
    "interview",
    "assessment",
    "quiz",
    "test",
    "proceed",
    "offer letter",
    "background check",
    "e-signature",
    "next steps",
    "move forward",
    "schedule",
    "book time",
    "find a time",
    "availability",
    "calendy",
];

/// Negated term appended to a query
#[derive(Debug, Clone, PartialEq)]
pub enum Exclusion {
    Subject(String),
    From(String),
    Phrase(String),
}

impl Exclusion {
    fn render(&self) -> String {
        match self {
            Exclusion::Subject(s) => format!("-subject:{}", quote_term(s)),
            Exclusion::From(s) => format!("-from:{}", quote_term(s)),
            Exclusion::Phrase(s) => format!("-{}", quote_term(s)),
        }
    }
}

/// Builder for a Gmail boolean search query.
///
/// Groups are OR-ed internally and AND-ed together, then the time window and the
/// exclusions are appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    groups: Vec<Vec<String>>,
    newer_than_months: Option<u32>,
    exclusions: Vec<Exclusion>,
}

impl SearchQuery {
    pub fn any_of(terms: &[&str]) -> Self {
        SearchQuery::default().and_any_of(terms)
    }

    pub fn and_any_of(mut self, terms: &[&str]) -> Self {
        self.groups.push(terms.iter().map(|t| t.to_string()).collect());
        self
    }

    pub fn newer_than_months(mut self, months: u32) -> Self {
        self.newer_than_months = Some(months);
        self
    }

    pub fn excluding(mut self, exclusions: impl IntoIterator<Item = Exclusion>) -> Self {
        self.exclusions.extend(exclusions);
        self
    }

    pub fn render(&self) -> String {
        let bare = self.groups.len() == 1
            && self.newer_than_months.is_none()
            && self.exclusions.is_empty();

        let groups: Vec<String> = self
            .groups
            .iter()
            .filter(|g| !g.is_empty())
            .map(|g| {
                let joined = g.iter().map(|t| quote_term(t)).collect::<Vec<_>>().join(" OR ");
                if bare { joined } else { format!("({})", joined) }
            })
            .collect();

        let mut parts = Vec::new();
        if !groups.is_empty() {
            parts.push(groups.join(" AND "));
        }
        if let Some(months) = self.newer_than_months {
            parts.push(format!("newer_than:{}m", months));
        }
        parts.extend(self.exclusions.iter().map(Exclusion::render));

        parts.join(" ")
    }
}

/// Quote anything that is not a single bare word
fn quote_term(term: &str) -> String {
    let needs_quotes = term
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '"' | '(' | ')' | ':' | '\'' | '/'));

    if needs_quotes {
        format!("\"{}\"", term.replace('"', ""))
    } else {
        term.to_string()
    }
}

pub fn confirmation_query() -> SearchQuery {
    SearchQuery::any_of(CONFIRMATION_PHRASES)
}

pub fn action_query() -> SearchQuery {
    let exclusions = EXCLUDED_SUBJECTS
        .iter()
        .map(|s| Exclusion::Subject(s.to_string()))
        .chain(EXCLUDED_SENDERS.iter().map(|s| Exclusion::From(s.to_string())))
        .chain(EXCLUDED_PHRASES.iter().map(|s| Exclusion::Phrase(s.to_string())));

    SearchQuery::any_of(INTERVIEW_TERMS)
        .and_any_of(SCHEDULING_TERMS)
        .newer_than_months(ACTION_WINDOW_MONTHS)
        .excluding(exclusions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_query() {
        assert_eq!(
            confirmation_query().render(),
            r#""Thank you for applying" OR "received your application""#
        );
    }

    #[test]
    fn test_action_query_structure() {
        let query = action_query().render();

        assert!(query.starts_with(
            r#"(interview OR assessment OR "next steps" OR "we would like to proceed") AND (schedule OR "book time""#
        ));
        assert!(query.contains(" newer_than:4m "));
        assert!(query.contains(r#"-subject:"Job Alert""#));
        assert!(query.contains(r#"-subject:"Here's today's action plan""#));
        assert!(query.contains("-from:github.com"));
        assert!(query.contains(r#"-from:"Planet Fitness""#));
        assert!(query.contains(r#"-"DARA-MICHELLE S GS-09 USAF AFMC 96 FSS/FSH""#));
        assert!(query.ends_with(" -models"));
    }

    #[test]
    fn test_quote_term() {
        assert_eq!(quote_term("interview"), "interview");
        assert_eq!(quote_term("e-signature"), "e-signature");
        assert_eq!(quote_term("book time"), "\"book time\"");
    }

    #[test]
    fn test_keywords_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for keyword in ACTION_KEYWORDS {
            assert!(seen.insert(*keyword), "duplicate keyword {}", keyword);
        }
    }
}
