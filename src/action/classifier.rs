use log::debug;

/// Ordered keyword matcher over message bodies
///
/// The first keyword of the list found in the lowercased body wins, so the list
/// order decides which keyword is reported when several are present.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// First keyword (in list order) contained in `body`, ignoring case
    pub fn classify(&self, body: &str) -> Option<&str> {
        let body = body.to_lowercase();

        let found = self
            .keywords
            .iter()
            .find(|keyword| body.contains(keyword.as_str()))
            .map(String::as_str);

        debug!("Keyword scan over {} chars: {:?}", body.len(), found);
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_order_wins_over_body_order() {
        let classifier = KeywordClassifier::new(["interview", "schedule"]);
        assert_eq!(
            classifier.classify("We would like to schedule your interview"),
            Some("interview")
        );

        let reversed = KeywordClassifier::new(["schedule", "interview"]);
        assert_eq!(
            reversed.classify("We would like to schedule your interview"),
            Some("schedule")
        );
    }

    #[test]
    fn test_later_keyword_still_matches() {
        let classifier = KeywordClassifier::new(["interview", "assessment", "calendy"]);
        assert_eq!(classifier.classify("Pick a slot on my Calendy link"), Some("calendy"));
    }

    #[test]
    fn test_case_insensitive() {
        let classifier = KeywordClassifier::new(["next steps"]);
        assert_eq!(classifier.classify("NEXT STEPS: coding challenge"), Some("next steps"));
    }

    #[test]
    fn test_no_match() {
        let classifier = KeywordClassifier::new(["interview", "offer letter"]);
        assert_eq!(classifier.classify("Your weekly newsletter"), None);
        assert_eq!(classifier.classify(""), None);
    }

    #[test]
    fn test_substring_semantics() {
        // "test" also fires inside "latest"
        let classifier = KeywordClassifier::new(["test"]);
        assert_eq!(classifier.classify("Our latest openings"), Some("test"));
    }

    #[test]
    fn test_keywords_are_normalized() {
        let classifier = KeywordClassifier::new(["Offer Letter", ""]);
        assert_eq!(classifier.keywords(), &["offer letter".to_string()]);
    }
}
