//! The policy that decides whether a calendar event "is" an assignment
//!
//! There is no foreign key between the two services, so this is a heuristic identity
//! match. It is isolated behind a trait so a stricter policy (an exact match, or a
//! mapping stored elsewhere) can be swapped in without touching the reconciler.

/// Decides whether an event title represents an assignment name.
pub trait MatchPolicy {
    fn matches(&self, event_title: &str, assignment_name: &str) -> bool;
}

/// The default policy: literal, case-sensitive substring containment.
///
/// Asymmetric by nature: an assignment whose name happens to be a substring of some
/// unrelated event title will be considered already scheduled, and a duplicate with
/// different formatting will not be recognized at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct TitleContains;

impl MatchPolicy for TitleContains {
    fn matches(&self, event_title: &str, assignment_name: &str) -> bool {
        event_title.contains(assignment_name)
    }
}

/// A stricter policy: the event title must be exactly the assignment name.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExactTitle;

impl MatchPolicy for ExactTitle {
    fn matches(&self, event_title: &str, assignment_name: &str) -> bool {
        event_title == assignment_name
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn title_contains_is_true_substring_matching() {
        let policy = TitleContains;
        assert!(policy.matches("HW3 is due soon", "HW3"));
        assert!(policy.matches("HW3", "HW3"));
        // Not word matching: a match in the middle of a token still counts
        assert!(policy.matches("reread chapter", "read chapter"));
    }

    #[test]
    fn title_contains_is_case_sensitive() {
        let policy = TitleContains;
        assert!(policy.matches("hw3 is due soon", "HW3") == false);
        assert!(policy.matches("Quiz 1 reminder", "quiz 1") == false);
    }

    #[test]
    fn exact_title_rejects_substrings() {
        let policy = ExactTitle;
        assert!(policy.matches("HW3", "HW3"));
        assert!(policy.matches("HW3 is due soon", "HW3") == false);
    }
}
