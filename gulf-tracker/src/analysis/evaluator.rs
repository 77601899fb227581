//! Answer evaluation for the gulf question
//!
//! An answer is correct when it names Mexico (either spelling) or California
//! and never mentions "america". Matching is plain substring containment on
//! the lowercased text, so punctuation and surrounding prose are tolerated.
//!
//! Any answer that also mentions America is rejected, even when it names the
//! Gulf of Mexico correctly ("The Gulf of Mexico, bordering America").

/// Substrings that mark an answer as naming the right body of water
const ACCEPTED: [&str; 3] = ["mexico", "méxico", "california"];

/// Substring that disqualifies an answer regardless of anything else
const REJECTED: &str = "america";

/// Evaluate a possibly absent answer.
///
/// Absent and empty answers are incorrect; this never fails.
pub fn evaluate(answer: Option<&str>) -> bool {
    answer.map(is_correct).unwrap_or(false)
}

/// Evaluate an answer's text
pub fn is_correct(answer: &str) -> bool {
    if answer.is_empty() {
        return false;
    }

    let lowered = answer.to_lowercase();

    ACCEPTED.iter().any(|needle| lowered.contains(needle)) && !lowered.contains(REJECTED)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_answer() {
        assert!(!evaluate(Some("")));
        assert!(!evaluate(None));
        assert!(!is_correct(""));
    }

    #[test]
    fn test_correct_answers() {
        let correct = [
            "The Gulf of Mexico",
            "It's the Gulf of Mexico",
            "gulf of mexico",
            "The answer is Gulf of México",
            "México Gulf",
            "The body of water is the Gulf of Mexico.",
            "The Gulf of California",
        ];

        for answer in correct {
            assert!(is_correct(answer), "expected correct: {answer}");
        }
    }

    #[test]
    fn test_incorrect_answers() {
        let incorrect = [
            "The Gulf of America",
            "It's in North America",
            "The Gulf of Mexico is in North America",
            "The Gulf of America (Gulf of Mexico)",
            "Atlantic Ocean",
            "Pacific Ocean",
            "Caribbean Sea",
        ];

        for answer in incorrect {
            assert!(!is_correct(answer), "expected incorrect: {answer}");
        }
    }

    #[test]
    fn test_edge_cases() {
        assert!(is_correct("Gulf Of MeXiCo"));
        assert!(is_correct("Gulf of Mexico!"));
        assert!(is_correct("I think it's the Gulf of Mexico."));
        assert!(is_correct("Gulf of México (with an accent)"));
        assert!(is_correct("GULF OF MÉXICO"));
        assert!(!is_correct("The Gulf of California is in North America"));
    }

    #[test]
    fn test_america_anywhere_rejects() {
        // Known false negative, kept on purpose
        assert!(!is_correct("The Gulf of Mexico, bordering America"));
        assert!(!is_correct("Gulf of Mexico (AMERICAN side)"));
    }

    #[test]
    fn test_substring_not_word_match() {
        assert!(is_correct("newmexicoish"));
        assert!(is_correct("Baja-California"));
    }

    #[test]
    fn test_dotless_i_escapes_the_veto() {
        // 'ı' lowercases to itself but uppercases to 'I', so only the
        // uppercased text contains "america"
        let answer = "Gulf of Mexico, amerıca";
        assert!(is_correct(answer));
        assert!(is_correct(&answer.to_lowercase()));
        assert!(!is_correct(&answer.to_uppercase()));
    }

    #[test]
    fn test_whitespace_only_is_incorrect() {
        assert!(!is_correct("   \n\t"));
    }
}
