use std::cmp::Ordering;

/// Rank of a grade modifier; a `+` ranks better (lower) than none, which ranks
/// better than a `-`
fn modifier_rank(grade: &str) -> u8 {
    if grade.contains('+') {
        0
    } else if grade.contains('-') {
        2
    } else {
        1
    }
}

/// The base letter of a grade, case-folded with modifiers removed
fn base_letter(grade: &str) -> String {
    grade
        .chars()
        .filter(|c| !matches!(c, '+' | '-'))
        .flat_map(char::to_uppercase)
        .collect()
}

/// Compares two letter grades, where better grades order first (`A+ < A < A- < B`).
///
/// A missing grade on either side compares as [`Ordering::Equal`]: it carries no
/// information, so grade checks involving it are treated as satisfied.
pub fn compare(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.trim(), b.trim());
    if a.is_empty() || b.is_empty() {
        return Ordering::Equal;
    }

    base_letter(a)
        .cmp(&base_letter(b))
        .then_with(|| modifier_rank(a).cmp(&modifier_rank(b)))
}

/// Whether `earned` is not worse than `minimum`
pub fn meets_minimum(earned: &str, minimum: &str) -> bool {
    compare(earned, minimum) != Ordering::Greater
}

/// Whether a letter grade marks a class that is still in progress
pub fn is_in_progress(grade: &str) -> bool {
    grade.trim().eq_ignore_ascii_case("IP")
}
