use lazy_static::lazy_static;
use log::debug;
use models::requisite::{Prerequisites, Requisite};
use regex::Regex;

lazy_static! {
    static ref DISCARDED: Regex =
        Regex::new(r"(?i)\s*\(\s*(?:coreq|recommended|min score\s*=\s*[\w+-]+)\s*\)").unwrap();
    static ref MIN_GRADE: Regex = Regex::new(r"(?i)\s*\(\s*min grade\s*=\s*([\w+-]+)\s*\)").unwrap();
    static ref AND: Regex = Regex::new(r"\s+AND\s+").unwrap();
    static ref OR: Regex = Regex::new(r"\s+OR\s+").unwrap();
}

/// Enrollment restrictions that appear as alternatives but name no course
const FILLER_PREFIXES: [&str; 4] = ["NO REPEATS ALLOWED", "BETTER", "SCHOOL OF", "PLACEMENT EXAM"];

/// Whether an alternative is a restriction phrase the model does not represent
fn is_filler(alternative: &str) -> bool {
    FILLER_PREFIXES
        .iter()
        .any(|prefix| alternative.starts_with(prefix))
}

/// Converts a normalized prerequisite expression into AND-groups of OR-alternatives.
///
/// Corequisite, recommendation and placement-score annotations are dropped;
/// `(min grade = X)` becomes a `|X` suffix on the preceding course. Groups left
/// empty after filtering are dropped. Order is preserved throughout.
///
/// # Arguments
/// * `raw` - Text such as `(CS 141) AND (CS 142 OR CS 143 (min grade = C))`
///
/// # Returns
/// The parsed [`Prerequisites`], empty if the expression names no courses
pub fn parse_expression(raw: &str) -> Prerequisites {
    let text = DISCARDED.replace_all(raw, "");
    let text = MIN_GRADE.replace_all(&text, "|$1");
    let text: String = text.chars().filter(|c| !matches!(c, '(' | ')')).collect();

    let groups = AND
        .split(text.trim())
        .filter_map(|group| {
            let alternatives: Vec<Requisite> = OR
                .split(group)
                .map(str::trim)
                .filter(|alternative| !alternative.is_empty() && !is_filler(alternative))
                .filter_map(|alternative| match alternative.parse() {
                    Ok(requisite) => Some(requisite),
                    Err(e) => {
                        debug!("Skipping prerequisite alternative: {e}");
                        None
                    }
                })
                .collect();

            (!alternatives.is_empty()).then_some(alternatives)
        })
        .collect();

    Prerequisites::new(groups)
}
