use crate::error::{DocumentError, Result};
use chrono::{Local, NaiveDate};
use models::term::{Term, academic_terms, sort_recent_first};
use std::path::PathBuf;

/// Directory holding the saved documents
const DOCUMENTS_DIR: &str = "PLANNER_DOCUMENTS_DIR";
/// Comma separated term codes to plan for
const TERMS: &str = "PLANNER_TERMS";
/// Overrides the student identifier read from the audit
const STUDENT_ID: &str = "PLANNER_STUDENT_ID";

/// Settings for a planner run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub documents_dir: PathBuf,
    /// Terms to plan for, most recent first
    pub terms: Vec<Term>,
    pub student_id: Option<String>,
}

impl Settings {
    /// Loads settings from the environment, reading a `.env` file first if present
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok(), Local::now().date_naive())
    }

    /// Builds settings from a variable lookup
    ///
    /// # Arguments
    /// * `lookup` - Returns the value of a variable, if set
    /// * `today` - Date used to derive the default terms
    ///
    /// # Returns
    /// The settings, or [`DocumentError::Config`] if the documents directory is
    /// unset or a term code is invalid
    pub fn from_lookup<F>(lookup: F, today: NaiveDate) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let documents_dir = lookup(DOCUMENTS_DIR)
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from)
            .ok_or_else(|| DocumentError::Config {
                message: format!("{DOCUMENTS_DIR} must be set"),
            })?;

        let mut terms = match lookup(TERMS).filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => parse_terms(&raw)?,
            None => academic_terms(today),
        };
        sort_recent_first(&mut terms);

        let student_id = lookup(STUDENT_ID)
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        Ok(Self {
            documents_dir,
            terms,
            student_id,
        })
    }
}

fn parse_terms(raw: &str) -> Result<Vec<Term>> {
    raw.split(',')
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .map(|code| {
            code.parse().map_err(|e| DocumentError::Config {
                message: format!("{TERMS} contains invalid term {code:?}: {e}"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2017, 10, 2).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[(DOCUMENTS_DIR, "/tmp/docs")]), today()).unwrap();
        assert_eq!(settings.documents_dir, PathBuf::from("/tmp/docs"));
        assert_eq!(
            settings.terms,
            vec![Term::spring(2018), Term::winter(2018), Term::fall(2017)]
        );
        assert_eq!(settings.student_id, None);
    }

    #[test]
    fn test_explicit_terms_sorted() {
        let settings = Settings::from_lookup(
            lookup(&[
                (DOCUMENTS_DIR, "docs"),
                (TERMS, "2017-92, 2018-03"),
                (STUDENT_ID, " 12345 "),
            ]),
            today(),
        )
        .unwrap();
        assert_eq!(settings.terms, vec![Term::winter(2018), Term::fall(2017)]);
        assert_eq!(settings.student_id.as_deref(), Some("12345"));
    }

    #[test]
    fn test_missing_documents_dir() {
        let err = Settings::from_lookup(lookup(&[]), today()).unwrap_err();
        assert!(matches!(err, DocumentError::Config { .. }));
    }

    #[test]
    fn test_invalid_term() {
        let err = Settings::from_lookup(
            lookup(&[(DOCUMENTS_DIR, "docs"), (TERMS, "2017-92,2017-76")]),
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, DocumentError::Config { ref message } if message.contains("2017-76")));
    }
}
