//! Parsers for the department index pages that list what can be requested.
//!
//! Each index maps a normalized department key (as produced by
//! [`normalize_key`]) to the value the corresponding service expects for that
//! department.

use crate::{
    error::{DocumentError, Result},
    util::element_text,
};
use lazy_static::lazy_static;
use log::debug;
use models::{course::normalize_key, term::Term};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeMap;

lazy_static! {
    static ref CATALOGUE_LINKS: Selector = Selector::parse("div#atozindex li a").unwrap();
    static ref PREREQ_TERMS: Selector = Selector::parse(r#"select[name="term"] option"#).unwrap();
    static ref PREREQ_DEPARTMENTS: Selector =
        Selector::parse(r#"select[name="dept"] option"#).unwrap();
    static ref SELECTED_OPTIONS: Selector = Selector::parse("option[selected]").unwrap();
    static ref SCHEDULE_DEPARTMENTS: Selector =
        Selector::parse(r#"select[name="Dept"] option"#).unwrap();
    static ref LINK_CODE: Regex = Regex::new(r"\(([^()]+)\)\s*$").unwrap();
    static ref ACADEMIC_TERM: Regex = Regex::new(r"^\d{4}-(?:92|03|14)$").unwrap();
}

/// Department key to path mapping
pub type DepartmentMap = BTreeMap<String, String>;

/// Departments of the prerequisite listing service and the term it serves
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrerequisiteIndex {
    pub term: String,
    /// Department key to option text
    pub departments: DepartmentMap,
}

/// Departments of the schedule service and the term it is open for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleIndex {
    pub term: Term,
    /// Department key to option value
    pub departments: DepartmentMap,
}

/// Reads the catalogue's A-Z index
///
/// # Arguments
/// * `html` - The catalogue landing page
///
/// # Returns
/// Department key to the department's path below the catalogue root, e.g.
/// `COMPSCI` to `compsci`. Links without a `(CODE)` suffix are skipped.
pub fn parse_catalogue_index(html: &str) -> DepartmentMap {
    let document = Html::parse_document(html);

    document
        .select(&CATALOGUE_LINKS)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let path = href
                .trim_start_matches("/allcourses/")
                .trim_matches('/')
                .to_string();
            let text = element_text(link);
            let code = LINK_CODE.captures(&text)?;
            Some((normalize_key(&code[1]), path))
        })
        .collect()
}

/// Reads the term and department selectors of the prerequisite listing service
///
/// # Returns
/// The first offered term and every department option, or
/// [`DocumentError::MissingElement`] if the page offers no term
pub fn parse_prerequisite_index(html: &str) -> Result<PrerequisiteIndex> {
    let document = Html::parse_document(html);

    let term = document
        .select(&PREREQ_TERMS)
        .find_map(|option| option.value().attr("value"))
        .map(|value| value.trim().to_string())
        .ok_or(DocumentError::MissingElement {
            element: "term selector",
        })?;

    let departments = document
        .select(&PREREQ_DEPARTMENTS)
        .map(|option| {
            option
                .value()
                .attr("value")
                .map(|value| value.trim().to_string())
                .unwrap_or_else(|| element_text(option))
        })
        .filter(|option| !option.is_empty())
        .map(|option| (normalize_key(&option), option))
        .collect();

    Ok(PrerequisiteIndex { term, departments })
}

/// Reads the active term and department options of the schedule service
///
/// The first department option is the catch-all entry and is skipped.
///
/// # Returns
/// The index, or [`DocumentError::Upstream`] if no academic term is selected
pub fn parse_schedule_index(html: &str) -> Result<ScheduleIndex> {
    let document = Html::parse_document(html);

    let term = document
        .select(&SELECTED_OPTIONS)
        .filter_map(|option| option.value().attr("value"))
        .map(str::trim)
        .find(|value| ACADEMIC_TERM.is_match(value))
        .and_then(|value| value.parse::<Term>().ok())
        .ok_or_else(|| DocumentError::Upstream {
            banner: "not currently in an academic term".to_string(),
        })?;

    let departments = document
        .select(&SCHEDULE_DEPARTMENTS)
        .skip(1)
        .filter_map(|option| {
            let value = option.value().attr("value")?.trim();
            if value.is_empty() {
                debug!("Skipping schedule department option without a value");
                return None;
            }
            Some((normalize_key(value), value.to_string()))
        })
        .collect();

    Ok(ScheduleIndex { term, departments })
}
