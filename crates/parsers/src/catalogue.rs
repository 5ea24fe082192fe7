//! Parser for one department page of the general course catalogue.

use crate::{
    error::{DocumentError, Result},
    util::{clean, element_text},
};
use lazy_static::lazy_static;
use log::debug;
use models::{
    course::{Course, CourseMap, normalize_key, upsert},
    term::Term,
};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

lazy_static! {
    static ref HEADING: Selector = Selector::parse("h1").unwrap();
    static ref COURSE_BLOCK: Selector = Selector::parse("div.courseblock").unwrap();
    static ref BLOCK_TITLE: Selector = Selector::parse("p.courseblocktitle strong").unwrap();
    static ref BLOCK_DESCRIPTION: Selector = Selector::parse("div.courseblockdesc p").unwrap();
    static ref DEPARTMENT_CODE: Regex = Regex::new(r"\(([^()]+)\)\s*$").unwrap();
    static ref DESIGNATOR_TITLE: Regex = Regex::new(r"^(.*?)\.\s*(.*?)\.").unwrap();
}

/// A previously saved course map together with the terms it was built for
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogueSnapshot {
    pub terms: Vec<Term>,
    pub courses: CourseMap,
}

impl CatalogueSnapshot {
    /// Reads a snapshot written by [`CatalogueSnapshot::save`]
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| DocumentError::Snapshot {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| DocumentError::Snapshot {
            path: path.to_path_buf(),
            source,
        })?;

        fs::write(path, json).map_err(|source| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Extracts the normalized department code from the page heading,
/// e.g. `Computer Science (COMPSCI)` gives `COMPSCI`
fn department_code(document: &Html) -> Option<String> {
    document.select(&HEADING).find_map(|heading| {
        let text = element_text(heading);
        DEPARTMENT_CODE
            .captures(&text)
            .map(|caps| normalize_key(&caps[1]))
    })
}

/// Reads number, title and description from one course block
///
/// # Returns
/// `None` if the block lacks the title line, the title does not split into
/// designator and title, or the designator does not start with `department`
fn parse_block(department: &str, block: ElementRef<'_>) -> Option<Course> {
    let heading = element_text(block.select(&BLOCK_TITLE).next()?);
    let caps = DESIGNATOR_TITLE.captures(&heading)?;

    let designator = normalize_key(&caps[1]);
    let number = designator.strip_prefix(department)?;
    if number.is_empty() {
        return None;
    }

    let description = block
        .select(&BLOCK_DESCRIPTION)
        .next()
        .map(element_text)
        .unwrap_or_default();

    let mut course = Course::new(department, number).with_title(&clean(&caps[2]));
    course.description = description;
    Some(course)
}

/// Parses a catalogue department page and upserts its courses
///
/// Blocks that do not match the expected title/description structure are
/// skipped; the rest of the page is still read.
///
/// # Arguments
/// * `html` - The department page
/// * `courses` - The course map to enrich
///
/// # Returns
/// The number of courses read, or [`DocumentError::MissingElement`] if the
/// page has no department heading
pub fn parse_catalogue(html: &str, courses: &mut CourseMap) -> Result<usize> {
    let document = Html::parse_document(html);
    let department = department_code(&document).ok_or(DocumentError::MissingElement {
        element: "department heading",
    })?;

    let mut parsed = 0;
    for block in document.select(&COURSE_BLOCK) {
        match parse_block(&department, block) {
            Some(course) => {
                upsert(courses, course);
                parsed += 1;
            }
            None => debug!("Skipping malformed course block in {department}"),
        }
    }

    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
<h1 class="page-title">Information and Computer Science (I&amp;C&nbsp;SCI)</h1>
<div class="courses">
  <div class="courseblock">
    <p class="courseblocktitle"><strong>I&amp;C&nbsp;SCI&nbsp;31.  Introduction to Programming.  4 Units.</strong></p>
    <div class="courseblockdesc">
      <p>Introduction to fundamental concepts
         and techniques for writing software.</p>
    </div>
  </div>
  <div class="courseblock">
    <p class="courseblocktitle"><strong>I&amp;C&nbsp;SCI&nbsp;H32.  Python Programming and Libraries (Accelerated).  4 Units.</strong></p>
  </div>
  <div class="courseblock">
    <p class="courseblocktitle"><strong>Untitled block without a designator</strong></p>
  </div>
  <div class="courseblock">
    <p class="courseblocktitle"><strong>COMPSCI&nbsp;161.  Design and Analysis of Algorithms.  4 Units.</strong></p>
  </div>
</div>
</body></html>
"#;

    #[test]
    fn test_parses_course_blocks() {
        let mut courses = CourseMap::new();
        let parsed = parse_catalogue(PAGE, &mut courses).unwrap();
        assert_eq!(parsed, 2);

        let course = &courses["I&CSCI31"];
        assert_eq!(course.department, "I&CSCI");
        assert_eq!(course.number, "31");
        assert_eq!(course.title, "Introduction to Programming");
        assert_eq!(
            course.description,
            "Introduction to fundamental concepts and techniques for writing software."
        );

        let honors = &courses["I&CSCIH32"];
        assert_eq!(honors.title, "Python Programming and Libraries (Accelerated)");
        assert!(honors.description.is_empty());
    }

    #[test]
    fn test_skips_foreign_and_malformed_blocks() {
        let mut courses = CourseMap::new();
        parse_catalogue(PAGE, &mut courses).unwrap();
        assert!(!courses.contains_key("COMPSCI161"));
        assert_eq!(courses.len(), 2);
    }

    #[test]
    fn test_keeps_existing_fields() {
        let mut courses = CourseMap::new();
        let mut existing = Course::new("I&CSCI", "31").with_short_title("INTRO TO PROGRAMMING");
        existing.grade = Some("A".to_string());
        courses.insert("I&CSCI31".to_string(), existing);

        parse_catalogue(PAGE, &mut courses).unwrap();

        let course = &courses["I&CSCI31"];
        assert_eq!(course.short_title, "INTRO TO PROGRAMMING");
        assert_eq!(course.grade.as_deref(), Some("A"));
        assert_eq!(course.title, "Introduction to Programming");
    }

    #[test]
    fn test_missing_heading() {
        let mut courses = CourseMap::new();
        let err = parse_catalogue("<html><body><p>Maintenance</p></body></html>", &mut courses)
            .unwrap_err();
        assert!(matches!(err, DocumentError::MissingElement { .. }));
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut courses = CourseMap::new();
        parse_catalogue(PAGE, &mut courses).unwrap();
        let snapshot = CatalogueSnapshot {
            terms: vec![Term::fall(2017)],
            courses,
        };

        let path = std::env::temp_dir().join(format!("catalogue-{}.json", std::process::id()));
        snapshot.save(&path).unwrap();
        let loaded = CatalogueSnapshot::load(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, snapshot);
    }

    #[test]
    fn test_snapshot_missing_file() {
        let err = CatalogueSnapshot::load(Path::new("/nonexistent/catalogue.json")).unwrap_err();
        assert!(matches!(err, DocumentError::Io { .. }));
    }
}
