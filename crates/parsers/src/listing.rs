//! Parser for the per-department prerequisite listing.

use crate::{
    error::{DocumentError, Result},
    expression::parse_expression,
    util::{clean, element_text},
};
use lazy_static::lazy_static;
use log::debug;
use models::{
    course::{Course, CourseMap, normalize_key},
    requisite::Prerequisites,
};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

lazy_static! {
    static ref HEADING: Selector =
        Selector::parse(r#"table[border="0"] td[align="center"] h3"#).unwrap();
    static ref ROWS: Selector = Selector::parse(r#"table[width="800"] tr"#).unwrap();
    static ref CELLS: Selector = Selector::parse("td").unwrap();
    static ref CROSS_LISTED: Regex =
        Regex::new(r"(?s)(.*)<span.*?>\s*\*\s*(.*?) since .*?</span>").unwrap();
}

/// The designators a listing row applies to
#[derive(Debug, PartialEq, Eq)]
struct Designators {
    primary: String,
    /// Former or alternate designator the course is cross-listed as
    alias: Option<String>,
}

impl Designators {
    /// Splits the first cell into the primary designator and its cross-listed alias
    fn from_cell(cell: ElementRef<'_>) -> Self {
        let html = cell.inner_html();
        match CROSS_LISTED.captures(&html) {
            Some(caps) => Self {
                primary: clean(&caps[1]),
                alias: Some(clean(&caps[2])).filter(|alias| !alias.is_empty()),
            },
            None => Self {
                primary: element_text(cell),
                alias: None,
            },
        }
    }
}

/// Builds a course for a designator that is not yet in the map
///
/// The number is whatever follows the page's department code; designators from
/// another department are split at their last space instead.
fn new_course(department: &str, designator: &str, short_title: &str) -> Option<Course> {
    let key = normalize_key(designator);
    let (department, number) = match key.strip_prefix(department) {
        Some(number) => (department.to_string(), number.to_string()),
        None => {
            let (department, number) = designator.trim().rsplit_once(' ')?;
            (normalize_key(department), normalize_key(number))
        }
    };

    if number.is_empty() {
        return None;
    }
    Some(Course::new(&department, &number).with_short_title(short_title))
}

/// Applies one row's short title and prerequisites to the course at `designator`
fn apply_row(
    courses: &mut CourseMap,
    department: &str,
    designator: &str,
    short_title: &str,
    prerequisites: &Prerequisites,
) {
    let key = normalize_key(designator);
    if key.is_empty() {
        return;
    }

    if let Some(course) = courses.get_mut(&key) {
        course.enrich_short_title(short_title);
        course.prerequisites = prerequisites.clone();
    } else if let Some(mut course) = new_course(department, designator, short_title) {
        course.prerequisites = prerequisites.clone();
        courses.insert(course.key(), course);
    } else {
        debug!("Skipping listing row with unusable designator {designator:?}");
    }
}

/// Parses a department's prerequisite listing into the course map
///
/// Each row names a course (and possibly the designator it is cross-listed
/// as), its short title and its prerequisite expression. Existing courses keep
/// their short title if one is already set; their prerequisites are always
/// replaced. Rows with fewer than three cells or no designator are skipped.
///
/// # Arguments
/// * `html` - The listing page
/// * `courses` - The course map to enrich
///
/// # Returns
/// The number of rows applied, or [`DocumentError::MissingElement`] if the page
/// has no department heading
pub fn parse_listing(html: &str, courses: &mut CourseMap) -> Result<usize> {
    let document = Html::parse_document(html);
    let department = document
        .select(&HEADING)
        .map(element_text)
        .find(|text| !text.is_empty())
        .map(|text| normalize_key(&text))
        .ok_or(DocumentError::MissingElement {
            element: "department heading",
        })?;

    let mut applied = 0;
    for row in document.select(&ROWS) {
        let cells: Vec<ElementRef<'_>> = row.select(&CELLS).collect();
        let [designator, title, prerequisites, ..] = cells.as_slice() else {
            continue;
        };

        let designators = Designators::from_cell(*designator);
        if designators.primary.is_empty() {
            debug!("Skipping listing row without a course in {department}");
            continue;
        }

        let short_title = element_text(*title);
        let prerequisites = parse_expression(&element_text(*prerequisites));

        apply_row(
            courses,
            &department,
            &designators.primary,
            &short_title,
            &prerequisites,
        );
        if let Some(alias) = &designators.alias {
            apply_row(courses, &department, alias, &short_title, &prerequisites);
        }
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::requisite::Requisite;

    const PAGE: &str = r#"
<html><body>
<table border="0"><tr><td align="center"><h3>COMPSCI</h3></td></tr></table>
<table width="800" cellpadding="2">
  <tr><th>Course</th><th>Title</th><th>Prerequisites</th></tr>
  <tr>
    <td class="course">COMPSCI&nbsp;161
      <span class="xlist">* I&amp;C SCI 161 since 1999 Fall</span></td>
    <td class="title">DES&amp;ANALYS OF ALGOR</td>
    <td class="prereq">( I&amp;C SCI 46 ( min grade = C ) OR CSE 46 ( min grade = C ) )<br>AND<br>( MATH 2B ( coreq ) )</td>
  </tr>
  <tr>
    <td class="course">COMPSCI 171</td>
    <td class="title">INTRO ARTIFIC INTEL</td>
    <td class="prereq">COMPSCI 161 AND NO COMPSCI 171A</td>
  </tr>
  <tr><td colspan="3">Footnote row</td></tr>
  <tr><td></td><td>NO DESIGNATOR</td><td>COMPSCI 161</td></tr>
</table>
</body></html>
"#;

    #[test]
    fn test_creates_minimal_courses() {
        let mut courses = CourseMap::new();
        let applied = parse_listing(PAGE, &mut courses).unwrap();
        assert_eq!(applied, 2);

        let course = &courses["COMPSCI171"];
        assert_eq!(course.department, "COMPSCI");
        assert_eq!(course.number, "171");
        assert_eq!(course.short_title, "INTRO ARTIFIC INTEL");
        assert_eq!(
            course.prerequisites.groups(),
            &[
                vec![Requisite::Course("COMPSCI161".into())],
                vec![Requisite::Not("COMPSCI171A".into())],
            ]
        );
    }

    #[test]
    fn test_cross_listed_alias_gets_same_prerequisites() {
        let mut courses = CourseMap::new();
        parse_listing(PAGE, &mut courses).unwrap();

        let primary = &courses["COMPSCI161"];
        let alias = &courses["I&CSCI161"];
        assert_eq!(alias.department, "I&CSCI");
        assert_eq!(alias.number, "161");
        assert_eq!(primary.prerequisites, alias.prerequisites);
        assert_eq!(
            primary.prerequisites.groups(),
            &[
                vec![
                    Requisite::MinGrade {
                        course: "I&CSCI46".into(),
                        grade: "C".into(),
                    },
                    Requisite::MinGrade {
                        course: "CSE46".into(),
                        grade: "C".into(),
                    },
                ],
                vec![Requisite::Course("MATH2B".into())],
            ]
        );
    }

    #[test]
    fn test_existing_course_keeps_short_title() {
        let mut courses = CourseMap::new();
        courses.insert(
            "COMPSCI161".into(),
            Course::new("COMPSCI", "161")
                .with_title("Design and Analysis of Algorithms")
                .with_short_title("ALGORITHMS"),
        );
        parse_listing(PAGE, &mut courses).unwrap();

        let course = &courses["COMPSCI161"];
        assert_eq!(course.short_title, "ALGORITHMS");
        assert_eq!(course.title, "Design and Analysis of Algorithms");
        assert!(!course.prerequisites.is_empty());
    }

    #[test]
    fn test_prerequisites_are_replaced() {
        let mut courses = CourseMap::new();
        let mut stale = Course::new("COMPSCI", "171");
        stale.prerequisites = Prerequisites::new(vec![vec![Requisite::Course("MATH1A".into())]]);
        courses.insert("COMPSCI171".into(), stale);

        parse_listing(PAGE, &mut courses).unwrap();
        assert!(
            !courses["COMPSCI171"]
                .prerequisites
                .course_keys()
                .any(|key| key == "MATH1A")
        );
    }

    #[test]
    fn test_missing_heading() {
        let mut courses = CourseMap::new();
        let err = parse_listing("<table width=\"800\"></table>", &mut courses).unwrap_err();
        assert!(matches!(err, DocumentError::MissingElement { .. }));
    }
}
