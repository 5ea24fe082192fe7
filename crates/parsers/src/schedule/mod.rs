//! Parser for the fixed-width class schedule listing of one department and term.

pub mod columns;

use crate::error::{DocumentError, Result};
use columns::ColumnLayout;
use lazy_static::lazy_static;
use log::debug;
use models::{
    course::{ClassSection, Course, CourseMap, SectionType, course_key},
    days::DaySet,
    term::Term,
    time::TimeRange,
};
use regex::Regex;
use std::str::FromStr;

/// Separator line framing the title banner and closing the department's records
const DELIMITER: &str = "       _________________________________________________________________";
/// Prefix of the line reporting that the listing has no results
const ERROR_PREFIX: &str = "**** ";
/// Prefix of the line marking the end of the readable listing
const END_PREFIX: &str = "*** ";

lazy_static! {
    static ref MEETING: Regex =
        Regex::new(r"([A-Za-z]*)\s+(\s?\d{1,2}:\d{2}-\s?\d{1,2}:\d{2}[apAP]?)").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Scanning for the first delimiter
    Seeking,
    /// Inside the department's records
    Parsing,
}

/// The course a run of data rows belongs to
#[derive(Debug)]
struct CourseHeader {
    department: String,
    number: String,
    title: String,
}

impl CourseHeader {
    /// Reads department, number and title from their fixed offsets
    fn from_line(line: &str) -> Self {
        let slice = |start: usize, end: usize| {
            let end = end.min(line.len());
            line.get(start.min(end)..end).unwrap_or_default().trim().to_string()
        };

        Self {
            department: slice(0, 8).to_uppercase(),
            number: slice(9, 18).to_uppercase(),
            title: slice(19, line.len()),
        }
    }
}

/// Whether a line starts a new course: its first four characters are not blank
fn is_course_header(line: &str) -> bool {
    line.len() > 4 && line.get(..4).is_some_and(|lead| !lead.trim().is_empty())
}

/// Splits a time column such as `TuTh   2:00- 3:20p` into days and interval
///
/// # Returns
/// Empty days and no interval when the column holds `TBA` or is malformed
fn parse_meeting(raw: &str) -> (DaySet, Option<TimeRange>) {
    match MEETING.captures(raw) {
        Some(caps) => {
            let days = caps
                .get(1)
                .and_then(|m| DaySet::from_str(m.as_str()).ok())
                .unwrap_or_default();
            let time = caps.get(2).and_then(|m| TimeRange::parse(m.as_str()));
            (days, time)
        }
        None => (DaySet::NONE, None),
    }
}

/// Builds a class section from a data row
///
/// # Returns
/// `None` for rows without an enrollment code, which only carry an extra
/// instructor for the previous section
fn parse_section(layout: &ColumnLayout, line: &str) -> Option<ClassSection> {
    let code = layout.field(line, &layout.code);
    if code.is_empty() {
        return None;
    }

    let (days, time) = parse_meeting(layout.field(line, &layout.time));

    Some(ClassSection {
        code: code.to_string(),
        section_type: SectionType::parse_lenient(layout.field(line, &layout.section_type)),
        section: layout.field(line, &layout.section).to_string(),
        units: layout.field(line, &layout.units).to_string(),
        instructor: layout.field(line, &layout.instructor).to_string(),
        days,
        time,
        place: layout.field(line, &layout.place).to_string(),
    })
}

/// Parses a schedule listing and appends its class sections to `courses`
///
/// Courses not yet in the map are created from the listing's course header.
/// Rows narrower than the column header (cross-listing notes) and rows without
/// an enrollment code (additional instructors) are skipped.
///
/// # Arguments
/// * `term` - The academic term the listing was requested for
/// * `text` - The plain-text listing
/// * `courses` - The course map to enrich
///
/// # Returns
/// The number of class sections added, or [`DocumentError::Upstream`] if the
/// listing reports that no results are available
pub fn parse_schedule(term: Term, text: &str, courses: &mut CourseMap) -> Result<usize> {
    let mut state = State::Seeking;
    let mut header: Option<CourseHeader> = None;
    let mut layout: Option<ColumnLayout> = None;
    let mut added = 0;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');

        if let Some(banner) = line.strip_prefix(ERROR_PREFIX) {
            return Err(DocumentError::Upstream {
                banner: banner.trim().to_string(),
            });
        }

        if state == State::Seeking {
            if line == DELIMITER {
                state = State::Parsing;
            }
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        if line == DELIMITER {
            // A delimiter before any course closes the title banner
            if header.is_none() {
                continue;
            }
            break;
        }

        if line.starts_with(END_PREFIX) {
            break;
        }

        if is_course_header(line) {
            header = Some(CourseHeader::from_line(line));
            layout = None;
            continue;
        }

        let Some(course) = &header else {
            debug!("Skipping schedule line outside a course: {line:?}");
            continue;
        };

        let Some(columns) = &layout else {
            layout = ColumnLayout::from_header(line);
            if layout.is_none() {
                debug!("Skipping unrecognised column header: {line:?}");
            }
            continue;
        };

        if line.len() < columns.width {
            continue;
        }

        let Some(section) = parse_section(columns, line) else {
            continue;
        };

        let key = course_key(&course.department, &course.number);
        let entry = courses
            .entry(key)
            .or_insert_with(|| Course::new(&course.department, &course.number));
        entry.enrich_short_title(&course.title);
        entry.add_class(term, section);
        added += 1;
    }

    Ok(added)
}
