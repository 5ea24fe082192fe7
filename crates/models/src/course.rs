use crate::{days::DaySet, requisite::Prerequisites, student::Student, term::Term, time::TimeRange};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet},
    iter::Peekable,
    str::{Chars, FromStr},
};
use strum::{AsRefStr, Display, EnumString};

/// Map from course key to the course it identifies
pub type CourseMap = BTreeMap<String, Course>;

/// Uppercases `raw` and strips all whitespace.
///
/// Every parser derives keys through this function so entities from different
/// documents merge; applying it twice gives the same result as applying it once.
pub fn normalize_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// The canonical key of a course, e.g. `course_key(" I&C Sci ", "31")` is `I&CSCI31`
pub fn course_key(department: &str, number: &str) -> String {
    let mut key = normalize_key(department);
    key.push_str(&normalize_key(number));
    key
}

/// Type of class section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr)]
pub enum SectionType {
    #[strum(serialize = "Lec")]
    Lecture,
    #[strum(serialize = "Dis")]
    Discussion,
    #[strum(serialize = "Lab")]
    Lab,
    #[strum(serialize = "Sem")]
    Seminar,
    #[strum(serialize = "Tut")]
    Tutorial,
    #[strum(serialize = "Act")]
    Activity,
    #[strum(serialize = "Res")]
    Research,
    #[strum(serialize = "Fld")]
    Field,
    #[strum(serialize = "Stu")]
    Studio,
    #[strum(serialize = "Col")]
    Colloquium,
    #[strum(serialize = "Qiz")]
    Quiz,
    #[strum(serialize = "Tap")]
    Tape,
    #[strum(serialize = "???")]
    Other,
}

impl SectionType {
    /// Reads a listing's type column, falling back to [`SectionType::Other`]
    pub fn parse_lenient(s: &str) -> Self {
        Self::from_str(s.trim()).unwrap_or(Self::Other)
    }
}

/// One offered section of a course in a given term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSection {
    /// Enrollment code (e.g., "34000")
    pub code: String,
    /// Lecture, discussion, lab, ...
    pub section_type: SectionType,
    /// Section label (e.g., "A", "1")
    pub section: String,
    pub units: String,
    pub instructor: String,
    pub days: DaySet,
    /// Meeting interval; absent when the listing's time is TBA or malformed
    pub time: Option<TimeRange>,
    pub place: String,
}

/// Course numbers of one department, used for the required-by index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseGroup {
    pub department: String,
    pub numbers: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub department: String,
    pub number: String,
    /// Long form title, from the catalogue or the audit
    pub title: String,
    /// Abbreviated title, from the prerequisite or schedule listing
    pub short_title: String,
    pub description: String,
    /// Set once the student has completed the course
    pub grade: Option<String>,
    pub prerequisites: Prerequisites,
    pub required_by: Vec<CourseGroup>,
    pub classes: BTreeMap<Term, Vec<ClassSection>>,
}

impl Course {
    /// Both parts are stored in key form, so `"I&C Sci"` becomes `"I&CSCI"`
    pub fn new(department: &str, number: &str) -> Self {
        Self {
            department: normalize_key(department),
            number: normalize_key(number),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = title.trim().to_string();
        self
    }

    pub fn with_short_title(mut self, short_title: &str) -> Self {
        self.short_title = short_title.trim().to_string();
        self
    }

    pub fn key(&self) -> String {
        course_key(&self.department, &self.number)
    }

    /// Replaces the title unless the candidate would shorten or blank it
    pub fn enrich_title(&mut self, title: &str) {
        let title = title.trim();
        if !title.is_empty() && title.len() >= self.title.len() {
            self.title = title.to_string();
        }
    }

    /// Sets the short title only if none has been recorded
    pub fn enrich_short_title(&mut self, short_title: &str) {
        let short_title = short_title.trim();
        if self.short_title.is_empty() && !short_title.is_empty() {
            self.short_title = short_title.to_string();
        }
    }

    /// Merges a fragment parsed from another document into this course.
    ///
    /// Only fields present in the fragment overwrite; titles follow
    /// [`Course::enrich_title`], classes are appended per term.
    pub fn merge(&mut self, fragment: Course) {
        if self.department.is_empty() {
            self.department = fragment.department;
        }
        if self.number.is_empty() {
            self.number = fragment.number;
        }
        self.enrich_title(&fragment.title);
        if !fragment.short_title.is_empty() {
            self.short_title = fragment.short_title;
        }
        if !fragment.description.is_empty() {
            self.description = fragment.description;
        }
        if fragment.grade.is_some() {
            self.grade = fragment.grade;
        }
        if !fragment.prerequisites.is_empty() {
            self.prerequisites = fragment.prerequisites;
        }
        for (term, classes) in fragment.classes {
            self.classes.entry(term).or_default().extend(classes);
        }
    }

    pub fn add_class(&mut self, term: Term, class: ClassSection) {
        self.classes.entry(term).or_default().push(class);
    }

    /// Whether the student has cleared every prerequisite group of this course
    pub fn cleared_prereqs(&self, student: &Student) -> bool {
        self.prerequisites.is_cleared(student)
    }

    /// For each quarter letter, the years this course has sections, most recent first
    pub fn terms_offered(&self) -> BTreeMap<&'static str, Vec<u16>> {
        let mut offered: BTreeMap<&'static str, Vec<u16>> = BTreeMap::new();
        for term in self.classes.keys() {
            offered.entry(term.quarter.letter()).or_default().push(term.year);
        }
        for years in offered.values_mut() {
            years.sort_unstable_by(|a, b| b.cmp(a));
            years.dedup();
        }
        offered
    }
}

/// Inserts `fragment` under its key, merging into an existing entry
pub fn upsert(courses: &mut CourseMap, fragment: Course) {
    let key = fragment.key();
    match courses.get_mut(&key) {
        Some(course) => course.merge(fragment),
        None => {
            courses.insert(key, fragment);
        }
    }
}

/// Compares strings so that embedded digit runs order numerically (`2 < 10`)
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        match (a.peek().copied(), b.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let x = take_digits(&mut a);
                let y = take_digits(&mut b);
                let x_trimmed = x.trim_start_matches('0');
                let y_trimmed = y.trim_start_matches('0');

                let ordering = x_trimmed
                    .len()
                    .cmp(&y_trimmed.len())
                    .then_with(|| x_trimmed.cmp(y_trimmed))
                    .then_with(|| x.len().cmp(&y.len()));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                if x != y {
                    return x.cmp(&y);
                }
                a.next();
                b.next();
            }
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        digits.push(c);
    }
    digits
}

/// Rebuilds every course's required-by index from the prerequisite lists.
///
/// Groups are ordered by department and their numbers in natural order.
pub fn link_required_by(courses: &mut CourseMap) {
    let mut index: BTreeMap<String, BTreeMap<String, BTreeSet<String>>> = BTreeMap::new();

    for course in courses.values() {
        for key in course.prerequisites.course_keys() {
            index
                .entry(key.to_string())
                .or_default()
                .entry(normalize_key(&course.department))
                .or_default()
                .insert(course.number.clone());
        }
    }

    for (key, course) in courses.iter_mut() {
        course.required_by = index
            .remove(key)
            .unwrap_or_default()
            .into_iter()
            .map(|(department, numbers)| {
                let mut numbers: Vec<String> = numbers.into_iter().collect();
                numbers.sort_by(|a, b| natural_cmp(a, b));
                CourseGroup { department, numbers }
            })
            .collect();
    }
}
