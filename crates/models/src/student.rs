use crate::{
    course::{CourseMap, normalize_key},
    requirement::Block,
    term::{Term, sort_recent_first},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum::{AsRefStr, Display, EnumString};

/// Class level derived from credits applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ClassLevel {
    Freshman,
    Sophomore,
    Junior,
    Senior,
}

impl ClassLevel {
    pub fn from_credits(credits: f64) -> Option<Self> {
        match credits {
            c if c >= 135.0 => Some(Self::Senior),
            c if c >= 90.0 => Some(Self::Junior),
            c if c >= 45.0 => Some(Self::Sophomore),
            c if c >= 0.0 => Some(Self::Freshman),
            _ => None,
        }
    }
}

/// Division standing derived from credits applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display, AsRefStr)]
pub enum Standing {
    #[strum(serialize = "LOWER DIVISION")]
    LowerDivision,
    #[strum(serialize = "UPPER DIVISION")]
    UpperDivision,
}

impl Standing {
    pub fn from_credits(credits: f64) -> Option<Self> {
        match credits {
            c if c >= 90.0 => Some(Self::UpperDivision),
            c if c >= 0.0 => Some(Self::LowerDivision),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,
    pub name: String,
    pub email: String,
    pub gpa: f64,
    pub percent_complete: f64,
    pub credits_applied: f64,
    pub courses: CourseMap,
    /// Keys of completed courses, including the synthetic standing keys
    pub taken: BTreeSet<String>,
    /// Grades of completed courses by course key
    #[serde(default)]
    pub grades: BTreeMap<String, String>,
    pub blocks: Vec<Block>,
    /// Terms under consideration, most recent first
    pub terms: Vec<Term>,
}

impl Student {
    /// Creates a student seeded with an existing course map and term list
    pub fn new(courses: CourseMap, mut terms: Vec<Term>) -> Self {
        sort_recent_first(&mut terms);
        Self {
            courses,
            terms,
            ..Default::default()
        }
    }

    pub fn class_level(&self) -> Option<ClassLevel> {
        ClassLevel::from_credits(self.credits_applied)
    }

    pub fn standing(&self) -> Option<Standing> {
        Standing::from_credits(self.credits_applied)
    }

    /// The term whose classes are being planned
    pub fn current_term(&self) -> Option<Term> {
        self.terms.first().copied()
    }

    pub fn has_taken(&self, key: &str) -> bool {
        self.taken.contains(key) || self.taken.contains(&normalize_key(key))
    }

    /// The grade recorded for a completed course
    pub fn grade_of(&self, key: &str) -> Option<&str> {
        self.grades.get(&normalize_key(key)).map(String::as_str)
    }

    /// Marks a course completed and records its grade, also on the course
    /// entity when one exists
    pub fn mark_completed(&mut self, key: &str, grade: &str) {
        let key = normalize_key(key);
        let grade = grade.trim();
        if !grade.is_empty() {
            if let Some(course) = self.courses.get_mut(&key) {
                course.grade = Some(grade.to_string());
            }
            self.grades.insert(key.clone(), grade.to_string());
        }
        self.taken.insert(key);
    }

    /// Marks the class level and standing derived from credits applied as taken,
    /// so prerequisite alternatives can reference them like ordinary courses
    pub fn mark_standing(&mut self) {
        if let Some(level) = self.class_level() {
            self.taken.insert(normalize_key(level.as_ref()));
        }
        if let Some(standing) = self.standing() {
            self.taken.insert(normalize_key(standing.as_ref()));
        }
    }

    /// Keys of courses whose prerequisites are cleared and that are not yet taken
    pub fn eligible_courses(&self) -> Vec<&str> {
        self.courses
            .iter()
            .filter(|(key, course)| !self.taken.contains(*key) && course.cleared_prereqs(self))
            .map(|(key, _)| key.as_str())
            .collect()
    }
}
