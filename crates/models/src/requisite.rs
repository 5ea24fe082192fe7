use crate::{course::normalize_key, grade, student::Student};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

/// One alternative inside an AND-group of a prerequisite expression
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Requisite {
    /// The course must have been completed
    Course(String),
    /// The course must have been completed with at least the given grade
    MinGrade { course: String, grade: String },
    /// The course must NOT have been completed
    Not(String),
}

impl Requisite {
    /// The course key this alternative refers to
    pub fn course_key(&self) -> &str {
        match self {
            Self::Course(course) | Self::Not(course) => course,
            Self::MinGrade { course, .. } => course,
        }
    }

    /// Evaluate this alternative against the student's completed courses
    pub fn is_satisfied(&self, student: &Student) -> bool {
        match self {
            Self::Course(course) => student.has_taken(course),
            Self::Not(course) => !student.has_taken(course),
            Self::MinGrade { course, grade } => {
                student.has_taken(course)
                    && grade::meets_minimum(student.grade_of(course).unwrap_or_default(), grade)
            }
        }
    }
}

/// Custom error type for parsing a prerequisite alternative
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRequisiteError(pub String);

impl Display for ParseRequisiteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Failed to parse requisite: {:?}", self.0)
    }
}

impl std::error::Error for ParseRequisiteError {}

impl FromStr for Requisite {
    type Err = ParseRequisiteError;

    /// Parses the string forms `CS141`, `CS143|C` and `NO CS141`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();

        if let Some(course) = input.strip_prefix("NO ") {
            let course = normalize_key(course);
            return if course.is_empty() {
                Err(ParseRequisiteError(input.to_string()))
            } else {
                Ok(Self::Not(course))
            };
        }

        let (course, grade) = match input.split_once('|') {
            Some((course, grade)) => (normalize_key(course), Some(grade.trim().to_uppercase())),
            None => (normalize_key(input), None),
        };

        if course.is_empty() {
            return Err(ParseRequisiteError(input.to_string()));
        }

        Ok(match grade {
            Some(grade) if !grade.is_empty() => Self::MinGrade { course, grade },
            _ => Self::Course(course),
        })
    }
}

impl Display for Requisite {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Course(course) => write!(f, "{course}"),
            Self::MinGrade { course, grade } => write!(f, "{course}|{grade}"),
            Self::Not(course) => write!(f, "NO {course}"),
        }
    }
}

impl Serialize for Requisite {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Requisite {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// An ordered list of AND-groups, each an ordered list of OR-alternatives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prerequisites(pub Vec<Vec<Requisite>>);

impl Prerequisites {
    pub fn new(groups: Vec<Vec<Requisite>>) -> Self {
        Self(groups)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn groups(&self) -> &[Vec<Requisite>] {
        &self.0
    }

    /// Whether every AND-group has at least one satisfied alternative.
    ///
    /// Alternatives are tried in order and the first success ends the group;
    /// the first unsatisfied group ends the evaluation.
    pub fn is_cleared(&self, student: &Student) -> bool {
        self.0
            .iter()
            .all(|group| group.iter().any(|alternative| alternative.is_satisfied(student)))
    }

    /// The AND-groups the student has not satisfied yet, in order
    pub fn remaining(&self, student: &Student) -> Vec<&[Requisite]> {
        self.0
            .iter()
            .filter(|group| !group.iter().any(|alternative| alternative.is_satisfied(student)))
            .map(Vec::as_slice)
            .collect()
    }

    /// Keys of the courses that alternatives require, in order of appearance.
    /// Negated alternatives are left out.
    pub fn course_keys(&self) -> impl Iterator<Item = &str> {
        self.0
            .iter()
            .flatten()
            .filter(|alternative| !matches!(alternative, Requisite::Not(_)))
            .map(Requisite::course_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(s: &str) -> Requisite {
        s.parse().unwrap()
    }

    fn student_with(completed: &[(&str, &str)]) -> Student {
        let mut student = Student::default();
        for (key, grade) in completed {
            student.mark_completed(key, grade);
        }
        student
    }

    #[test]
    fn test_basic_parsing() {
        assert_eq!(req("CS141"), Requisite::Course("CS141".to_string()));
        assert_eq!(req(" cs 141 "), Requisite::Course("CS141".to_string()));
        assert_eq!(
            req("CS 143|c"),
            Requisite::MinGrade {
                course: "CS143".to_string(),
                grade: "C".to_string()
            }
        );
        assert_eq!(req("NO CS 141"), Requisite::Not("CS141".to_string()));
        assert!("".parse::<Requisite>().is_err());
        assert!("|C".parse::<Requisite>().is_err());
    }

    #[test]
    fn test_display_forms() {
        for form in ["CS141", "CS143|C", "NO CS141", "MATH2B|B-"] {
            assert_eq!(req(form).to_string(), form);
        }
    }

    #[test]
    fn test_alternative_evaluation() {
        let student = student_with(&[("CS141", "B")]);

        assert!(req("CS141").is_satisfied(&student));
        assert!(!req("CS142").is_satisfied(&student));
        assert!(req("CS141|C").is_satisfied(&student));
        assert!(req("CS141|B").is_satisfied(&student));
        assert!(!req("CS141|A").is_satisfied(&student));
        assert!(!req("NO CS141").is_satisfied(&student));
        assert!(req("NO CS142").is_satisfied(&student));
    }

    #[test]
    fn test_missing_grade_skips_check() {
        let student = student_with(&[("CS141", "")]);
        assert!(req("CS141|A").is_satisfied(&student));
    }

    #[test]
    fn test_cleared() {
        let prereqs = Prerequisites::new(vec![
            vec![req("CS141")],
            vec![req("CS142"), req("CS143|C")],
        ]);

        assert!(!prereqs.is_cleared(&student_with(&[("CS141", "A")])));
        assert!(prereqs.is_cleared(&student_with(&[("CS141", "A"), ("CS143", "C")])));
        assert!(!prereqs.is_cleared(&student_with(&[("CS141", "A"), ("CS143", "D")])));
        assert!(prereqs.is_cleared(&student_with(&[("CS141", "A"), ("CS142", "D")])));

        assert!(Prerequisites::default().is_cleared(&Student::default()));
    }

    #[test]
    fn test_cleared_is_monotonic_in_taken() {
        let prereqs = Prerequisites::new(vec![vec![req("CS141")], vec![req("CS142"), req("MATH2A")]]);
        let mut student = student_with(&[("CS141", "B"), ("MATH2A", "A")]);
        assert!(prereqs.is_cleared(&student));

        for extra in ["CS142", "CS161", "MATH2B"] {
            student.mark_completed(extra, "C");
            assert!(prereqs.is_cleared(&student));
        }
    }

    #[test]
    fn test_remaining() {
        let prereqs = Prerequisites::new(vec![
            vec![req("CS141")],
            vec![req("CS142"), req("CS143")],
            vec![req("MATH2A")],
        ]);
        let student = student_with(&[("CS142", "B")]);

        let remaining = prereqs.remaining(&student);
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0], &[req("CS141")][..]);
        assert_eq!(remaining[1], &[req("MATH2A")][..]);
    }

    #[test]
    fn test_course_keys_skip_negations() {
        let prereqs = Prerequisites::new(vec![
            vec![req("CS141|C"), req("CS142")],
            vec![req("NO CS161A")],
        ]);
        assert_eq!(prereqs.course_keys().collect::<Vec<_>>(), vec!["CS141", "CS142"]);
    }

    #[test]
    fn test_serializes_as_strings() {
        let prereqs = Prerequisites::new(vec![vec![req("CS141")], vec![req("CS142"), req("CS143|C")]]);
        let json = serde_json::to_string(&prereqs).unwrap();
        assert_eq!(json, r#"[["CS141"],["CS142","CS143|C"]]"#);

        let back: Prerequisites = serde_json::from_str(&json).unwrap();
        assert_eq!(back, prereqs);
    }
}
