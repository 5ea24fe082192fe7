//! Parser for the degree-audit XML document.
//!
//! The audit is read into a small element tree first; the walk over blocks,
//! rules and requirements then only borrows from that tree. Blocks whose kind
//! is not understood are skipped so that a partial audit still yields a
//! usable [`Student`].

use crate::{error::Result, util::parse_or_default};
use log::{debug, info, warn};
use models::{
    course::{Course, course_key, normalize_key},
    grade,
    requirement::{Block, BlockKind, Requirement, Rule},
    student::Student,
};
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use std::{
    collections::{BTreeMap, BTreeSet},
    str::FromStr,
};

/// Side output of an audit parse
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditSummary {
    /// Normalized codes of the departments the audit references; their
    /// prerequisite listings and schedules are needed to evaluate eligibility
    pub departments: BTreeSet<String>,
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: BTreeMap<String, String>,
    children: Vec<Element>,
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let mut attributes = BTreeMap::new();
        for attr in start.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            attributes.insert(key, attr.unescape_value()?.into_owned());
        }

        Ok(Self {
            name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
            attributes,
            children: Vec::new(),
        })
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Attribute value, or an empty string when absent
    fn attr_or_empty(&self, name: &str) -> &str {
        self.attr(name).map(str::trim).unwrap_or_default()
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|child| child.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == name)
    }
}

/// Reads the whole document into an element tree rooted at a synthetic node
///
/// Elements still open at the end of input are closed implicitly.
fn read_tree(xml: &str) -> Result<Element> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack = vec![Element::default()];
    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(Element::from_start(&start)?),
            Event::Empty(start) => {
                let element = Element::from_start(&start)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(element);
                }
            }
            Event::End(_) => close_element(&mut stack),
            Event::Eof => break,
            _ => {}
        }
    }

    while stack.len() > 1 {
        close_element(&mut stack);
    }
    Ok(stack.pop().unwrap_or_default())
}

fn close_element(stack: &mut Vec<Element>) {
    if stack.len() < 2 {
        return;
    }
    if let Some(element) = stack.pop()
        && let Some(parent) = stack.last_mut()
    {
        parent.children.push(element);
    }
}

/// A class reference as it appears in advice and applied-class lists
struct ClassRef<'a> {
    department: &'a str,
    number: &'a str,
    title: &'a str,
}

impl ClassRef<'_> {
    fn key(&self) -> String {
        course_key(self.department, self.number)
    }
}

/// State shared by every rule of one audit walk
struct AuditWalk<'s> {
    student: &'s mut Student,
    /// Keys of classes the student is currently enrolled in
    enrolled: BTreeSet<String>,
    summary: AuditSummary,
}

impl AuditWalk<'_> {
    /// Inserts the referenced course if missing and offers it the title
    fn register(&mut self, class: &ClassRef<'_>) -> String {
        let key = class.key();
        self.student
            .courses
            .entry(key.clone())
            .or_insert_with(|| Course::new(class.department, class.number))
            .enrich_title(class.title);
        self.summary
            .departments
            .insert(normalize_key(class.department));
        key
    }

    fn parse_block(&mut self, kind: BlockKind, block: &Element) -> Block {
        let rules = block
            .children_named("Rule")
            .map(|rule| self.parse_rule(rule))
            .collect();

        Block {
            kind,
            title: block.attr_or_empty("Title").to_string(),
            rules,
        }
    }

    /// A rule with nested rules becomes a group with one requirement per nested
    /// rule; a plain rule becomes a single requirement that must be met
    fn parse_rule(&mut self, rule: &Element) -> Rule {
        let label = rule.attr_or_empty("Label").to_string();
        let nested: Vec<&Element> = rule.children_named("Rule").collect();

        if nested.is_empty() {
            return Rule {
                label,
                required: 1,
                requirements: vec![self.parse_requirement(rule, None)],
            };
        }

        let required = rule
            .child("Requirement")
            .and_then(|requirement| requirement.attr("NumGroups"))
            .and_then(|groups| groups.trim().parse().ok())
            .unwrap_or(nested.len());

        let requirements = nested
            .into_iter()
            .map(|inner| {
                let inner_label = Some(inner.attr_or_empty("Label"))
                    .filter(|l| !l.is_empty())
                    .map(str::to_string);
                self.parse_requirement(inner, inner_label)
            })
            .collect();

        Rule {
            label,
            required,
            requirements,
        }
    }

    fn parse_requirement(&mut self, rule: &Element, label: Option<String>) -> Requirement {
        let mut requirement = Requirement {
            label,
            ..Default::default()
        };

        let advice = rule.child("Advice");
        if let Some(advice) = advice {
            requirement.remaining = parse_or_default(advice.attr("Classes"));
            for course in advice.children_named("Course") {
                let class = ClassRef {
                    department: course.attr_or_empty("Disc"),
                    number: course.attr_or_empty("Num"),
                    title: course.attr_or_empty("Title"),
                };
                if class.department.is_empty() || class.number.is_empty() {
                    debug!("Skipping advised course without a designator");
                    continue;
                }
                let key = self.register(&class);
                if !requirement.options.contains(&key) {
                    requirement.options.push(key);
                }
            }
        }

        if let Some(applied) = rule.child("ClassesApplied") {
            for class in applied.children_named("Class") {
                self.apply_class(class, &mut requirement);
            }
        }

        let static_count = rule
            .child("Requirement")
            .and_then(|r| r.attr("Classes_begin"))
            .and_then(|count| count.trim().parse().ok());
        requirement.required = match (static_count, advice) {
            (Some(count), _) => count,
            (None, Some(_)) => requirement.remaining + requirement.completed.len(),
            (None, None) => 1,
        };

        requirement
    }

    /// Records one applied class against the requirement
    ///
    /// In-progress classes the student is enrolled in this term only enrich the
    /// course title. Other in-progress markers are not reliable, so those
    /// classes count as completed, without a grade.
    fn apply_class(&mut self, class: &Element, requirement: &mut Requirement) {
        let reference = ClassRef {
            department: class.attr_or_empty("Discipline"),
            number: class.attr_or_empty("Number"),
            title: class.attr_or_empty("Course_title"),
        };
        if reference.department.is_empty() || reference.number.is_empty() {
            debug!("Skipping applied class without a designator");
            return;
        }

        let grade = class.attr_or_empty("Letter_grade");
        let in_progress =
            class.attr_or_empty("In_progress").eq_ignore_ascii_case("Y") || grade::is_in_progress(grade);
        let key = self.register(&reference);

        if !in_progress {
            self.student.mark_completed(&key, grade);
            requirement.complete(&key);
        } else if !self.enrolled.contains(&key) {
            self.student.mark_completed(&key, "");
            requirement.complete(&key);
        }
    }
}

/// Sets GPA, completion and credits, then marks the derived standing keys
fn apply_degree(student: &mut Student, block: &Element) {
    student.gpa = parse_or_default(block.attr("GPA"));
    student.percent_complete = parse_or_default(block.attr("Per_complete"));
    student.credits_applied = parse_or_default(block.attr("Credits_applied"));
    student.mark_standing();
}

/// Copies identity fields from the header; a student id already set by the
/// caller is kept
fn apply_header(student: &mut Student, header: &Element) {
    if student.student_id.is_empty() {
        student.student_id = header.attr_or_empty("Stu_id").to_string();
    }
    student.name = header.attr_or_empty("Stu_name").to_string();
    student.email = header.attr_or_empty("Stu_email").to_string();
}

/// Keys of the classes listed under the audit's current-enrollment element
fn enrollment_index(audit: &Element) -> BTreeSet<String> {
    audit
        .child("In_progress")
        .into_iter()
        .flat_map(|index| index.children_named("Class"))
        .map(|class| course_key(class.attr_or_empty("Discipline"), class.attr_or_empty("Number")))
        .collect()
}

/// Parses a degree audit into `student`
///
/// `DEGREE` blocks set the GPA and credit figures, `MAJOR` and `MINOR` blocks
/// are decomposed into rules and requirements. Every advised or applied course
/// is inserted into the student's course map.
///
/// # Arguments
/// * `xml` - The audit document
/// * `student` - The student to populate; its course map is enriched in place
///
/// # Returns
/// The departments referenced by the audit, or [`crate::error::DocumentError::Xml`]
/// if the document is not well-formed
pub fn parse_audit(xml: &str, student: &mut Student) -> Result<AuditSummary> {
    let tree = read_tree(xml)?;
    let Some(audit) = tree.child("Report").and_then(|report| report.child("Audit")) else {
        warn!("Audit document has no Report/Audit element");
        return Ok(AuditSummary::default());
    };

    if let Some(header) = audit.child("AuditHeader") {
        apply_header(student, header);
    }

    let mut walk = AuditWalk {
        student,
        enrolled: enrollment_index(audit),
        summary: AuditSummary::default(),
    };

    for block in audit.children_named("Block") {
        let req_type = block.attr_or_empty("Req_type");
        match req_type {
            "DEGREE" => apply_degree(walk.student, block),
            "PROGRAM" => warn!(
                "Skipping PROGRAM block {:?}: program requirements are not modelled",
                block.attr_or_empty("Title")
            ),
            _ => match BlockKind::from_str(req_type) {
                Ok(kind) => {
                    let parsed = walk.parse_block(kind, block);
                    walk.student.blocks.push(parsed);
                }
                Err(_) => debug!("Skipping audit block of type {req_type:?}"),
            },
        }
    }

    info!(
        "Parsed audit with {} blocks across {} departments",
        walk.student.blocks.len(),
        walk.summary.departments.len()
    );
    Ok(walk.summary)
}
