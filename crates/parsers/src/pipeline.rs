//! Runs the document parsers in dependency order over one student's documents.
//!
//! The audit decides which departments matter, so it is parsed before the
//! prerequisite listings and schedules, which only enrich courses by key.

use crate::{
    audit::parse_audit,
    catalogue::{CatalogueSnapshot, parse_catalogue},
    error::{DocumentError, Result},
    listing::parse_listing,
    schedule::parse_schedule,
};
use log::{debug, info, warn};
use models::{
    course::{link_required_by, normalize_key},
    requisite::Requisite,
    student::Student,
    term::Term,
};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

const AUDIT_FILE: &str = "audit.xml";
const SNAPSHOT_FILE: &str = "catalogue.json";
const CATALOGUE_DIR: &str = "catalogue";
const PREREQUISITES_DIR: &str = "prerequisites";
const SCHEDULE_DIR: &str = "schedule";

/// Department documents keyed by normalized department code
pub type DepartmentDocuments = BTreeMap<String, String>;

/// Everything one planner run reads, already loaded into memory
#[derive(Debug, Clone, Default)]
pub struct Documents {
    pub snapshot: Option<CatalogueSnapshot>,
    pub catalogue: Vec<String>,
    pub audit: String,
    pub prerequisites: DepartmentDocuments,
    pub schedules: BTreeMap<Term, DepartmentDocuments>,
}

impl Documents {
    /// Reads the documents saved under `dir`
    ///
    /// Only `audit.xml` is required. The catalogue pages are skipped when a
    /// `catalogue.json` snapshot exists. Department files are keyed by their
    /// file stem, so `prerequisites/COMPSCI.html` holds the COMPSCI listing and
    /// `schedule/2017-92/COMPSCI.txt` its Fall 2017 schedule.
    ///
    /// # Arguments
    /// * `dir` - The documents directory
    /// * `terms` - Terms whose schedules should be read
    pub fn load(dir: &Path, terms: &[Term]) -> Result<Self> {
        let snapshot_path = dir.join(SNAPSHOT_FILE);
        let snapshot = if snapshot_path.is_file() {
            Some(CatalogueSnapshot::load(&snapshot_path)?)
        } else {
            None
        };

        let catalogue = match snapshot {
            Some(_) => Vec::new(),
            None => files_with_extension(&dir.join(CATALOGUE_DIR), "html")?
                .iter()
                .map(|path| read_document(path))
                .collect::<Result<_>>()?,
        };

        let mut schedules = BTreeMap::new();
        for term in terms {
            let term_dir = dir.join(SCHEDULE_DIR).join(term.to_string());
            schedules.insert(*term, read_departments(&term_dir, "txt")?);
        }

        Ok(Self {
            snapshot,
            catalogue,
            audit: read_document(&dir.join(AUDIT_FILE))?,
            prerequisites: read_departments(&dir.join(PREREQUISITES_DIR), "html")?,
            schedules,
        })
    }

    /// Folds the catalogue pages into a snapshot saved as `catalogue.json`
    /// under `dir`, so later runs skip parsing the pages
    ///
    /// Does nothing when there are no catalogue pages to fold.
    pub fn cache_catalogue(&mut self, dir: &Path, terms: &[Term]) -> Result<()> {
        if self.catalogue.is_empty() {
            return Ok(());
        }

        let snapshot = read_catalogue(self, terms);
        snapshot.save(&dir.join(SNAPSHOT_FILE))?;
        info!("Cached {} catalogue courses", snapshot.courses.len());

        self.snapshot = Some(snapshot);
        self.catalogue.clear();
        Ok(())
    }
}

fn read_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Files in `dir` with the given extension, sorted; empty if `dir` does not exist
fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        debug!("No document directory at {}", dir.display());
        return Ok(Vec::new());
    }

    let entries = fs::read_dir(dir).map_err(|source| DocumentError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == extension))
        .collect();
    files.sort();
    Ok(files)
}

fn read_departments(dir: &Path, extension: &str) -> Result<DepartmentDocuments> {
    files_with_extension(dir, extension)?
        .iter()
        .filter_map(|path| {
            let stem = path.file_stem()?.to_string_lossy();
            Some((normalize_key(&stem), path))
        })
        .map(|(department, path)| read_document(path).map(|text| (department, text)))
        .collect()
}

/// Parses every document and returns the populated student
///
/// A department document that cannot be parsed is logged and skipped; the
/// run only fails if the audit itself is unreadable.
///
/// # Arguments
/// * `documents` - The loaded documents
/// * `terms` - Terms to plan for; the snapshot's terms are used when empty
/// * `student_id` - Identifier overriding the one in the audit
pub fn run(documents: &Documents, terms: &[Term], student_id: Option<&str>) -> Result<Student> {
    let catalogue = read_catalogue(documents, terms);
    let mut student = Student::new(catalogue.courses, catalogue.terms);
    if let Some(id) = student_id {
        student.student_id = id.to_string();
    }

    let summary = parse_audit(&documents.audit, &mut student)?;

    for department in &summary.departments {
        match documents.prerequisites.get(department) {
            Some(html) => match parse_listing(html, &mut student.courses) {
                Ok(rows) => debug!("Read {rows} prerequisite rows for {department}"),
                Err(e) => warn!("Skipping prerequisites for {department}: {e}"),
            },
            None => debug!("No prerequisite listing for {department}"),
        }
    }

    for term in student.terms.clone() {
        let Some(listings) = documents.schedules.get(&term) else {
            continue;
        };
        for department in &summary.departments {
            let Some(text) = listings.get(department) else {
                continue;
            };
            match parse_schedule(term, text, &mut student.courses) {
                Ok(sections) => debug!("Read {sections} sections for {department} in {term}"),
                Err(e) => warn!("Skipping {term} schedule for {department}: {e}"),
            }
        }
    }

    link_required_by(&mut student.courses);
    info!(
        "Planned {} courses for {} terms",
        student.courses.len(),
        student.terms.len()
    );
    Ok(student)
}

/// The snapshot's courses with every catalogue page parsed on top
///
/// `terms` replace the snapshot's terms unless empty.
fn read_catalogue(documents: &Documents, terms: &[Term]) -> CatalogueSnapshot {
    let mut catalogue = documents.snapshot.clone().unwrap_or_default();

    for page in &documents.catalogue {
        if let Err(e) = parse_catalogue(page, &mut catalogue.courses) {
            warn!("Skipping catalogue page: {e}");
        }
    }
    info!("Catalogue provides {} courses", catalogue.courses.len());

    if !terms.is_empty() {
        catalogue.terms = terms.to_vec();
    }
    catalogue
}

/// Whether a course can be taken, and what is still missing otherwise
#[derive(Debug, Serialize)]
pub struct Eligibility<'a> {
    pub cleared: bool,
    pub missing: Vec<&'a [Requisite]>,
    pub offered: BTreeMap<&'static str, Vec<u16>>,
}

/// Completion of one rule of a degree block
#[derive(Debug, Serialize)]
pub struct RuleStatus<'a> {
    pub block: &'a str,
    pub rule: &'a str,
    pub completed: bool,
}

/// The student together with the derived eligibility and completion queries
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    #[serde(flatten)]
    pub student: &'a Student,
    pub class_level: Option<String>,
    pub standing: Option<String>,
    pub eligibility: BTreeMap<&'a str, Eligibility<'a>>,
    pub rules: Vec<RuleStatus<'a>>,
}

impl<'a> Report<'a> {
    pub fn new(student: &'a Student) -> Self {
        let eligibility = student
            .courses
            .iter()
            .map(|(key, course)| {
                let eligibility = Eligibility {
                    cleared: course.cleared_prereqs(student),
                    missing: course.prerequisites.remaining(student),
                    offered: course.terms_offered(),
                };
                (key.as_str(), eligibility)
            })
            .collect();

        let rules = student
            .blocks
            .iter()
            .flat_map(|block| {
                block.rules.iter().map(move |rule| RuleStatus {
                    block: block.title.as_str(),
                    rule: rule.label.as_str(),
                    completed: rule.is_completed(),
                })
            })
            .collect();

        Self {
            student,
            class_level: student.class_level().map(|level| level.to_string()),
            standing: student.standing().map(|standing| standing.to_string()),
            eligibility,
            rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::course::{Course, CourseMap};

    #[test]
    fn test_snapshot_terms_used_when_none_given() {
        let mut courses = CourseMap::new();
        courses.insert("CS141".into(), Course::new("CS", "141"));
        let documents = Documents {
            snapshot: Some(CatalogueSnapshot {
                terms: vec![Term::fall(2017), Term::winter(2018)],
                courses,
            }),
            audit: "<Report><Audit/></Report>".to_string(),
            ..Default::default()
        };

        let student = run(&documents, &[], Some("42")).unwrap();
        assert_eq!(student.terms, vec![Term::winter(2018), Term::fall(2017)]);
        assert_eq!(student.student_id, "42");
        assert!(student.courses.contains_key("CS141"));
    }

    const CATALOGUE_PAGE: &str = r#"
<h1>Computer Science (COMPSCI)</h1>
<div class="courseblock">
  <p class="courseblocktitle"><strong>COMPSCI&#160;161.  Design and Analysis of Algorithms.  4 Units.</strong></p>
  <div class="courseblockdesc"><p>Techniques for efficient algorithm design.</p></div>
</div>
"#;

    #[test]
    fn test_cached_catalogue_replaces_pages() {
        let dir = std::env::temp_dir().join(format!("planner-cache-{}", std::process::id()));
        fs::create_dir_all(dir.join(CATALOGUE_DIR)).unwrap();
        fs::write(dir.join(AUDIT_FILE), "<Report><Audit/></Report>").unwrap();
        fs::write(dir.join(CATALOGUE_DIR).join("compsci.html"), CATALOGUE_PAGE).unwrap();

        let mut documents = Documents::load(&dir, &[]).unwrap();
        assert_eq!(documents.catalogue.len(), 1);
        documents.cache_catalogue(&dir, &[Term::fall(2017)]).unwrap();
        assert!(documents.catalogue.is_empty());

        let reloaded = Documents::load(&dir, &[]).unwrap();
        fs::remove_dir_all(&dir).ok();

        assert!(reloaded.catalogue.is_empty());
        let snapshot = reloaded.snapshot.as_ref().unwrap();
        assert_eq!(snapshot.terms, vec![Term::fall(2017)]);
        assert_eq!(
            snapshot.courses["COMPSCI161"].title,
            "Design and Analysis of Algorithms"
        );

        let student = run(&reloaded, &[], None).unwrap();
        assert_eq!(student.terms, vec![Term::fall(2017)]);
        assert!(student.courses.contains_key("COMPSCI161"));
    }

    #[test]
    fn test_cache_without_pages_writes_nothing() {
        let dir = std::env::temp_dir().join(format!("planner-nocache-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let mut documents = Documents::default();
        documents.cache_catalogue(&dir, &[]).unwrap();
        let written = dir.join(SNAPSHOT_FILE).exists();
        fs::remove_dir_all(&dir).ok();

        assert!(!written);
        assert!(documents.snapshot.is_none());
    }

    #[test]
    fn test_unreadable_audit_fails_run() {
        let documents = Documents {
            audit: "<Report><Audit></Block></Report>".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            run(&documents, &[], None),
            Err(DocumentError::Xml(_))
        ));
    }

    #[test]
    fn test_load_requires_audit() {
        let dir = std::env::temp_dir().join(format!("planner-empty-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let err = Documents::load(&dir, &[]).unwrap_err();
        fs::remove_dir_all(&dir).ok();
        assert!(matches!(err, DocumentError::Io { .. }));
    }

    #[test]
    fn test_load_reads_department_files() {
        let dir = std::env::temp_dir().join(format!("planner-docs-{}", std::process::id()));
        let term_dir = dir.join(SCHEDULE_DIR).join("2017-92");
        fs::create_dir_all(&term_dir).unwrap();
        fs::create_dir_all(dir.join(PREREQUISITES_DIR)).unwrap();
        fs::write(dir.join(AUDIT_FILE), "<Report/>").unwrap();
        fs::write(dir.join(PREREQUISITES_DIR).join("i&c sci.html"), "<html/>").unwrap();
        fs::write(dir.join(PREREQUISITES_DIR).join("notes.txt"), "ignored").unwrap();
        fs::write(term_dir.join("COMPSCI.txt"), "listing").unwrap();

        let documents = Documents::load(&dir, &[Term::fall(2017)]).unwrap();
        fs::remove_dir_all(&dir).ok();

        assert_eq!(documents.audit, "<Report/>");
        assert!(documents.snapshot.is_none());
        assert!(documents.catalogue.is_empty());
        assert_eq!(
            documents.prerequisites.keys().collect::<Vec<_>>(),
            vec!["I&CSCI"]
        );
        assert_eq!(documents.schedules[&Term::fall(2017)]["COMPSCI"], "listing");
    }
}
