use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// A set of course options of which `required` must be completed
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    /// Label of the nested rule this requirement came from, if any
    pub label: Option<String>,
    pub required: usize,
    /// How many classes the audit still advises taking
    pub remaining: usize,
    pub options: Vec<String>,
    pub completed: Vec<String>,
}

impl Requirement {
    pub fn is_completed(&self) -> bool {
        self.completed.len() >= self.required
    }

    /// Records a completed course key once
    pub fn complete(&mut self, key: &str) {
        if !self.completed.iter().any(|k| k == key) {
            self.completed.push(key.to_string());
        }
    }
}

/// A labelled group of requirements of which `required` must be satisfied
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub label: String,
    pub required: usize,
    pub requirements: Vec<Requirement>,
}

impl Rule {
    /// Counts satisfied requirements in order, stopping once the threshold is met.
    /// A rule requiring nothing is always complete.
    pub fn is_completed(&self) -> bool {
        self.requirements
            .iter()
            .filter(|requirement| requirement.is_completed())
            .take(self.required)
            .count()
            == self.required
    }
}

/// The degree program components the audit decomposes into rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum BlockKind {
    Major,
    Minor,
}

/// One degree program component (a major or a minor) and its rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub title: String,
    pub rules: Vec<Rule>,
}

impl Block {
    pub fn is_completed(&self) -> bool {
        self.rules.iter().all(Rule::is_completed)
    }
}
