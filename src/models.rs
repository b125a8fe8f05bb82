use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Folder and file listing of a directory, relative to its root.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub folders: BTreeSet<String>,
    pub files: BTreeSet<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,

    #[serde(default)]
    pub created_at: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    pub missing_files: BTreeSet<String>,
    pub new_files: BTreeSet<String>,
    pub missing_folders: BTreeSet<String>,
    pub new_folders: BTreeSet<String>,
}

impl DiffResult {
    pub fn is_clean(&self) -> bool {
        self.missing_files.is_empty()
            && self.new_files.is_empty()
            && self.missing_folders.is_empty()
            && self.new_folders.is_empty()
    }

    /// Prompts and reports the operator sees, in order.
    ///
    /// The file offer only surfaces when nothing is missing; the folder offer
    /// is evaluated on its own, so both offers can appear in one run. Missing
    /// folders are never listed, they only suppress the file offer.
    pub fn steps(&self) -> Vec<Step> {
        let mut steps = Vec::new();

        if self.missing_files.is_empty() && self.missing_folders.is_empty() {
            if self.new_files.is_empty() && self.new_folders.is_empty() {
                steps.push(Step::NoChanges);
            } else if !self.new_files.is_empty() {
                steps.push(Step::OfferDeleteFiles(
                    self.new_files.iter().cloned().collect(),
                ));
            }
        }

        if !self.missing_files.is_empty() {
            steps.push(Step::ReportMissingFiles(
                self.missing_files.iter().cloned().collect(),
            ));
        }

        if !self.new_folders.is_empty() {
            steps.push(Step::OfferDeleteFolders(
                self.new_folders.iter().cloned().collect(),
            ));
        }

        steps
    }
}

/// A comparison together with when the compared snapshot was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Review {
    pub diff: DiffResult,
    /// Unix seconds; 0 when the manifest carries no timestamp.
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    NoChanges,
    OfferDeleteFiles(Vec<String>),
    ReportMissingFiles(Vec<String>),
    OfferDeleteFolders(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl DeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
