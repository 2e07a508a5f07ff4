//! Loading prebuilt term dumps and the employee directory.
//!
//! A term dump is one JSON document per term:
//!
//! ```json
//! {
//!   "termId": "202110",
//!   "subjects": [{ "subject": "CS", "text": "Computer Science" }],
//!   "classes": [{ "host": "neu.edu", "termId": "202110", "subject": "CS", "classId": "2500", ... }],
//!   "sections": [{ "host": "neu.edu", "termId": "202110", "subject": "CS", "classId": "2500", "crn": "10001", ... }]
//! }
//! ```
//!
//! The employee file is a JSON object from employee ref to record.

use std::collections::HashMap;
use std::path::Path;

use course_search::types::{ClassDetail, EmployeeDetail, SectionDetail, Subject};
use course_search::{DataProvider, MemoryProvider, RecordRef};
use serde::{Deserialize, Serialize};

use crate::error::{HostError, Result};

/// One term's records as produced by the ingestion pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TermDump {
    pub term_id: String,
    #[serde(default)]
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub classes: Vec<ClassDetail>,
    #[serde(default)]
    pub sections: Vec<SectionDetail>,
}

impl TermDump {
    /// Read and parse a dump file.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Io`] if the file cannot be read and
    /// [`HostError::Dataset`] if it is not a valid dump.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let dump: Self = serde_json::from_str(&content)
            .map_err(|e| HostError::Dataset(format!("{}: {e}", path.display())))?;
        dump.check()?;
        Ok(dump)
    }

    /// Every record must belong to the dump's term.
    fn check(&self) -> Result<()> {
        if self.term_id.trim().is_empty() {
            return Err(HostError::Dataset("term dump has an empty termId".into()));
        }
        let foreign_class = self.classes.iter().find(|c| c.term_id != self.term_id);
        if let Some(class) = foreign_class {
            return Err(HostError::Dataset(format!(
                "class {} {} is in term {}, dump is for term {}",
                class.subject, class.class_id, class.term_id, self.term_id
            )));
        }
        let foreign_section = self.sections.iter().find(|s| s.term_id != self.term_id);
        if let Some(section) = foreign_section {
            return Err(HostError::Dataset(format!(
                "section {} is in term {}, dump is for term {}",
                section.crn, section.term_id, self.term_id
            )));
        }
        Ok(())
    }

    /// Add this term's records to `provider`.
    pub fn load_into(self, provider: &mut MemoryProvider) {
        let Self {
            term_id,
            subjects,
            classes,
            sections,
        } = self;
        provider.add_term(&term_id);
        for subject in subjects {
            provider.add_subject(&term_id, subject);
        }
        for class in classes {
            provider.add_class(class);
        }
        for section in sections {
            provider.add_section(section);
        }
    }
}

/// Load every dump into one provider.
///
/// # Errors
///
/// Fails on the first dump that cannot be read or parsed, or when two dumps
/// claim the same term.
pub fn load_provider(paths: &[impl AsRef<Path>]) -> Result<MemoryProvider> {
    let mut provider = MemoryProvider::new();
    for path in paths {
        let path = path.as_ref();
        let dump = TermDump::from_file(path)?;
        if provider.has_term(&dump.term_id) {
            return Err(HostError::Dataset(format!(
                "term {} is loaded twice (again from {})",
                dump.term_id,
                path.display()
            )));
        }
        tracing::info!(
            term_id = %dump.term_id,
            subjects = dump.subjects.len(),
            classes = dump.classes.len(),
            sections = dump.sections.len(),
            "loaded term dump"
        );
        dump.load_into(&mut provider);
    }
    Ok(provider)
}

/// Load the employee directory.
///
/// # Errors
///
/// Returns [`HostError::Io`] if the file cannot be read and
/// [`HostError::Dataset`] if it is not a JSON object of employees.
pub fn load_employees(path: &Path) -> Result<HashMap<RecordRef, EmployeeDetail>> {
    let content = std::fs::read_to_string(path)?;
    let employees: HashMap<RecordRef, EmployeeDetail> = serde_json::from_str(&content)
        .map_err(|e| HostError::Dataset(format!("{}: {e}", path.display())))?;
    tracing::info!(count = employees.len(), "loaded employee directory");
    Ok(employees)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"{
        "termId": "202110",
        "subjects": [
            { "subject": "CS", "text": "Computer Science" },
            { "subject": "MATH", "text": "Mathematics" }
        ],
        "classes": [
            {
                "host": "neu.edu", "termId": "202110", "subject": "CS", "classId": "2500",
                "name": "Fundamentals of Computer Science 1",
                "maxCredits": 4, "minCredits": 4, "crns": ["10001", "10002"]
            }
        ],
        "sections": [
            {
                "host": "neu.edu", "termId": "202110", "subject": "CS", "classId": "2500",
                "crn": "10001", "seatsCapacity": 80, "seatsRemaining": 12,
                "online": false, "profs": ["Ada Lovelace"]
            }
        ]
    }"#;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).expect("write");
        path
    }

    #[test]
    fn loads_a_term_dump() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "202110.json", DUMP);

        let provider = load_provider(&[path]).expect("load");
        assert!(provider.has_term("202110"));
        assert_eq!(provider.subjects("202110").len(), 2);
        assert_eq!(provider.classes_in_subject("CS", "202110").len(), 1);
        assert_eq!(provider.section_count(), 1);
    }

    #[test]
    fn duplicate_term_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = write(dir.path(), "a.json", DUMP);
        let b = write(dir.path(), "b.json", DUMP);
        assert!(matches!(load_provider(&[a, b]), Err(HostError::Dataset(_))));
    }

    #[test]
    fn records_from_another_term_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dump = DUMP.replacen("\"termId\": \"202110\"", "\"termId\": \"202130\"", 1);
        let path = write(dir.path(), "bad.json", &dump);
        let err = TermDump::from_file(&path).expect_err("mismatched term");
        assert!(err.to_string().contains("dump is for term 202130"));
    }

    #[test]
    fn malformed_dump_is_a_dataset_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(dir.path(), "broken.json", "{ \"termId\": ");
        assert!(matches!(TermDump::from_file(&path), Err(HostError::Dataset(_))));
    }

    #[test]
    fn missing_dump_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = TermDump::from_file(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(HostError::Io(_))));
    }

    #[test]
    fn loads_employees_by_ref() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write(
            dir.path(),
            "employees.json",
            r#"{ "emp/1": { "id": "1", "name": "Grace Hopper", "emails": ["g.hopper@northeastern.edu"] } }"#,
        );
        let employees = load_employees(&path).expect("load");
        let hopper = employees.get(&RecordRef::new("emp/1")).expect("present");
        assert_eq!(hopper.name, "Grace Hopper");
        assert_eq!(hopper.emails.len(), 1);
    }
}
