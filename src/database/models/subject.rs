use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A subject taught across classes. Assignment and exclusions reference
/// classes by name, not id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub assigned_classes: Vec<String>,
    pub excluded_students: Vec<ExclusionEntry>,
}

/// Students of one class (by name) who take no attendance in the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExclusionEntry {
    pub class_name: String,
    #[serde(default)]
    pub student_ids: Vec<Uuid>,
}

impl ExclusionEntry {
    pub fn excludes(&self, student_id: Uuid) -> bool {
        self.student_ids.contains(&student_id)
    }
}

impl Subject {
    pub fn new(owner_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_id,
            created_at: Utc::now(),
            assigned_classes: Vec::new(),
            excluded_students: Vec::new(),
        }
    }

    /// Exclusion entry for a class name, if any.
    pub fn exclusions_for(&self, class_name: &str) -> Option<&ExclusionEntry> {
        self.excluded_students
            .iter()
            .find(|entry| entry.class_name == class_name)
    }

    /// Rewrite every reference to `old` as `new`. Returns true when something changed.
    pub fn rename_class(&mut self, old: &str, new: &str) -> bool {
        let mut changed = false;

        for assigned in self.assigned_classes.iter_mut() {
            if assigned == old {
                *assigned = new.to_string();
                changed = true;
            }
        }
        for entry in self.excluded_students.iter_mut() {
            if entry.class_name == old {
                entry.class_name = new.to_string();
                changed = true;
            }
        }

        if changed {
            self.assigned_classes = dedup_names(std::mem::take(&mut self.assigned_classes));
            self.excluded_students = normalize_exclusions(std::mem::take(&mut self.excluded_students));
        }
        changed
    }

    /// Give `new` the same assignment and exclusions as `old` while leaving
    /// `old` in place, for when another class still answers to `old`.
    pub fn copy_class(&mut self, old: &str, new: &str) -> bool {
        let assigned = self.assigned_classes.iter().any(|name| name == old);
        let copied: Vec<ExclusionEntry> = self
            .excluded_students
            .iter()
            .filter(|entry| entry.class_name == old)
            .map(|entry| ExclusionEntry { class_name: new.to_string(), student_ids: entry.student_ids.clone() })
            .collect();

        if !assigned && copied.is_empty() {
            return false;
        }
        if assigned {
            self.assigned_classes.push(new.to_string());
        }
        self.excluded_students.extend(copied);
        self.assigned_classes = dedup_names(std::mem::take(&mut self.assigned_classes));
        self.excluded_students = normalize_exclusions(std::mem::take(&mut self.excluded_students));
        true
    }
}

/// Drop repeated class names, keeping first occurrence order.
pub fn dedup_names(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

/// Merge entries that share a class name and drop duplicate student ids so the
/// list behaves as a mapping from class name to a set of students.
pub fn normalize_exclusions(entries: Vec<ExclusionEntry>) -> Vec<ExclusionEntry> {
    let mut merged: Vec<ExclusionEntry> = Vec::with_capacity(entries.len());

    for entry in entries {
        let slot = match merged.iter().position(|e| e.class_name == entry.class_name) {
            Some(index) => index,
            None => {
                merged.push(ExclusionEntry {
                    class_name: entry.class_name.clone(),
                    student_ids: Vec::new(),
                });
                merged.len() - 1
            }
        };
        for id in entry.student_ids {
            if !merged[slot].student_ids.contains(&id) {
                merged[slot].student_ids.push(id);
            }
        }
    }

    merged
}
