use serde_json::{json, Value};
use uuid::Uuid;

use super::types::SessionFilter;

/// Value bound to a positional `$n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Uuid(Uuid),
    Json(Value),
}

/// Compiles a `SessionFilter` into a parameterised WHERE clause for the
/// `attendance_sessions` table.
pub struct FilterWhere {
    param_values: Vec<SqlParam>,
    param_index: usize,
    conditions: Vec<String>,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    /// `starting_param_index` is the number of placeholders already used by the
    /// surrounding statement; the first generated one is `$starting+1`.
    pub fn generate(filter: &SessionFilter, starting_param_index: usize) -> (String, Vec<SqlParam>) {
        let mut filter_where = Self::new(starting_param_index);
        filter_where.build(filter)
    }

    fn build(&mut self, filter: &SessionFilter) -> (String, Vec<SqlParam>) {
        if let Some(class_id) = filter.class_id {
            let p = self.param(SqlParam::Uuid(class_id));
            self.conditions.push(format!("\"class_id\" = {}", p));
        }
        if let Some(subject_id) = filter.subject_id {
            let p = self.param(SqlParam::Uuid(subject_id));
            self.conditions.push(format!("\"subject_id\" = {}", p));
        }
        if let Some(student_id) = filter.student_id {
            let p = self.param(SqlParam::Json(json!([{ "studentId": student_id }])));
            self.conditions.push(format!("\"records\" @> {}::jsonb", p));
        }
        if filter.require_non_empty_records {
            self.conditions.push("jsonb_array_length(\"records\") > 0".to_string());
        }

        let where_clause = if self.conditions.is_empty() {
            "1=1".to_string()
        } else {
            self.conditions.join(" AND ")
        };
        (where_clause, std::mem::take(&mut self.param_values))
    }

    fn param(&mut self, value: SqlParam) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}
