//! Per-entity descriptors that instantiate the generic table, form and
//! workflow for courses and students.

mod course;
mod student;

pub use course::CourseEntity;
pub use student::{course_options, CourseOption, StudentEntity};

use crate::{gateway::Resource, table::ColumnDescriptor};

pub trait Entity: Resource {
    /// Singular name used in log lines and errors.
    const LABEL: &'static str;
    /// Whether starting an edit re-reads the record from the server instead
    /// of trusting the listed row.
    const REFETCH_ON_EDIT: bool;

    fn columns() -> Vec<ColumnDescriptor<Self::Record>>;
    fn to_input(record: &Self::Record) -> Self::Input;

    fn row_key(record: &Self::Record) -> String {
        Self::record_id(record)
            .map(|id| id.to_string())
            .unwrap_or_default()
    }
}
