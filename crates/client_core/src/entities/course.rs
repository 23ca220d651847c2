use shared::{
    domain::{Course, RecordId},
    protocol::CourseInput,
};

use crate::{
    form::{FieldError, FieldKind, FieldSpec, FieldValue, FormRecord, ValidFields},
    gateway::Resource,
    table::{CellValue, ColumnDescriptor},
};

use super::Entity;

pub struct CourseEntity;

impl Resource for CourseEntity {
    type Record = Course;
    type Input = CourseInput;

    const COLLECTION: &'static str = "courses";

    fn record_id(record: &Course) -> Option<&RecordId> {
        record.id.as_ref()
    }

    fn input_id(input: &CourseInput) -> Option<&RecordId> {
        input.id.as_ref()
    }
}

impl Entity for CourseEntity {
    const LABEL: &'static str = "course";
    const REFETCH_ON_EDIT: bool = true;

    fn columns() -> Vec<ColumnDescriptor<Course>> {
        vec![
            ColumnDescriptor::new("courseId", "Course Id", |course: &Course| {
                CellValue::Integer(course.course_id)
            }),
            ColumnDescriptor::new("name", "Name", |course: &Course| {
                CellValue::text(course.name.clone())
            }),
            ColumnDescriptor::new("createdAt", "Added on", |course: &Course| {
                course
                    .created_at
                    .map(CellValue::Timestamp)
                    .unwrap_or(CellValue::Empty)
            }),
        ]
    }

    fn to_input(record: &Course) -> CourseInput {
        CourseInput::from(record)
    }
}

impl FormRecord for CourseInput {
    fn schema() -> Vec<FieldSpec> {
        vec![
            FieldSpec::required("courseId", FieldKind::Integer),
            FieldSpec::required("name", FieldKind::Text),
        ]
    }

    fn identifier(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn to_fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("courseId", FieldValue::Integer(self.course_id)),
            ("name", FieldValue::Text(self.name.clone())),
        ]
    }

    fn from_fields(id: Option<RecordId>, fields: &ValidFields) -> Result<Self, FieldError> {
        Ok(Self {
            id,
            course_id: fields.integer("courseId")?,
            name: fields.text("name")?,
        })
    }
}
