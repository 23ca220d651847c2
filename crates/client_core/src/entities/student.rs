use shared::{
    domain::{RecordId, Student},
    protocol::StudentInput,
};

use crate::{
    form::{FieldError, FieldKind, FieldSpec, FieldValue, FormRecord, ValidFields},
    gateway::{EntityApi, GatewayError, Resource},
    picture,
    table::{CellValue, ColumnDescriptor},
};

use super::{CourseEntity, Entity};

pub struct StudentEntity;

impl Resource for StudentEntity {
    type Record = Student;
    type Input = StudentInput;

    const COLLECTION: &'static str = "students";

    fn record_id(record: &Student) -> Option<&RecordId> {
        record.id.as_ref()
    }

    fn input_id(input: &StudentInput) -> Option<&RecordId> {
        input.id.as_ref()
    }
}

impl Entity for StudentEntity {
    const LABEL: &'static str = "student";
    // The listed row already carries the expanded course.
    const REFETCH_ON_EDIT: bool = false;

    fn columns() -> Vec<ColumnDescriptor<Student>> {
        vec![
            ColumnDescriptor::new("picture", "Picture", |student: &Student| {
                student
                    .picture
                    .as_deref()
                    .and_then(picture::data_uri_mime)
                    .map(CellValue::text)
                    .unwrap_or(CellValue::Empty)
            })
            .unsortable()
            .unfilterable()
            .with_renderer(|student: &Student| {
                match student.picture.as_deref().and_then(picture::data_uri_mime) {
                    Some(mime) => format!("[{mime}]"),
                    None => "-".to_string(),
                }
            }),
            ColumnDescriptor::new("enrollmentNumber", "Enrollment Number", |student: &Student| {
                CellValue::Integer(student.enrollment_number)
            }),
            ColumnDescriptor::new("fullname", "Name", |student: &Student| {
                CellValue::text(student.fullname.clone())
            }),
            ColumnDescriptor::new("enrollmentCourse", "Course", |student: &Student| {
                student
                    .enrollment_course
                    .as_ref()
                    .map(|course| CellValue::text(course.name()))
                    .unwrap_or(CellValue::Empty)
            }),
            ColumnDescriptor::new("dateofbirth", "DOB", |student: &Student| {
                CellValue::Date(student.dateofbirth.date_naive())
            }),
            ColumnDescriptor::new("createdAt", "Added on", |student: &Student| {
                student
                    .created_at
                    .map(CellValue::Timestamp)
                    .unwrap_or(CellValue::Empty)
            }),
        ]
    }

    fn to_input(record: &Student) -> StudentInput {
        StudentInput::from(record)
    }
}

impl FormRecord for StudentInput {
    fn schema() -> Vec<FieldSpec> {
        vec![
            FieldSpec::required("enrollmentNumber", FieldKind::Integer),
            FieldSpec::required("fullname", FieldKind::Text),
            FieldSpec::required("dateofbirth", FieldKind::Date),
            FieldSpec::required("enrollmentCourse", FieldKind::Text),
            FieldSpec::optional("picture", FieldKind::Blob),
            FieldSpec::optional("description", FieldKind::OptionalText),
        ]
    }

    fn identifier(&self) -> Option<&RecordId> {
        self.id.as_ref()
    }

    fn to_fields(&self) -> Vec<(&'static str, FieldValue)> {
        let mut fields = vec![
            ("enrollmentNumber", FieldValue::Integer(self.enrollment_number)),
            ("fullname", FieldValue::Text(self.fullname.clone())),
            ("dateofbirth", FieldValue::Date(self.dateofbirth)),
            (
                "enrollmentCourse",
                FieldValue::Text(self.enrollment_course.to_string()),
            ),
        ];
        if let Some(picture) = &self.picture {
            fields.push(("picture", FieldValue::Text(picture.clone())));
        }
        if let Some(description) = &self.description {
            fields.push(("description", FieldValue::Text(description.clone())));
        }
        fields
    }

    fn from_fields(id: Option<RecordId>, fields: &ValidFields) -> Result<Self, FieldError> {
        Ok(Self {
            id,
            enrollment_number: fields.integer("enrollmentNumber")?,
            fullname: fields.text("fullname")?,
            dateofbirth: fields.date("dateofbirth")?,
            enrollment_course: RecordId::new(fields.text("enrollmentCourse")?),
            picture: fields.optional_text("picture"),
            description: fields.optional_text("description"),
        })
    }
}

/// An entry of the student form's course select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseOption {
    pub id: RecordId,
    pub label: String,
}

/// Lists courses for the enrollment select. Courses the server returned
/// without an identifier cannot be referenced and are skipped.
pub async fn course_options(
    api: &dyn EntityApi<CourseEntity>,
) -> Result<Vec<CourseOption>, GatewayError> {
    let courses = api.list().await?;
    Ok(courses
        .iter()
        .filter_map(|course| {
            CourseEntity::record_id(course).map(|id| CourseOption {
                id: id.clone(),
                label: course.name.clone(),
            })
        })
        .collect())
}
