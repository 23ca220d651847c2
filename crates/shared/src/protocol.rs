//! Request bodies sent on create and update.
//!
//! These are the editable projections of [`Course`] and [`Student`]; the
//! server-assigned timestamps never travel from the client.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Course, RecordId, Student};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseInput {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "courseId")]
    pub course_id: i64,
    pub name: String,
}

impl From<&Course> for CourseInput {
    fn from(course: &Course) -> Self {
        Self {
            id: course.id.clone(),
            course_id: course.course_id,
            name: course.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentInput {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(rename = "enrollmentNumber")]
    pub enrollment_number: i64,
    pub fullname: String,
    #[serde(with = "crate::dates::midnight_utc")]
    pub dateofbirth: NaiveDate,
    #[serde(rename = "enrollmentCourse")]
    pub enrollment_course: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&Student> for StudentInput {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id.clone(),
            enrollment_number: student.enrollment_number,
            fullname: student.fullname.clone(),
            dateofbirth: student.dateofbirth.date_naive(),
            enrollment_course: student
                .enrollment_course
                .as_ref()
                .map(|course| course.id().clone())
                .unwrap_or_else(|| RecordId::new("")),
            picture: student.picture.clone(),
            description: student.description.clone(),
        }
    }
}
