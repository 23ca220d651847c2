use super::*;
use shared::protocol::{CourseInput, StudentInput};

fn fields(errors: &[FieldError]) -> Vec<&'static str> {
    errors.iter().map(|err| err.field).collect()
}

fn sample_student() -> StudentInput {
    StudentInput {
        id: Some(RecordId::from("s1")),
        enrollment_number: 42,
        fullname: "Ada Lovelace".into(),
        dateofbirth: NaiveDate::from_ymd_opt(1815, 12, 10).expect("date"),
        enrollment_course: RecordId::from("c1"),
        picture: Some("data:image/png;base64,AA==".into()),
        description: None,
    }
}

#[test]
fn reset_then_validate_lists_every_missing_required_field() {
    let mut form = FormController::<StudentInput>::new();
    form.reset();

    let errors = form.validate().expect_err("untouched draft must fail");
    assert_eq!(
        fields(&errors),
        vec!["enrollmentNumber", "fullname", "dateofbirth", "enrollmentCourse"]
    );
    assert!(errors
        .iter()
        .all(|err| err.reason == FieldErrorReason::Required));
}

#[test]
fn load_then_validate_returns_the_loaded_record() {
    let student = sample_student();
    let mut form = FormController::<StudentInput>::new();
    form.load(Some(&student));

    assert_eq!(form.identifier(), Some(&RecordId::from("s1")));
    assert_eq!(form.validate().expect("valid"), student);
}

#[test]
fn load_none_keeps_defaults() {
    let mut form = FormController::<CourseInput>::new();
    form.set_field("name", "Algebra").expect("set");
    form.load(None);

    assert_eq!(
        form.value("name"),
        Some(&FieldValue::Text("Algebra".into()))
    );
    assert_eq!(form.identifier(), None);
}

#[test]
fn reset_drops_identifier_after_load() {
    let mut form = FormController::<StudentInput>::new();
    form.load(Some(&sample_student()));
    form.reset();

    assert_eq!(form.identifier(), None);
    assert_eq!(form.value("fullname"), None);
}

#[test]
fn integer_fields_coerce_numeric_text() {
    let mut form = FormController::<CourseInput>::new();
    form.set_field("courseId", " 101 ").expect("set");
    form.set_field("name", "Algebra").expect("set");

    let course = form.validate().expect("valid");
    assert_eq!(
        course,
        CourseInput {
            id: None,
            course_id: 101,
            name: "Algebra".into(),
        }
    );
}

#[test]
fn empty_integer_input_is_unset_not_zero() {
    let mut form = FormController::<CourseInput>::new();
    form.set_field("courseId", "7").expect("set");
    form.set_field("courseId", "").expect("set");
    form.set_field("name", "Algebra").expect("set");

    assert_eq!(form.value("courseId"), None);
    let errors = form.validate().expect_err("courseId missing");
    assert_eq!(
        errors,
        vec![FieldError {
            field: "courseId",
            reason: FieldErrorReason::Required,
        }]
    );
}

#[test]
fn non_numeric_integer_input_fails_with_expected_integer() {
    let mut form = FormController::<CourseInput>::new();
    form.set_field("courseId", "abc").expect("set");
    form.set_field("name", "Algebra").expect("set");

    let errors = form.validate().expect_err("courseId invalid");
    assert_eq!(
        errors[0].reason,
        FieldErrorReason::Expected {
            kind: FieldKind::Integer,
            raw: "abc".into(),
        }
    );
    assert_eq!(errors[0].to_string(), "courseId expected integer, got \"abc\"");
}

#[test]
fn blank_required_text_is_missing() {
    let mut form = FormController::<CourseInput>::new();
    form.set_field("courseId", "1").expect("set");
    form.set_field("name", "   ").expect("set");

    let errors = form.validate().expect_err("blank name");
    assert_eq!(fields(&errors), vec!["name"]);
}

#[test]
fn dates_accept_calendar_and_rfc3339_input() {
    let mut form = FormController::<StudentInput>::new();
    form.set_field("dateofbirth", "2000-02-29").expect("set");
    assert_eq!(
        form.value("dateofbirth"),
        Some(&FieldValue::Date(
            NaiveDate::from_ymd_opt(2000, 2, 29).expect("date")
        ))
    );

    form.set_field("dateofbirth", "2001-03-04T00:00:00.000Z")
        .expect("set");
    assert_eq!(
        form.value("dateofbirth"),
        Some(&FieldValue::Date(
            NaiveDate::from_ymd_opt(2001, 3, 4).expect("date")
        ))
    );

    form.set_field("dateofbirth", "yesterday").expect("set");
    assert_eq!(
        form.value("dateofbirth"),
        Some(&FieldValue::Invalid("yesterday".into()))
    );
}

#[test]
fn optional_fields_treat_empty_input_as_unset() {
    let mut form = FormController::<StudentInput>::new();
    form.load(Some(&sample_student()));
    form.set_field("description", "").expect("set");
    form.set_field("picture", "").expect("set");

    let student = form.validate().expect("valid");
    assert_eq!(student.description, None);
    assert_eq!(student.picture, None);
}

#[test]
fn unknown_fields_are_rejected() {
    let mut form = FormController::<CourseInput>::new();
    let err = form.set_field("credits", "3").expect_err("unknown");
    assert!(matches!(err, FormError::UnknownField(name) if name == "credits"));
}

#[test]
fn defaults_are_restored_on_reset() {
    struct Tagged {
        tag: String,
    }

    impl FormRecord for Tagged {
        fn schema() -> Vec<FieldSpec> {
            vec![FieldSpec::required("tag", FieldKind::Text)
                .with_default(FieldValue::Text("general".into()))]
        }

        fn identifier(&self) -> Option<&RecordId> {
            None
        }

        fn to_fields(&self) -> Vec<(&'static str, FieldValue)> {
            vec![("tag", FieldValue::Text(self.tag.clone()))]
        }

        fn from_fields(_id: Option<RecordId>, fields: &ValidFields) -> Result<Self, FieldError> {
            Ok(Self {
                tag: fields.text("tag")?,
            })
        }
    }

    let mut form = FormController::<Tagged>::new();
    form.set_field("tag", "urgent").expect("set");
    form.reset();

    assert_eq!(form.validate().expect("default is valid").tag, "general");
}
