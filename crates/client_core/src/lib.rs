//! Client core of the registrar console: a generic table engine, form
//! controller and entity workflow, instantiated for courses and students
//! over the records REST API.

pub mod entities;
pub mod form;
pub mod gateway;
pub mod picture;
pub mod store;
pub mod table;
pub mod workflow;

pub use entities::{course_options, CourseEntity, CourseOption, Entity, StudentEntity};
pub use gateway::{EntityApi, GatewayError, HttpEntityApi, Resource};
pub use workflow::{
    CourseWorkflow, EntityWorkflow, RemoveOutcome, StudentWorkflow, SubmitFailurePolicy,
    SubmitOutcome, SurfaceMode, WorkflowError, WorkflowEvent, WorkflowOptions,
};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
