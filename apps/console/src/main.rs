mod commands;
mod config;
mod render;

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    course_options, picture, CourseEntity, CourseWorkflow, EntityWorkflow, HttpEntityApi,
    StudentEntity, StudentWorkflow, WorkflowEvent,
};
use shared::domain::RecordId;
use tokio::sync::broadcast;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::commands::ListQuery;

#[derive(Parser, Debug)]
#[command(name = "registrar", about = "Manage courses and students over the records API")]
struct Cli {
    /// Records API base URL; overrides the config file and environment.
    #[arg(long, global = true)]
    api_base_url: Option<String>,
    #[arg(long, global = true, default_value = "registrar.toml")]
    config: PathBuf,
    #[command(subcommand)]
    entity: EntityCommand,
}

#[derive(Subcommand, Debug)]
enum EntityCommand {
    Courses {
        #[command(subcommand)]
        action: CourseAction,
    },
    Students {
        #[command(subcommand)]
        action: StudentAction,
    },
}

#[derive(Subcommand, Debug)]
enum CourseAction {
    List(ListArgs),
    Create(CourseFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: CourseFields,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum StudentAction {
    List(ListArgs),
    Create(StudentFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: StudentFields,
    },
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Column to sort by; repeat to cycle ascending, descending, unsorted.
    #[arg(long = "sort")]
    sort: Vec<String>,
    /// `column=text`, keeps rows whose cell contains text.
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,
    #[arg(long, default_value_t = 1)]
    page: usize,
    #[arg(long)]
    page_size: Option<usize>,
    #[arg(long = "hide")]
    hide: Vec<String>,
    #[arg(long = "select")]
    select: Vec<String>,
}

impl From<ListArgs> for ListQuery {
    fn from(args: ListArgs) -> Self {
        Self {
            sort: args.sort,
            filters: args.filters,
            page: args.page,
            page_size: args.page_size,
            hide: args.hide,
            select: args.select,
        }
    }
}

#[derive(Args, Debug)]
struct CourseFields {
    #[arg(long)]
    course_id: Option<String>,
    #[arg(long)]
    name: Option<String>,
}

impl CourseFields {
    fn into_fields(self) -> Vec<(&'static str, String)> {
        [("courseId", self.course_id), ("name", self.name)]
            .into_iter()
            .filter_map(|(name, value)| value.map(|value| (name, value)))
            .collect()
    }
}

#[derive(Args, Debug)]
struct StudentFields {
    #[arg(long)]
    enrollment_number: Option<String>,
    #[arg(long)]
    fullname: Option<String>,
    /// Date of birth, `YYYY-MM-DD`.
    #[arg(long = "dob")]
    dateofbirth: Option<String>,
    /// Course id or course name.
    #[arg(long)]
    course: Option<String>,
    /// Image file stored as a data URI.
    #[arg(long)]
    picture: Option<PathBuf>,
    #[arg(long)]
    description: Option<String>,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(column, text)| (column.trim().to_string(), text.to_string()))
        .filter(|(column, _)| !column.is_empty())
        .ok_or_else(|| format!("expected column=text, got {raw:?}"))
}

fn log_events(label: &'static str, mut events: broadcast::Receiver<WorkflowEvent>) {
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            debug!(entity = label, ?event, "workflow event");
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let settings =
        config::load_settings(&cli.config)?.with_api_base_url(cli.api_base_url.as_deref())?;
    debug!(api_base_url = %settings.api_base_url, page_size = settings.page_size, "settings loaded");

    let courses_api = Arc::new(
        HttpEntityApi::<CourseEntity>::new(&settings.api_base_url)
            .context("failed to build course API client")?,
    );

    match cli.entity {
        EntityCommand::Courses { action } => {
            let workflow: CourseWorkflow =
                EntityWorkflow::new(courses_api, settings.workflow_options());
            log_events("course", workflow.subscribe_events());
            run_courses(&workflow, action).await
        }
        EntityCommand::Students { action } => {
            let students_api = Arc::new(
                HttpEntityApi::<StudentEntity>::new(&settings.api_base_url)
                    .context("failed to build student API client")?,
            );
            let workflow: StudentWorkflow =
                EntityWorkflow::new(students_api, settings.workflow_options());
            log_events("student", workflow.subscribe_events());
            run_students(&workflow, &courses_api, action).await
        }
    }
}

async fn run_courses(workflow: &CourseWorkflow, action: CourseAction) -> Result<()> {
    match action {
        CourseAction::List(args) => {
            let view = commands::list(workflow, &args.into()).await?;
            print!("{}", render::render_table(&view));
        }
        CourseAction::Create(fields) => {
            let course = commands::save(workflow, None, &fields.into_fields()).await?;
            println!(
                "created course {} ({} {})",
                commands::record_label::<CourseEntity>(&course),
                course.course_id,
                course.name
            );
        }
        CourseAction::Update { id, fields } => {
            let id = RecordId::new(id);
            let course = commands::save(workflow, Some(&id), &fields.into_fields()).await?;
            println!("updated course {id} ({} {})", course.course_id, course.name);
        }
        CourseAction::Delete { id } => {
            let id = RecordId::new(id);
            commands::delete(workflow, &id).await?;
            println!("deleted course {id}");
        }
    }
    Ok(())
}

async fn run_students(
    workflow: &StudentWorkflow,
    courses_api: &HttpEntityApi<CourseEntity>,
    action: StudentAction,
) -> Result<()> {
    match action {
        StudentAction::List(args) => {
            let view = commands::list(workflow, &args.into()).await?;
            print!("{}", render::render_table(&view));
        }
        StudentAction::Create(fields) => {
            let fields = student_fields(courses_api, fields).await?;
            let student = commands::save(workflow, None, &fields).await?;
            println!(
                "created student {} ({})",
                commands::record_label::<StudentEntity>(&student),
                student.fullname
            );
        }
        StudentAction::Update { id, fields } => {
            let id = RecordId::new(id);
            let fields = student_fields(courses_api, fields).await?;
            let student = commands::save(workflow, Some(&id), &fields).await?;
            println!("updated student {id} ({})", student.fullname);
        }
        StudentAction::Delete { id } => {
            let id = RecordId::new(id);
            commands::delete(workflow, &id).await?;
            println!("deleted student {id}");
        }
    }
    Ok(())
}

async fn student_fields(
    courses_api: &HttpEntityApi<CourseEntity>,
    fields: StudentFields,
) -> Result<Vec<(&'static str, String)>> {
    let mut out = Vec::new();
    if let Some(value) = fields.enrollment_number {
        out.push(("enrollmentNumber", value));
    }
    if let Some(value) = fields.fullname {
        out.push(("fullname", value));
    }
    if let Some(value) = fields.dateofbirth {
        out.push(("dateofbirth", value));
    }
    if let Some(wanted) = fields.course {
        let options = course_options(courses_api)
            .await
            .context("failed to load course options")?;
        let course = commands::resolve_course(&options, &wanted)?;
        out.push(("enrollmentCourse", course.to_string()));
    }
    if let Some(path) = fields.picture {
        out.push(("picture", picture::read_data_uri(&path).await?));
    }
    if let Some(value) = fields.description {
        out.push(("description", value));
    }
    Ok(out)
}
