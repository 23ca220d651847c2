//! Workflow-driven implementations of the list, save and delete commands.

use anyhow::{anyhow, bail, Context, Result};
use client_core::{
    table::{ColumnFilter, TableView},
    CourseOption, Entity, EntityWorkflow, RemoveOutcome, SubmitOutcome,
};
use shared::domain::RecordId;

use crate::render::describe_field_errors;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub sort: Vec<String>,
    pub filters: Vec<(String, String)>,
    /// 1-based page number.
    pub page: usize,
    pub page_size: Option<usize>,
    pub hide: Vec<String>,
    pub select: Vec<String>,
}

pub async fn list<E: Entity>(workflow: &EntityWorkflow<E>, query: &ListQuery) -> Result<TableView> {
    workflow
        .initialize()
        .await
        .with_context(|| format!("failed to load {} records", E::LABEL))?;

    workflow
        .with_table(|table, records| -> Result<()> {
            if let Some(page_size) = query.page_size {
                table.set_page_size(page_size);
            }
            for column in &query.sort {
                if !table.toggle_sort(column) {
                    bail!("cannot sort {} records by column '{column}'", E::LABEL);
                }
            }
            for (column, needle) in &query.filters {
                if !table.set_filter(column, ColumnFilter::Contains(needle.clone())) {
                    bail!("cannot filter {} records by column '{column}'", E::LABEL);
                }
            }
            for column in &query.hide {
                if !table.set_column_visibility(column, false) {
                    bail!("cannot hide column '{column}'");
                }
            }
            for key in &query.select {
                if !records.iter().any(|record| E::row_key(record) == *key) {
                    bail!("no {} with id {key}", E::LABEL);
                }
                if !table.is_selected(key) {
                    table.toggle_row_selected(key);
                }
            }
            table.set_page_index(query.page.saturating_sub(1), records);
            Ok(())
        })
        .await?;

    Ok(workflow.view().await)
}

/// Creates a record when `id` is `None`, otherwise loads the existing record
/// and overwrites only the given fields before submitting.
pub async fn save<E: Entity>(
    workflow: &EntityWorkflow<E>,
    id: Option<&RecordId>,
    fields: &[(&'static str, String)],
) -> Result<E::Record> {
    match id {
        Some(id) => {
            workflow
                .initialize()
                .await
                .with_context(|| format!("failed to load {} records", E::LABEL))?;
            workflow.begin_edit_by_id(id).await?;
        }
        None => workflow.begin_create().await,
    }

    for (name, raw) in fields {
        workflow.set_field(name, raw).await?;
    }

    match workflow.submit().await {
        SubmitOutcome::Created(record) | SubmitOutcome::Updated(record) => Ok(record),
        SubmitOutcome::Invalid(errors) => Err(anyhow!(
            "{} is invalid:\n{}",
            E::LABEL,
            describe_field_errors(&errors)
        )),
        SubmitOutcome::Failed(err) => Err(err.into()),
        SubmitOutcome::Busy => bail!("another {} action is in flight", E::LABEL),
    }
}

pub async fn delete<E: Entity>(workflow: &EntityWorkflow<E>, id: &RecordId) -> Result<()> {
    workflow
        .initialize()
        .await
        .with_context(|| format!("failed to load {} records", E::LABEL))?;

    match workflow.remove_by_id(id).await {
        RemoveOutcome::Removed(_) => Ok(()),
        RemoveOutcome::Failed(err) => Err(err.into()),
        RemoveOutcome::Busy => bail!("another {} action is in flight", E::LABEL),
    }
}

/// Resolves `wanted` against the course select, by identifier first and then
/// by case-insensitive course name.
pub fn resolve_course(options: &[CourseOption], wanted: &str) -> Result<RecordId> {
    let wanted = wanted.trim();
    if let Some(option) = options.iter().find(|option| option.id.as_str() == wanted) {
        return Ok(option.id.clone());
    }

    let mut by_name = options
        .iter()
        .filter(|option| option.label.eq_ignore_ascii_case(wanted));
    match (by_name.next(), by_name.next()) {
        (Some(option), None) => Ok(option.id.clone()),
        (Some(_), Some(_)) => bail!("course name '{wanted}' is ambiguous, pass its id"),
        (None, _) => {
            let known = options
                .iter()
                .map(|option| format!("{} ({})", option.id, option.label))
                .collect::<Vec<_>>()
                .join(", ");
            bail!("unknown course '{wanted}'; available: {known}")
        }
    }
}

pub fn record_label<E: Entity>(record: &E::Record) -> String {
    E::record_id(record)
        .map(ToString::to_string)
        .unwrap_or_else(|| "<no id>".to_string())
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
