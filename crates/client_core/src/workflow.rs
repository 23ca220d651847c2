//! Create/read/update/delete cycle for one entity.
//!
//! An [`EntityWorkflow`] owns the record store, table state and form draft of
//! one entity type and drives the API gateway. Presentation code calls its
//! methods for row and form actions and listens to [`WorkflowEvent`]s for
//! state changes.

use std::{
    fmt,
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use shared::domain::RecordId;
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, info, warn};

use crate::{
    entities::{CourseEntity, Entity, StudentEntity},
    form::{FieldError, FieldValue, FormController, FormError},
    gateway::{EntityApi, GatewayError},
    store::RecordStore,
    table::{Table, TableView, DEFAULT_PAGE_SIZE},
};

const EVENT_CAPACITY: usize = 64;

pub type CourseWorkflow = EntityWorkflow<CourseEntity>;
pub type StudentWorkflow = EntityWorkflow<StudentEntity>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Fetch,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::List => "list",
            Self::Fetch => "fetch",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{entity} {operation} failed: {source}")]
    Gateway {
        entity: &'static str,
        operation: Operation,
        #[source]
        source: GatewayError,
    },
    #[error("no {entity} with id {id}")]
    NotFound { entity: &'static str, id: RecordId },
    #[error("{entity} record has no identifier")]
    MissingIdentifier { entity: &'static str },
}

/// What happens to the edit surface when a create or update call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitFailurePolicy {
    /// Log the failure and close the surface anyway.
    #[default]
    CloseSurface,
    /// Keep the surface open and raise the error for display.
    KeepOpen,
}

impl FromStr for SubmitFailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "close" | "close_surface" => Ok(Self::CloseSurface),
            "keep_open" | "keep-open" => Ok(Self::KeepOpen),
            other => Err(format!(
                "unknown submit failure policy {other:?} (expected close or keep_open)"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WorkflowOptions {
    pub page_size: usize,
    pub submit_failure: SubmitFailurePolicy,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            submit_failure: SubmitFailurePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceMode {
    Create,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    RecordsReloaded { count: usize },
    SurfaceOpened(SurfaceMode),
    SurfaceClosed,
    LoadingChanged(bool),
    ErrorRaised(String),
}

#[derive(Debug)]
pub enum SubmitOutcome<R> {
    /// Another submit or remove of this workflow is still in flight.
    Busy,
    /// The draft failed validation; nothing was sent.
    Invalid(Vec<FieldError>),
    Created(R),
    Updated(R),
    Failed(WorkflowError),
}

#[derive(Debug)]
pub enum RemoveOutcome {
    Busy,
    Removed(RecordId),
    Failed(WorkflowError),
}

struct WorkflowState<E: Entity> {
    store: RecordStore<E>,
    table: Table<E::Record>,
    form: FormController<E::Input>,
    surface: Option<SurfaceMode>,
    last_error: Option<String>,
}

struct LoadingGuard<'a> {
    flag: &'a AtomicBool,
    events: &'a broadcast::Sender<WorkflowEvent>,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        let _ = self.events.send(WorkflowEvent::LoadingChanged(false));
    }
}

pub struct EntityWorkflow<E: Entity> {
    api: Arc<dyn EntityApi<E>>,
    state: Mutex<WorkflowState<E>>,
    loading: AtomicBool,
    submit_failure: SubmitFailurePolicy,
    events: broadcast::Sender<WorkflowEvent>,
}

impl<E: Entity> EntityWorkflow<E> {
    pub fn new(api: Arc<dyn EntityApi<E>>, options: WorkflowOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            api,
            state: Mutex::new(WorkflowState {
                store: RecordStore::default(),
                table: Table::new(E::columns(), E::row_key).with_page_size(options.page_size),
                form: FormController::new(),
                surface: None,
                last_error: None,
            }),
            loading: AtomicBool::new(false),
            submit_failure: options.submit_failure,
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: WorkflowEvent) {
        let _ = self.events.send(event);
    }

    async fn raise(&self, err: &WorkflowError) {
        let message = err.to_string();
        self.state.lock().await.last_error = Some(message.clone());
        self.emit(WorkflowEvent::ErrorRaised(message));
    }

    fn try_start_loading(&self) -> Option<LoadingGuard<'_>> {
        self.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()?;
        self.emit(WorkflowEvent::LoadingChanged(true));
        Some(LoadingGuard {
            flag: &self.loading,
            events: &self.events,
        })
    }

    fn gateway_error(operation: Operation, source: GatewayError) -> WorkflowError {
        WorkflowError::Gateway {
            entity: E::LABEL,
            operation,
            source,
        }
    }

    /// Replaces the store with the server's current list. On failure the
    /// previous snapshot stays in place.
    pub async fn initialize(&self) -> Result<usize, WorkflowError> {
        match self.api.list().await {
            Ok(records) => {
                let count = records.len();
                {
                    let mut state = self.state.lock().await;
                    state.table.sync(&records);
                    state.store.replace(records);
                }
                info!(entity = E::LABEL, count, "records reloaded");
                self.emit(WorkflowEvent::RecordsReloaded { count });
                Ok(count)
            }
            Err(source) => {
                let err = Self::gateway_error(Operation::List, source);
                error!(entity = E::LABEL, error = %err, "failed to load records");
                self.raise(&err).await;
                Err(err)
            }
        }
    }

    /// Loads `row` into the form and opens the edit surface. Entities that
    /// re-fetch on edit read the current server copy first; if that read
    /// fails the listed row is used.
    pub async fn begin_edit(&self, row: &E::Record) {
        let mut input = E::to_input(row);
        if E::REFETCH_ON_EDIT {
            match E::record_id(row) {
                Some(id) => match self.api.get_one(id).await {
                    Ok(fresh) => input = E::to_input(&fresh),
                    Err(source) => {
                        let err = Self::gateway_error(Operation::Fetch, source);
                        warn!(entity = E::LABEL, %id, error = %err, "re-fetch before edit failed");
                        self.raise(&err).await;
                    }
                },
                None => warn!(entity = E::LABEL, "editing a record without identifier"),
            }
        }

        let mut state = self.state.lock().await;
        state.form.load(Some(&input));
        state.surface = Some(SurfaceMode::Edit);
        drop(state);
        self.emit(WorkflowEvent::SurfaceOpened(SurfaceMode::Edit));
    }

    pub async fn begin_edit_by_id(&self, id: &RecordId) -> Result<(), WorkflowError> {
        let row = self
            .state
            .lock()
            .await
            .store
            .find(id)
            .cloned()
            .ok_or_else(|| WorkflowError::NotFound {
                entity: E::LABEL,
                id: id.clone(),
            })?;
        self.begin_edit(&row).await;
        Ok(())
    }

    pub async fn begin_create(&self) {
        let mut state = self.state.lock().await;
        state.form.reset();
        state.surface = Some(SurfaceMode::Create);
        drop(state);
        self.emit(WorkflowEvent::SurfaceOpened(SurfaceMode::Create));
    }

    pub async fn set_field(&self, name: &str, raw: &str) -> Result<(), FormError> {
        self.state.lock().await.form.set_field(name, raw)
    }

    pub async fn close_surface(&self) {
        let closed = self.state.lock().await.surface.take().is_some();
        if closed {
            self.emit(WorkflowEvent::SurfaceClosed);
        }
    }

    /// Validates the draft and creates or updates depending on whether it
    /// carries an identifier, then reloads the list.
    pub async fn submit(&self) -> SubmitOutcome<E::Record> {
        let Some(_loading) = self.try_start_loading() else {
            warn!(entity = E::LABEL, "submit ignored while another action is in flight");
            return SubmitOutcome::Busy;
        };

        let validated = self.state.lock().await.form.validate();
        let input = match validated {
            Ok(input) => input,
            Err(errors) => {
                info!(entity = E::LABEL, failures = errors.len(), "validation failed");
                return SubmitOutcome::Invalid(errors);
            }
        };

        let result = match E::input_id(&input) {
            Some(id) => self
                .api
                .update(id, &input)
                .await
                .map(SubmitOutcome::Updated)
                .map_err(|source| Self::gateway_error(Operation::Update, source)),
            None => self
                .api
                .create(&input)
                .await
                .map(SubmitOutcome::Created)
                .map_err(|source| Self::gateway_error(Operation::Create, source)),
        };

        match result {
            Ok(outcome) => {
                info!(entity = E::LABEL, "record saved");
                self.state.lock().await.last_error = None;
                // A failed reload is already logged and raised by initialize.
                let _ = self.initialize().await;
                self.close_surface().await;
                outcome
            }
            Err(err) => {
                error!(entity = E::LABEL, error = %err, "failed to save record");
                self.raise(&err).await;
                if self.submit_failure == SubmitFailurePolicy::CloseSurface {
                    self.close_surface().await;
                }
                SubmitOutcome::Failed(err)
            }
        }
    }

    /// Deletes `row` and reloads the list. The edit surface is closed and the
    /// row leaves the selection whatever state they were in.
    pub async fn remove(&self, row: &E::Record) -> RemoveOutcome {
        let Some(_loading) = self.try_start_loading() else {
            warn!(entity = E::LABEL, "delete ignored while another action is in flight");
            return RemoveOutcome::Busy;
        };
        let Some(id) = E::record_id(row).cloned() else {
            return RemoveOutcome::Failed(WorkflowError::MissingIdentifier { entity: E::LABEL });
        };

        let result = self.api.delete(&id).await;
        {
            let mut state = self.state.lock().await;
            state.table.deselect_row(&E::row_key(row));
        }
        self.close_surface().await;

        match result {
            Ok(()) => {
                info!(entity = E::LABEL, %id, "record deleted");
                let _ = self.initialize().await;
                RemoveOutcome::Removed(id)
            }
            Err(source) => {
                let err = Self::gateway_error(Operation::Delete, source);
                error!(entity = E::LABEL, %id, error = %err, "failed to delete record");
                self.raise(&err).await;
                RemoveOutcome::Failed(err)
            }
        }
    }

    pub async fn remove_by_id(&self, id: &RecordId) -> RemoveOutcome {
        let row = self.state.lock().await.store.find(id).cloned();
        match row {
            Some(row) => self.remove(&row).await,
            None => RemoveOutcome::Failed(WorkflowError::NotFound {
                entity: E::LABEL,
                id: id.clone(),
            }),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub async fn surface(&self) -> Option<SurfaceMode> {
        self.state.lock().await.surface
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.lock().await.last_error.clone()
    }

    pub async fn records(&self) -> Vec<E::Record> {
        self.state.lock().await.store.snapshot()
    }

    pub async fn draft_identifier(&self) -> Option<RecordId> {
        self.state.lock().await.form.identifier().cloned()
    }

    pub async fn draft_value(&self, name: &str) -> Option<FieldValue> {
        self.state.lock().await.form.value(name).cloned()
    }

    /// Runs `f` against the table state and the current records.
    pub async fn with_table<T>(
        &self,
        f: impl FnOnce(&mut Table<E::Record>, &[E::Record]) -> T,
    ) -> T {
        let mut state = self.state.lock().await;
        let WorkflowState { table, store, .. } = &mut *state;
        f(table, store.records())
    }

    pub async fn view(&self) -> TableView {
        let state = self.state.lock().await;
        state.table.view(state.store.records())
    }
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
