//! In-process records API used by the HTTP-level tests.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};
use url::Url;

pub(crate) const STAMP: &str = "2024-03-04T10:00:00.000Z";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Clone, Default)]
pub(crate) struct Backend {
    collections: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    next_id: Arc<Mutex<u32>>,
}

type Rejection = (StatusCode, Json<Value>);

impl Backend {
    pub(crate) async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub(crate) async fn seed(&self, collection: &str, doc: Value) {
        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    async fn record(&self, method: &'static str, path: String, body: Option<Value>) {
        self.calls
            .lock()
            .await
            .push(RecordedCall { method, path, body });
    }

    async fn allocate_id(&self, collection: &str) -> String {
        let mut next = self.next_id.lock().await;
        *next += 1;
        format!("{}{}", &collection[..1], *next)
    }

    /// Replaces a student's course reference by the embedded course, the way
    /// the real server populates it on read.
    async fn expand(&self, collection: &str, mut doc: Value) -> Value {
        if collection != "students" {
            return doc;
        }
        let Some(course_id) = doc.get("enrollmentCourse").and_then(Value::as_str) else {
            return doc;
        };
        let collections = self.collections.lock().await;
        let course = collections
            .get("courses")
            .and_then(|courses| courses.iter().find(|course| course["_id"] == course_id))
            .cloned();
        if let Some(course) = course {
            doc["enrollmentCourse"] = course;
        }
        doc
    }
}

fn not_found(collection: &str, id: &str) -> Rejection {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "message": format!("{collection} {id} not found") })),
    )
}

async fn list_docs(
    State(backend): State<Backend>,
    Path(collection): Path<String>,
) -> Json<Vec<Value>> {
    backend.record("GET", format!("/{collection}"), None).await;
    let docs = backend
        .collections
        .lock()
        .await
        .get(&collection)
        .cloned()
        .unwrap_or_default();
    let mut expanded = Vec::with_capacity(docs.len());
    for doc in docs {
        expanded.push(backend.expand(&collection, doc).await);
    }
    Json(expanded)
}

async fn create_doc(
    State(backend): State<Backend>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    backend
        .record("POST", format!("/{collection}"), Some(body.clone()))
        .await;
    let mut doc = body;
    doc["_id"] = json!(backend.allocate_id(&collection).await);
    doc["createdAt"] = json!(STAMP);
    doc["updatedAt"] = json!(STAMP);
    backend.seed(&collection, doc.clone()).await;
    (StatusCode::CREATED, Json(doc))
}

async fn get_doc(
    State(backend): State<Backend>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>, Rejection> {
    backend
        .record("GET", format!("/{collection}/{id}"), None)
        .await;
    let doc = backend
        .collections
        .lock()
        .await
        .get(&collection)
        .and_then(|docs| docs.iter().find(|doc| doc["_id"] == id.as_str()))
        .cloned()
        .ok_or_else(|| not_found(&collection, &id))?;
    Ok(Json(backend.expand(&collection, doc).await))
}

async fn update_doc(
    State(backend): State<Backend>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, Rejection> {
    backend
        .record("PUT", format!("/{collection}/{id}"), Some(body.clone()))
        .await;
    let mut collections = backend.collections.lock().await;
    let doc = collections
        .get_mut(&collection)
        .and_then(|docs| docs.iter_mut().find(|doc| doc["_id"] == id.as_str()))
        .ok_or_else(|| not_found(&collection, &id))?;
    let created_at = doc["createdAt"].clone();
    let mut replaced = body;
    replaced["_id"] = json!(id);
    replaced["createdAt"] = created_at;
    replaced["updatedAt"] = json!(STAMP);
    *doc = replaced.clone();
    Ok(Json(replaced))
}

async fn delete_doc(
    State(backend): State<Backend>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<Value>, Rejection> {
    backend
        .record("DELETE", format!("/{collection}/{id}"), None)
        .await;
    let mut collections = backend.collections.lock().await;
    let docs = collections.entry(collection.clone()).or_default();
    let before = docs.len();
    docs.retain(|doc| doc["_id"] != id.as_str());
    if docs.len() == before {
        return Err(not_found(&collection, &id));
    }
    Ok(Json(json!({ "acknowledged": true, "deletedCount": 1 })))
}

/// Serves the records API on an ephemeral port, optionally below `prefix`
/// (e.g. `/api`), and returns its base URL.
pub(crate) async fn spawn_backend(prefix: &str) -> (Url, Backend) {
    let backend = Backend::default();
    let routes = Router::new()
        .route("/:collection", get(list_docs).post(create_doc))
        .route(
            "/:collection/:id",
            get(get_doc).put(update_doc).delete(delete_doc),
        )
        .with_state(backend.clone());
    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let url = Url::parse(&format!("http://{addr}{prefix}")).expect("base url");
    (url, backend)
}
