use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Multipart, Path, RawQuery, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// The only bearer token the mock accepts.
pub const VALID_TOKEN: &str = "abc123";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    pub id: Uuid,
    pub name: String,
    pub archived: bool,
}

#[derive(Deserialize)]
pub struct CreateItem {
    pub name: String,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Deserialize)]
pub struct UpdateItem {
    pub name: Option<String>,
    pub archived: Option<bool>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub status: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// What the server saw of a request; returned by `/echo`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct UploadedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub size: usize,
}

pub type Db = Arc<RwLock<HashMap<Uuid, Item>>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/echo", get(echo).post(echo).put(echo).delete(echo))
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", put(update_item).delete(delete_item))
        .route("/upload", post(upload))
        .route("/files/{name}", get(download))
        .route("/blobs/{size}", get(blob))
        .route("/forbidden", get(forbidden))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn envelope<T>(data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        status: "success".to_string(),
        data,
        pagination: None,
    })
}

fn header_text(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn require_bearer(headers: &HeaderMap) -> Result<(), StatusCode> {
    let expected = format!("Bearer {VALID_TOKEN}");
    match header_text(headers, header::AUTHORIZATION) {
        Some(value) if value == expected => Ok(()),
        other => {
            tracing::debug!(authorization = ?other, "rejecting request");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

async fn echo(RawQuery(query): RawQuery, headers: HeaderMap) -> Json<Echo> {
    Json(Echo {
        query,
        authorization: header_text(&headers, header::AUTHORIZATION),
        content_type: header_text(&headers, header::CONTENT_TYPE),
    })
}

async fn list_items(
    State(db): State<Db>,
    headers: HeaderMap,
) -> Result<Json<Envelope<Vec<Item>>>, StatusCode> {
    require_bearer(&headers)?;
    let items: Vec<Item> = db.read().await.values().cloned().collect();
    let total = items.len() as u64;
    Ok(Json(Envelope {
        status: "success".to_string(),
        data: items,
        pagination: Some(Pagination {
            page: 1,
            page_size: total.max(1),
            total_items: total,
            total_pages: 1,
        }),
    }))
}

async fn create_item(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateItem>,
) -> Result<(StatusCode, Json<Envelope<Item>>), StatusCode> {
    require_bearer(&headers)?;
    let item = Item {
        id: Uuid::new_v4(),
        name: input.name,
        archived: input.archived,
    };
    db.write().await.insert(item.id, item.clone());
    Ok((StatusCode::CREATED, envelope(item)))
}

async fn update_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(input): Json<UpdateItem>,
) -> Result<Json<Envelope<Item>>, StatusCode> {
    require_bearer(&headers)?;
    let mut items = db.write().await;
    let item = items.get_mut(&id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        item.name = name;
    }
    if let Some(archived) = input.archived {
        item.archived = archived;
    }
    Ok(envelope(item.clone()))
}

async fn delete_item(
    State(db): State<Db>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<StatusCode, StatusCode> {
    require_bearer(&headers)?;
    let mut items = db.write().await;
    items
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn upload(
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<Envelope<Vec<UploadedPart>>>, StatusCode> {
    require_bearer(&headers)?;
    let mut parts = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| StatusCode::BAD_REQUEST)?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(|_| StatusCode::BAD_REQUEST)?;
        parts.push(UploadedPart {
            name,
            file_name,
            size: bytes.len(),
        });
    }
    Ok(envelope(parts))
}

async fn download(Path(name): Path<String>) -> impl IntoResponse {
    let disposition = format!("attachment; filename=\"{name}\"");
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        format!("contents of {name}").into_bytes(),
    )
}

/// `size` bytes of filler, for downloads larger than a client's default cap.
async fn blob(Path(size): Path<usize>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"blob.bin\""),
        ],
        vec![b'x'; size],
    )
}

async fn forbidden() -> StatusCode {
    StatusCode::FORBIDDEN
}
