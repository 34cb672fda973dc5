//! Routes serving one kind of record straight from the store.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use diesel::SqliteConnection;
use serde::Serialize;

use crate::{
    api::with_conn,
    ids::is_valid_id,
    record::Record,
    state::DbPool,
    store::RecordStore,
    util_resp::{ApiResponse, err_not_found, unprocessable},
    validation::{ErrorCode, validate_records},
};

#[derive(Serialize, Debug)]
pub struct Deleted {
    pub deleted: usize,
}

/// `GET`, `POST`, `PUT` and `DELETE` routes for `R` under `/{R::PATH}`.
pub fn routes<R>() -> Router<DbPool>
where
    R: Record,
    SqliteConnection: RecordStore<R>,
{
    let path = R::PATH;
    Router::new()
        .route(&format!("/{path}"), post(post_record::<R>))
        .route(&format!("/{path}/many"), post(post_records::<R>))
        .route(
            &format!("/{path}/parent/:parent_id"),
            get(get_records::<R>).delete(delete_records::<R>),
        )
        .route(
            &format!("/{path}/:id"),
            get(get_record::<R>)
                .put(put_record::<R>)
                .delete(delete_record::<R>),
        )
}

async fn get_record<R>(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
) -> ApiResponse<Json<R>>
where
    R: Record,
    SqliteConnection: RecordStore<R>,
{
    if !R::accepts_id(&id) {
        return err_not_found();
    }
    let record =
        with_conn(pool, move |conn| RecordStore::<R>::get(conn, &id)).await?;
    Ok(Json(record))
}

async fn get_records<R>(
    State(pool): State<DbPool>,
    Path(parent_id): Path<String>,
) -> ApiResponse<Json<Vec<R>>>
where
    R: Record,
    SqliteConnection: RecordStore<R>,
{
    if !is_valid_id(&parent_id, R::PARENT_KIND) {
        return err_not_found();
    }
    let records = with_conn(pool, move |conn| {
        RecordStore::<R>::get_many(conn, &parent_id)
    })
    .await?;
    Ok(Json(records))
}

async fn post_record<R>(
    State(pool): State<DbPool>,
    Json(record): Json<R>,
) -> ApiResponse<(StatusCode, Json<R>)>
where
    R: Record,
    SqliteConnection: RecordStore<R>,
{
    let record = record.sanitized();
    let code = record.validate();
    if !code.is_ok() {
        return unprocessable(code);
    }

    let stored =
        with_conn(pool, move |conn| RecordStore::<R>::post(conn, &record))
            .await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn post_records<R>(
    State(pool): State<DbPool>,
    Json(records): Json<Vec<R>>,
) -> ApiResponse<(StatusCode, Json<Vec<R>>)>
where
    R: Record,
    SqliteConnection: RecordStore<R>,
{
    let validated = validate_records(&records);
    if !validated.is_ok() {
        return unprocessable(validated.error_code);
    }

    let stored = with_conn(pool, move |conn| {
        RecordStore::<R>::post_many(conn, &validated.records)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(stored)))
}

async fn put_record<R>(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
    Json(record): Json<R>,
) -> ApiResponse<Json<R>>
where
    R: Record,
    SqliteConnection: RecordStore<R>,
{
    if !R::accepts_id(&id) {
        return err_not_found();
    }
    let record = record.sanitized();
    if record.id() != id {
        return unprocessable(ErrorCode::InvalidData);
    }
    let code = record.validate();
    if !code.is_ok() {
        return unprocessable(code);
    }

    let stored =
        with_conn(pool, move |conn| RecordStore::<R>::put(conn, &record))
            .await?;
    Ok(Json(stored))
}

async fn delete_record<R>(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
) -> ApiResponse<Json<Deleted>>
where
    R: Record,
    SqliteConnection: RecordStore<R>,
{
    if !R::accepts_id(&id) {
        return err_not_found();
    }
    let deleted =
        with_conn(pool, move |conn| RecordStore::<R>::delete(conn, &id))
            .await?;
    if deleted == 0 {
        return err_not_found();
    }
    Ok(Json(Deleted { deleted }))
}

async fn delete_records<R>(
    State(pool): State<DbPool>,
    Path(parent_id): Path<String>,
) -> ApiResponse<Json<Deleted>>
where
    R: Record,
    SqliteConnection: RecordStore<R>,
{
    if !is_valid_id(&parent_id, R::PARENT_KIND) {
        return err_not_found();
    }
    let deleted = with_conn(pool, move |conn| {
        RecordStore::<R>::delete_many(conn, &parent_id)
    })
    .await?;
    Ok(Json(Deleted { deleted }))
}
