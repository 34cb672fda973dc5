//! The JSON api. Each request holds one pooled connection for as long as it
//! takes, off the async runtime.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use diesel::SqliteConnection;
use serde::Deserialize;
use tokio::task::spawn_blocking;

use crate::{
    ids::{IdKind, is_valid_id},
    state::DbPool,
    store::StoreError,
    tournaments::{
        SquadEntries, TmntTree, Tournament,
        brackets::Bracket,
        divisions::Division,
        eliminations::Elimination,
        entries::{DivEntry, ElimEntry},
        events::Event,
        lanes::Lane,
        players::Player,
        pots::Pot,
        save::{
            DeleteCounts, delete_all_data_for_tmnt, load_all_data_for_tmnt,
            save_all_data_for_tmnt, save_squad_entries,
        },
        squads::Squad,
    },
    util_resp::{ApiResponse, FailureResponse, err_not_found},
};

pub mod records;


pub fn router() -> Router<DbPool> {
    Router::new()
        .route("/tmnts/save", post(save_tmnt))
        .route("/tmnts/:id/all", get(load_tmnt).delete(delete_tmnt))
        .route("/squadEntries/save", post(save_entries))
        .merge(records::routes::<Tournament>())
        .merge(records::routes::<Event>())
        .merge(records::routes::<Division>())
        .merge(records::routes::<Squad>())
        .merge(records::routes::<Lane>())
        .merge(records::routes::<Pot>())
        .merge(records::routes::<Bracket>())
        .merge(records::routes::<Elimination>())
        .merge(records::routes::<Player>())
        .merge(records::routes::<DivEntry>())
        .merge(records::routes::<ElimEntry>())
}

/// Runs `f` on a pooled connection on the blocking thread pool.
pub(crate) async fn with_conn<T, E, F>(pool: DbPool, f: F) -> ApiResponse<T>
where
    F: FnOnce(&mut SqliteConnection) -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<FailureResponse>,
{
    spawn_blocking(move || -> ApiResponse<T> {
        let mut conn = pool.get().map_err(StoreError::from)?;
        f(&mut conn).map_err(Into::into)
    })
    .await
    .map_err(|err| {
        tracing::error!(%err, "request handler panicked");
        FailureResponse::ServerError
    })?
}

/// A save request: what the client last loaded, and what it has now.
/// Leaving `original` out saves `current` as a new tournament.
#[derive(Deserialize, Debug)]
pub struct SaveRequest<T> {
    #[serde(default)]
    pub original: T,
    pub current: T,
}

async fn save_tmnt(
    State(pool): State<DbPool>,
    Json(request): Json<SaveRequest<TmntTree>>,
) -> ApiResponse<Json<TmntTree>> {
    let saved = with_conn(pool, move |conn| {
        save_all_data_for_tmnt(conn, &request.original, &request.current)
    })
    .await?;
    Ok(Json(saved))
}

async fn load_tmnt(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
) -> ApiResponse<Json<TmntTree>> {
    if !is_valid_id(&id, IdKind::Tmnt) {
        return err_not_found();
    }
    let tree =
        with_conn(pool, move |conn| load_all_data_for_tmnt(conn, &id)).await?;
    Ok(Json(tree))
}

async fn delete_tmnt(
    State(pool): State<DbPool>,
    Path(id): Path<String>,
) -> ApiResponse<Json<DeleteCounts>> {
    if !is_valid_id(&id, IdKind::Tmnt) {
        return err_not_found();
    }
    let counts =
        with_conn(pool, move |conn| delete_all_data_for_tmnt(conn, &id))
            .await?;
    Ok(Json(counts))
}

async fn save_entries(
    State(pool): State<DbPool>,
    Json(request): Json<SaveRequest<SquadEntries>>,
) -> ApiResponse<Json<SquadEntries>> {
    let saved = with_conn(pool, move |conn| {
        save_squad_entries(conn, &request.original, &request.current)
    })
    .await?;
    Ok(Json(saved))
}
