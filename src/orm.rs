//! Lookup helpers over sea-orm entities

use std::str::FromStr;
use std::time::Duration;

use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait,
    PrimaryKeyTrait,
};

use crate::errors::{MutationError, MutationResult};
use crate::utils::from_global_id;

/// Primary key value type of an entity
pub type PrimaryKeyValue<E> = <<E as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType;

/// Open a connection pool. In-memory SQLite databases live in a single
/// connection.
pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);
    if database_url.contains(":memory:") {
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(20).min_connections(5);
    }
    opt.connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true);

    Database::connect(opt).await
}

/// Fetch a record by primary key, [`MutationError::NotFound`] when absent
pub async fn get_object_or_404<E, C>(db: &C, id: PrimaryKeyValue<E>) -> MutationResult<E::Model>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    get_object_or_none::<E, C>(db, id)
        .await?
        .ok_or_else(MutationError::not_found)
}

/// Fetch a record by primary key, `None` when absent
pub async fn get_object_or_none<E, C>(
    db: &C,
    id: PrimaryKeyValue<E>,
) -> MutationResult<Option<E::Model>>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    Ok(E::find_by_id(id).one(db).await?)
}

/// Turn an incoming identifier into a primary key value, decoding a global id
/// first when requested.
pub fn parse_primary_key<E>(raw: &str, is_global_id: bool) -> MutationResult<PrimaryKeyValue<E>>
where
    E: EntityTrait,
    PrimaryKeyValue<E>: FromStr,
{
    let local = if is_global_id {
        from_global_id(raw)?.1
    } else {
        raw.trim().to_string()
    };
    local
        .parse()
        .map_err(|_| MutationError::invalid_argument("id", format!("'{}' is not a valid identifier", raw)))
}
