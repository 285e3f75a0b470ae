use sea_orm::{
    AccessMode, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection,
    DatabaseTransaction, IsolationLevel, TransactionTrait,
};

use crate::config::Config;
use crate::error::{AppError, AppResult};

pub async fn connect(config: &Config) -> AppResult<DatabaseConnection> {
    Database::connect(&config.database_url)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to connect to database: {}", e)))
}

/// Open a transaction strong enough for check-then-insert on booking rows.
///
/// Postgres is asked for SERIALIZABLE explicitly. SQLite serializes writers
/// on its own and rejects the isolation statement, so it gets a plain BEGIN.
pub async fn begin_serializable(db: &DatabaseConnection) -> AppResult<DatabaseTransaction> {
    let txn = match db.get_database_backend() {
        DatabaseBackend::Postgres => {
            db.begin_with_config(
                Some(IsolationLevel::Serializable),
                Some(AccessMode::ReadWrite),
            )
            .await?
        }
        _ => db.begin().await?,
    };
    Ok(txn)
}
