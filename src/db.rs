use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use tokio::fs;

pub type OrmConn = DatabaseConnection;
pub type DbPool = sqlx::PgPool;

const MIGRATIONS_DIR: &str = "migrations";

pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let mut opt = ConnectOptions::new(database_url.to_owned());
    opt.max_connections(20)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    let conn = Database::connect(opt)
        .await
        .context("failed to connect to the database")?;
    Ok(conn)
}

/// The sqlx pool behind the ORM connection, for joins written by hand.
pub fn pg_pool(conn: &DatabaseConnection) -> &DbPool {
    conn.get_postgres_connection_pool()
}

/// Apply every `migrations/*.sql` file in filename order. Statements must be
/// idempotent; nothing records which files already ran.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    let mut entries = fs::read_dir(MIGRATIONS_DIR)
        .await
        .with_context(|| format!("cannot read {MIGRATIONS_DIR}/"))?;
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();

    let backend = conn.get_database_backend();
    for file in files {
        let sql = fs::read_to_string(&file).await?;
        let statements = split_statements(&sql);
        tracing::debug!(file = %file.display(), count = statements.len(), "applying migration");
        for statement in statements {
            conn.execute(Statement::from_string(backend, statement))
                .await
                .with_context(|| format!("migration {} failed", file.display()))?;
        }
    }

    Ok(())
}

/// Postgres prepared statements hold a single command, so a file is split on
/// `;` after dropping `--` comment lines.
fn split_statements(sql: &str) -> Vec<String> {
    let stripped: String = sql
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");
    stripped
        .split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .map(|stmt| format!("{stmt};"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_blank_statements_are_dropped() {
        let sql = "-- users\nCREATE TABLE a (id INT);\n\n-- stock; counts\nCREATE INDEX b ON a (id);\n;";
        assert_eq!(
            split_statements(sql),
            ["CREATE TABLE a (id INT);", "CREATE INDEX b ON a (id);"]
        );
    }
}
