//! Database initialization
//!
//! Creates the catalog tables when missing. There is no migration step:
//! an existing file is expected to carry this exact schema.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Open (creating if needed) the catalog database and ensure its tables exist
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    create_schema(&pool).await?;

    Ok(pool)
}

/// Create every catalog table (idempotent)
pub async fn create_schema(pool: &SqlitePool) -> Result<()> {
    create_companies_table(pool).await?;
    create_series_table(pool).await?;
    create_episodes_table(pool).await?;
    create_elements_table(pool).await?;
    create_materials_table(pool).await?;
    create_tags_table(pool).await?;
    create_cut_history_table(pool).await?;
    Ok(())
}

async fn create_companies_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS companies (
            uuid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            root TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_series_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS series (
            uuid TEXT PRIMARY KEY,
            parent_company_uuid TEXT NOT NULL REFERENCES companies(uuid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            naming_convention TEXT NOT NULL,
            season INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_episodes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS episodes (
            uuid TEXT PRIMARY KEY,
            parent_series_uuid TEXT NOT NULL REFERENCES series(uuid) ON DELETE CASCADE,
            number INTEGER NOT NULL,
            location TEXT NOT NULL,
            up_folder TEXT,
            cels_folder TEXT,
            notes TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_elements_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS elements (
            uuid TEXT PRIMARY KEY,
            parent_series_uuid TEXT NOT NULL REFERENCES series(uuid) ON DELETE CASCADE,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            aliases TEXT NOT NULL DEFAULT '[]',
            tags TEXT NOT NULL DEFAULT '[]'
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_materials_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS materials (
            uuid TEXT PRIMARY KEY,
            parent_episode_uuid TEXT NOT NULL REFERENCES episodes(uuid) ON DELETE CASCADE,
            parent_uuid TEXT,
            type TEXT NOT NULL,
            path TEXT NOT NULL,
            payload TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_tags_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            material_uuid TEXT NOT NULL REFERENCES materials(uuid) ON DELETE CASCADE,
            tag TEXT NOT NULL,
            PRIMARY KEY (material_uuid, tag)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_cut_history_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cut_history (
            material_uuid TEXT NOT NULL REFERENCES materials(uuid) ON DELETE CASCADE,
            seq INTEGER NOT NULL,
            status TEXT NOT NULL,
            recorded_at TEXT NOT NULL,
            PRIMARY KEY (material_uuid, seq)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}
