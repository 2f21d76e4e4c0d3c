//! SQLite store for catalog snapshots
//!
//! Saving replaces every row owned by the saved companies inside one
//! transaction. Loading reads all tables in insertion order.

use crate::persist::CatalogRows;
use setman_common::db::{
    CompanyRow, ElementRow, EpisodeRow, HistoryRow, MaterialRow, SeriesRow, TagRow,
};
use setman_common::Result;
use sqlx::SqlitePool;
use tracing::info;

const COMPANY_MATERIALS: &str = r#"
    SELECT m.uuid FROM materials m
    JOIN episodes e ON m.parent_episode_uuid = e.uuid
    JOIN series s ON e.parent_series_uuid = s.uuid
    WHERE s.parent_company_uuid = ?
"#;

/// Write a snapshot, replacing the stored rows of each company it contains
pub async fn save_rows(pool: &SqlitePool, rows: &CatalogRows) -> Result<()> {
    let mut tx = pool.begin().await?;

    for company in &rows.companies {
        let uuid = company.uuid.as_str();

        sqlx::query(&format!("DELETE FROM tags WHERE material_uuid IN ({})", COMPANY_MATERIALS))
            .bind(uuid)
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!(
            "DELETE FROM cut_history WHERE material_uuid IN ({})",
            COMPANY_MATERIALS
        ))
        .bind(uuid)
        .execute(&mut *tx)
        .await?;
        sqlx::query(&format!("DELETE FROM materials WHERE uuid IN ({})", COMPANY_MATERIALS))
            .bind(uuid)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            DELETE FROM episodes WHERE parent_series_uuid IN
                (SELECT uuid FROM series WHERE parent_company_uuid = ?)
            "#,
        )
        .bind(uuid)
        .execute(&mut *tx)
        .await?;
        sqlx::query(
            r#"
            DELETE FROM elements WHERE parent_series_uuid IN
                (SELECT uuid FROM series WHERE parent_company_uuid = ?)
            "#,
        )
        .bind(uuid)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM series WHERE parent_company_uuid = ?")
            .bind(uuid)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM companies WHERE uuid = ?")
            .bind(uuid)
            .execute(&mut *tx)
            .await?;

        sqlx::query("INSERT INTO companies (uuid, name, root) VALUES (?, ?, ?)")
            .bind(&company.uuid)
            .bind(&company.name)
            .bind(&company.root)
            .execute(&mut *tx)
            .await?;
    }

    for series in &rows.series {
        sqlx::query(
            r#"
            INSERT INTO series (uuid, parent_company_uuid, name, naming_convention, season)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&series.uuid)
        .bind(&series.parent_company_uuid)
        .bind(&series.name)
        .bind(&series.naming_convention)
        .bind(series.season)
        .execute(&mut *tx)
        .await?;
    }

    for element in &rows.elements {
        sqlx::query(
            r#"
            INSERT INTO elements (uuid, parent_series_uuid, name, category, aliases, tags)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&element.uuid)
        .bind(&element.parent_series_uuid)
        .bind(&element.name)
        .bind(&element.category)
        .bind(&element.aliases)
        .bind(&element.tags)
        .execute(&mut *tx)
        .await?;
    }

    for episode in &rows.episodes {
        sqlx::query(
            r#"
            INSERT INTO episodes (uuid, parent_series_uuid, number, location, up_folder, cels_folder, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&episode.uuid)
        .bind(&episode.parent_series_uuid)
        .bind(episode.number)
        .bind(&episode.location)
        .bind(&episode.up_folder)
        .bind(&episode.cels_folder)
        .bind(&episode.notes)
        .execute(&mut *tx)
        .await?;
    }

    for material in &rows.materials {
        sqlx::query(
            r#"
            INSERT INTO materials (uuid, parent_episode_uuid, parent_uuid, type, path, payload)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&material.uuid)
        .bind(&material.parent_episode_uuid)
        .bind(&material.parent_uuid)
        .bind(&material.kind)
        .bind(&material.path)
        .bind(&material.payload)
        .execute(&mut *tx)
        .await?;
    }

    for tag in &rows.tags {
        sqlx::query("INSERT INTO tags (material_uuid, tag) VALUES (?, ?)")
            .bind(&tag.material_uuid)
            .bind(&tag.tag)
            .execute(&mut *tx)
            .await?;
    }

    for entry in &rows.history {
        sqlx::query(
            "INSERT INTO cut_history (material_uuid, seq, status, recorded_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&entry.material_uuid)
        .bind(entry.seq)
        .bind(&entry.status)
        .bind(&entry.recorded_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    info!(
        companies = rows.companies.len(),
        materials = rows.materials.len(),
        "Saved catalog snapshot"
    );
    Ok(())
}

/// Read every stored row
pub async fn load_rows(pool: &SqlitePool) -> Result<CatalogRows> {
    let companies: Vec<(String, String, Option<String>)> =
        sqlx::query_as("SELECT uuid, name, root FROM companies ORDER BY rowid")
            .fetch_all(pool)
            .await?;

    let series: Vec<(String, String, String, String, i64)> = sqlx::query_as(
        "SELECT uuid, parent_company_uuid, name, naming_convention, season FROM series ORDER BY rowid",
    )
    .fetch_all(pool)
    .await?;

    let elements: Vec<(String, String, String, String, String, String)> = sqlx::query_as(
        "SELECT uuid, parent_series_uuid, name, category, aliases, tags FROM elements ORDER BY rowid",
    )
    .fetch_all(pool)
    .await?;

    let episodes: Vec<(String, String, i64, String, Option<String>, Option<String>, String)> =
        sqlx::query_as(
            r#"
            SELECT uuid, parent_series_uuid, number, location, up_folder, cels_folder, notes
            FROM episodes ORDER BY rowid
            "#,
        )
        .fetch_all(pool)
        .await?;

    let materials: Vec<(String, String, Option<String>, String, String, Option<String>)> =
        sqlx::query_as(
            r#"
            SELECT uuid, parent_episode_uuid, parent_uuid, type, path, payload
            FROM materials ORDER BY rowid
            "#,
        )
        .fetch_all(pool)
        .await?;

    let tags: Vec<(String, String)> =
        sqlx::query_as("SELECT material_uuid, tag FROM tags ORDER BY rowid")
            .fetch_all(pool)
            .await?;

    let history: Vec<(String, i64, String, String)> = sqlx::query_as(
        "SELECT material_uuid, seq, status, recorded_at FROM cut_history ORDER BY material_uuid, seq",
    )
    .fetch_all(pool)
    .await?;

    Ok(CatalogRows {
        companies: companies
            .into_iter()
            .map(|(uuid, name, root)| CompanyRow { uuid, name, root })
            .collect(),
        series: series
            .into_iter()
            .map(
                |(uuid, parent_company_uuid, name, naming_convention, season)| SeriesRow {
                    uuid,
                    parent_company_uuid,
                    name,
                    naming_convention,
                    season,
                },
            )
            .collect(),
        elements: elements
            .into_iter()
            .map(
                |(uuid, parent_series_uuid, name, category, aliases, tags)| ElementRow {
                    uuid,
                    parent_series_uuid,
                    name,
                    category,
                    aliases,
                    tags,
                },
            )
            .collect(),
        episodes: episodes
            .into_iter()
            .map(
                |(uuid, parent_series_uuid, number, location, up_folder, cels_folder, notes)| {
                    EpisodeRow {
                        uuid,
                        parent_series_uuid,
                        number,
                        location,
                        up_folder,
                        cels_folder,
                        notes,
                    }
                },
            )
            .collect(),
        materials: materials
            .into_iter()
            .map(
                |(uuid, parent_episode_uuid, parent_uuid, kind, path, payload)| MaterialRow {
                    uuid,
                    parent_episode_uuid,
                    parent_uuid,
                    kind,
                    path,
                    payload,
                },
            )
            .collect(),
        tags: tags
            .into_iter()
            .map(|(material_uuid, tag)| TagRow { material_uuid, tag })
            .collect(),
        history: history
            .into_iter()
            .map(|(material_uuid, seq, status, recorded_at)| HistoryRow {
                material_uuid,
                seq,
                status,
                recorded_at,
            })
            .collect(),
    })
}
