//! Remote sync tools
//!
//! Push the local store to the hosted backend or pull it back. Rows use the
//! backup file's shapes, so a pull goes through the same import path.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::RemoteConfig;
use crate::db::Database;
use crate::models::{Entry, Food, Goals};
use crate::remote::{Filter, RemoteClient};

use super::backup::{
    import_value, BackupEntry, BackupFood, ImportMode, ImportOptions, ImportSummary,
};
use super::parse_range;

pub const FOODS_TABLE: &str = "foods";
pub const ENTRIES_TABLE: &str = "entries";
pub const GOALS_TABLE: &str = "goals";

#[derive(Debug, Serialize)]
pub struct PushResponse {
    pub success: bool,
    pub foods_pushed: usize,
    pub entries_pushed: usize,
    pub goals_pushed: bool,
}

#[derive(Debug, Serialize)]
pub struct PullResponse {
    pub success: bool,
    pub mode: &'static str,
    pub foods_received: usize,
    pub entries_received: usize,
    #[serde(flatten)]
    pub summary: ImportSummary,
}

#[derive(Debug, Serialize)]
struct GoalsRow {
    id: i64,
    kcal: f64,
    fat: f64,
    carbs: f64,
    protein: f64,
}

async fn connect(remote: Option<&RemoteConfig>) -> Result<RemoteClient, String> {
    let mut client = RemoteClient::from_config(remote).map_err(|e| e.to_string())?;
    if let Some((email, password)) = remote.and_then(|r| r.credentials.as_ref()) {
        client
            .sign_in(email, password)
            .await
            .map_err(|e| format!("Sign-in failed: {}", e))?;
    }
    Ok(client)
}

fn date_range(
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<Option<(NaiveDate, NaiveDate)>, String> {
    match (start_date, end_date) {
        (Some(start), Some(end)) => parse_range(start, end).map(Some),
        (None, None) => Ok(None),
        _ => Err("start_date and end_date must be given together".to_string()),
    }
}

fn range_filters(range: Option<(NaiveDate, NaiveDate)>) -> Vec<Filter> {
    match range {
        Some((start, end)) => vec![Filter::gte("date", start), Filter::lte("date", end)],
        None => Vec::new(),
    }
}

/// Upsert all foods, goals and the entries in range (all entries when no
/// range is given)
pub async fn remote_push(
    db: &Database,
    remote: Option<&RemoteConfig>,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<PushResponse, String> {
    let range = date_range(start_date, end_date)?;

    let (foods, entries, goals) = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        let foods: Vec<BackupFood> = Food::all(&conn)
            .map_err(|e| format!("Failed to load foods: {}", e))?
            .into_iter()
            .map(BackupFood::from)
            .collect();
        let entries = match range {
            Some((start, end)) => Entry::for_range(&conn, start, end),
            None => Entry::all(&conn),
        }
        .map_err(|e| format!("Failed to load entries: {}", e))?;
        let entries: Vec<BackupEntry> = entries.into_iter().map(BackupEntry::from).collect();
        let goals = Goals::get(&conn).map_err(|e| format!("Failed to get goals: {}", e))?;
        (foods, entries, goals)
    };

    let client = connect(remote).await?;

    let foods_pushed = client
        .upsert(FOODS_TABLE, &foods, Some("id"))
        .await
        .map_err(|e| e.to_string())?;
    let entries_pushed = client
        .upsert(ENTRIES_TABLE, &entries, Some("id"))
        .await
        .map_err(|e| e.to_string())?;
    let goals_row = GoalsRow {
        id: 1,
        kcal: goals.kcal,
        fat: goals.fat,
        carbs: goals.carbs,
        protein: goals.protein,
    };
    client
        .upsert(GOALS_TABLE, &[goals_row], Some("id"))
        .await
        .map_err(|e| e.to_string())?;

    tracing::info!(foods = foods_pushed, entries = entries_pushed, "Pushed to remote");

    Ok(PushResponse {
        success: true,
        foods_pushed,
        entries_pushed,
        goals_pushed: true,
    })
}

/// Fetch foods, goals and entries (optionally a date range of them) and
/// import them matched on id. `replace` with a range clears local entries in
/// that range only.
pub async fn remote_pull(
    db: &Database,
    remote: Option<&RemoteConfig>,
    mode: &str,
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<PullResponse, String> {
    let mode = ImportMode::from_str(mode)
        .ok_or_else(|| format!("Invalid mode '{}'. Valid values: merge, replace", mode))?;
    let range = date_range(start_date, end_date)?;
    let filters = range_filters(range);

    let client = connect(remote).await?;

    let foods: Vec<Value> = client.select(FOODS_TABLE, &[]).await.map_err(|e| e.to_string())?;
    let entries: Vec<Value> = client
        .select(ENTRIES_TABLE, &filters)
        .await
        .map_err(|e| e.to_string())?;
    let goals: Vec<Value> = client
        .select(GOALS_TABLE, &[Filter::eq("id", 1)])
        .await
        .map_err(|e| e.to_string())?;

    let foods_received = foods.len();
    let entries_received = entries.len();
    let document = json!({
        "foods": foods,
        "entries": entries,
        "goals": goals.into_iter().next(),
    });

    let summary = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        import_value(&conn, &document, &ImportOptions::pull(mode, range))
            .map_err(|e| format!("Import failed: {}", e))?
    };

    Ok(PullResponse {
        success: true,
        mode: mode.as_str(),
        foods_received,
        entries_received,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn test_date_range_filters() {
        assert!(date_range(None, None).unwrap().is_none());
        assert!(date_range(Some("2025-01-01"), None).is_err());
        assert!(date_range(Some("2025-01-02"), Some("2025-01-01")).is_err());
        assert!(range_filters(None).is_empty());

        let filters = range_filters(date_range(Some("2025-01-01"), Some("2025-01-31")).unwrap());
        assert_eq!(filters[0].to_query().1, "gte.2025-01-01");
        assert_eq!(filters[1].to_query().1, "lte.2025-01-31");
    }

    #[tokio::test]
    async fn test_sync_requires_remote_config() {
        let db = open_in_memory().unwrap();
        let err = remote_push(&db, None, None, None).await.unwrap_err();
        assert!(err.contains("not configured"));
        assert!(remote_pull(&db, None, "merge", None, None).await.is_err());
        assert!(remote_pull(&db, None, "sideways", None, None).await.is_err());
    }
}
