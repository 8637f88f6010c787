//! Goals and body profile
//!
//! Both are single-row tables. The body profile is informational and never
//! feeds into a calculation.

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::{DbError, DbResult};
use crate::nutrition::sanitize::non_negative;
use super::Macros;

/// Daily targets used when none are stored
pub const DEFAULT_GOALS: Macros = Macros {
    kcal: 2000.0,
    fat: 70.0,
    carbs: 250.0,
    protein: 100.0,
};

/// Daily budget for calories and macros
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goals {
    pub kcal: f64,
    pub fat: f64,
    pub carbs: f64,
    pub protein: f64,
    /// `None` while the defaults are in effect
    pub updated_at: Option<String>,
}

/// Partial goal update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoalsUpdate {
    pub kcal: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub protein: Option<f64>,
}

impl Default for Goals {
    fn default() -> Self {
        Self {
            kcal: DEFAULT_GOALS.kcal,
            fat: DEFAULT_GOALS.fat,
            carbs: DEFAULT_GOALS.carbs,
            protein: DEFAULT_GOALS.protein,
            updated_at: None,
        }
    }
}

impl Goals {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            kcal: row.get("kcal")?,
            fat: row.get("fat")?,
            carbs: row.get("carbs")?,
            protein: row.get("protein")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn as_macros(&self) -> Macros {
        Macros::new(self.kcal, self.fat, self.carbs, self.protein)
    }

    /// Stored goals, or the defaults
    pub fn get(conn: &Connection) -> DbResult<Self> {
        let stored = conn
            .query_row("SELECT * FROM goals WHERE id = 1", [], Self::from_row)
            .optional()?;
        Ok(stored.unwrap_or_default())
    }

    /// Merge `data` into the current goals and store them
    pub fn set(conn: &Connection, data: &GoalsUpdate) -> DbResult<Self> {
        let current = Self::get(conn)?;
        let kcal = non_negative(data.kcal.unwrap_or(current.kcal));
        let fat = non_negative(data.fat.unwrap_or(current.fat));
        let carbs = non_negative(data.carbs.unwrap_or(current.carbs));
        let protein = non_negative(data.protein.unwrap_or(current.protein));

        conn.execute(
            r#"
            INSERT INTO goals (id, kcal, fat, carbs, protein)
            VALUES (1, ?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                kcal = excluded.kcal,
                fat = excluded.fat,
                carbs = excluded.carbs,
                protein = excluded.protein,
                updated_at = datetime('now')
            "#,
            params![kcal, fat, carbs, protein],
        )?;

        tracing::info!(kcal, fat, carbs, protein, "Updated goals");
        Self::get(conn)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Female,
    Male,
    Other,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Female => "female",
            Sex::Male => "male",
            Sex::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "female" | "f" => Some(Sex::Female),
            "male" | "m" => Some(Sex::Male),
            "other" => Some(Sex::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLevel::Sedentary => "sedentary",
            ActivityLevel::Light => "light",
            ActivityLevel::Moderate => "moderate",
            ActivityLevel::Active => "active",
            ActivityLevel::VeryActive => "very_active",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "sedentary" => Some(ActivityLevel::Sedentary),
            "light" => Some(ActivityLevel::Light),
            "moderate" => Some(ActivityLevel::Moderate),
            "active" => Some(ActivityLevel::Active),
            "very_active" => Some(ActivityLevel::VeryActive),
            _ => None,
        }
    }
}

/// Body measurements shown alongside goals
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BodyProfile {
    pub age: Option<u32>,
    pub sex: Option<Sex>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub body_fat_pct: Option<f64>,
    pub activity: Option<ActivityLevel>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl BodyProfile {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let sex: Option<String> = row.get("sex")?;
        let activity: Option<String> = row.get("activity")?;
        Ok(Self {
            age: row.get("age")?,
            sex: sex.as_deref().and_then(Sex::from_str),
            height_cm: row.get("height_cm")?,
            weight_kg: row.get("weight_kg")?,
            body_fat_pct: row.get("body_fat_pct")?,
            activity: activity.as_deref().and_then(ActivityLevel::from_str),
            updated_at: row.get("updated_at")?,
        })
    }

    /// Stored profile, or an empty one
    pub fn get(conn: &Connection) -> DbResult<Self> {
        let stored = conn
            .query_row("SELECT * FROM body_profile WHERE id = 1", [], Self::from_row)
            .optional()?;
        Ok(stored.unwrap_or_default())
    }

    /// Replace the stored profile
    pub fn set(conn: &Connection, profile: &BodyProfile) -> DbResult<Self> {
        if let Some(pct) = profile.body_fat_pct {
            if !(0.0..=100.0).contains(&pct) {
                return Err(DbError::Invalid(format!(
                    "body_fat_pct must be between 0 and 100 (got {})",
                    pct
                )));
            }
        }
        let positive = |v: Option<f64>| v.filter(|x| x.is_finite() && *x > 0.0);

        conn.execute(
            r#"
            INSERT INTO body_profile (id, age, sex, height_cm, weight_kg, body_fat_pct, activity)
            VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                age = excluded.age,
                sex = excluded.sex,
                height_cm = excluded.height_cm,
                weight_kg = excluded.weight_kg,
                body_fat_pct = excluded.body_fat_pct,
                activity = excluded.activity,
                updated_at = datetime('now')
            "#,
            params![
                profile.age,
                profile.sex.map(|s| s.as_str()),
                positive(profile.height_cm),
                positive(profile.weight_kg),
                profile.body_fat_pct,
                profile.activity.map(|a| a.as_str()),
            ],
        )?;

        tracing::info!("Updated body profile");
        Self::get(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_goals_default_until_set() {
        let conn = test_conn();
        let goals = Goals::get(&conn).unwrap();
        assert_eq!(goals.as_macros(), DEFAULT_GOALS);
        assert!(goals.updated_at.is_none());
    }

    #[test]
    fn test_goals_partial_update() {
        let conn = test_conn();
        let goals = Goals::set(
            &conn,
            &GoalsUpdate {
                protein: Some(150.0),
                fat: Some(-5.0),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(goals.protein, 150.0);
        assert_eq!(goals.fat, 0.0);
        assert_eq!(goals.kcal, 2000.0);
        assert!(goals.updated_at.is_some());
    }

    #[test]
    fn test_profile_round_trip() {
        let conn = test_conn();
        assert!(BodyProfile::get(&conn).unwrap().age.is_none());

        let saved = BodyProfile::set(
            &conn,
            &BodyProfile {
                age: Some(34),
                sex: Some(Sex::Female),
                height_cm: Some(168.0),
                weight_kg: Some(61.5),
                body_fat_pct: Some(24.0),
                activity: Some(ActivityLevel::VeryActive),
                updated_at: None,
            },
        )
        .unwrap();
        assert_eq!(saved.age, Some(34));
        assert_eq!(saved.sex, Some(Sex::Female));
        assert_eq!(saved.activity, Some(ActivityLevel::VeryActive));
    }

    #[test]
    fn test_profile_rejects_bad_body_fat() {
        let conn = test_conn();
        let result = BodyProfile::set(
            &conn,
            &BodyProfile {
                body_fat_pct: Some(140.0),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(DbError::Invalid(_))));
    }
}
