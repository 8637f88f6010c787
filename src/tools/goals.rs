//! Goal and body profile MCP Tools

use crate::db::Database;
use crate::models::{ActivityLevel, BodyProfile, Goals, GoalsUpdate, Sex};

/// Current daily goals (defaults until set)
pub fn get_goals(db: &Database) -> Result<Goals, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    Goals::get(&conn).map_err(|e| format!("Failed to get goals: {}", e))
}

/// Change any of the four daily goals
pub fn set_goals(db: &Database, data: GoalsUpdate) -> Result<Goals, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    Goals::set(&conn, &data).map_err(|e| format!("Failed to set goals: {}", e))
}

pub fn get_profile(db: &Database) -> Result<BodyProfile, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    BodyProfile::get(&conn).map_err(|e| format!("Failed to get profile: {}", e))
}

/// Replace the body profile. Unrecognized sex or activity values are
/// rejected rather than dropped.
pub fn set_profile(
    db: &Database,
    age: Option<u32>,
    sex: Option<&str>,
    height_cm: Option<f64>,
    weight_kg: Option<f64>,
    body_fat_pct: Option<f64>,
    activity: Option<&str>,
) -> Result<BodyProfile, String> {
    let sex = match sex {
        Some(s) => Some(Sex::from_str(s).ok_or_else(|| {
            format!("Invalid sex '{}'. Valid values: female, male, other", s)
        })?),
        None => None,
    };
    let activity = match activity {
        Some(a) => Some(ActivityLevel::from_str(a).ok_or_else(|| {
            format!(
                "Invalid activity '{}'. Valid values: sedentary, light, moderate, active, very_active",
                a
            )
        })?),
        None => None,
    };

    let profile = BodyProfile {
        age,
        sex,
        height_cm,
        weight_kg,
        body_fat_pct,
        activity,
        updated_at: None,
    };

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
    BodyProfile::set(&conn, &profile).map_err(|e| format!("Failed to set profile: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;

    #[test]
    fn test_set_goals_then_get() {
        let db = open_in_memory().unwrap();
        set_goals(
            &db,
            GoalsUpdate {
                kcal: Some(1800.0),
                ..Default::default()
            },
        )
        .unwrap();
        let goals = get_goals(&db).unwrap();
        assert_eq!(goals.kcal, 1800.0);
        assert_eq!(goals.protein, 100.0);
    }

    #[test]
    fn test_set_profile_validates_enums() {
        let db = open_in_memory().unwrap();
        assert!(set_profile(&db, Some(30), Some("robot"), None, None, None, None).is_err());
        assert!(set_profile(&db, Some(30), None, None, None, None, Some("couch")).is_err());

        let profile =
            set_profile(&db, Some(30), Some("male"), Some(180.0), Some(80.0), None, Some("light")).unwrap();
        assert_eq!(profile.activity, Some(ActivityLevel::Light));
    }
}
