//! Report generation tools
//!
//! Generate a PDF nutrition report for a date range: averages against goals,
//! top foods, a per-day table and the calorie trend chart.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::{Datelike, NaiveDate, Weekday};
use printpdf::*;
use serde::Serialize;

use crate::db::Database;
use crate::models::{BodyProfile, Entry, Macros, Nutrient};
use crate::nutrition::{
    daily_average, daily_series, goal_progress, top_foods, Average, Budget, Catalog, DailyTotals,
    GoalProgress, RankedFood, DEFAULT_TOP_FOODS,
};

use super::charts::generate_trend_chart;
use super::dashboard::{load_goals, load_range};
use super::parse_range;

// ============================================================================
// Color Constants (RGB 0-255)
// ============================================================================

const COLOR_TITLE: (u8, u8, u8) = (0, 112, 192);
const COLOR_BLACK: (u8, u8, u8) = (0, 0, 0);
const COLOR_GRAY: (u8, u8, u8) = (128, 128, 128);
const COLOR_ERROR: (u8, u8, u8) = (255, 0, 0);

const PAGE_WIDTH: f32 = 215.9;
const PAGE_HEIGHT: f32 = 279.4;
const MARGIN_LEFT: f32 = 15.0;
const MARGIN_BOTTOM: f32 = 20.0;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct GenerateReportResponse {
    pub success: bool,
    pub file_path: String,
    pub total_entries: usize,
    pub days_logged: usize,
    pub days_in_range: usize,
    pub date_range: String,
    pub message: String,
}

/// Everything the report prints, computed before any drawing
#[derive(Debug, Clone)]
pub struct ReportSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_entries: usize,
    pub series: Vec<DailyTotals>,
    pub average: Average,
    pub goals: Macros,
    pub progress: Vec<GoalProgress>,
    pub top_foods: Vec<RankedFood>,
}

// ============================================================================
// Statistics
// ============================================================================

fn day_of_week_abbrev(date: &NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Mon",
        Weekday::Tue => "Tue",
        Weekday::Wed => "Wed",
        Weekday::Thu => "Thu",
        Weekday::Fri => "Fri",
        Weekday::Sat => "Sat",
        Weekday::Sun => "Sun",
    }
}

/// Compute the report contents. Progress compares the average over logged
/// days with the daily goals.
pub fn summarize(
    entries: &[Entry],
    catalog: &Catalog,
    goals: Macros,
    start: NaiveDate,
    end: NaiveDate,
) -> ReportSummary {
    let average = daily_average(entries, catalog, start, end);
    ReportSummary {
        start,
        end,
        total_entries: entries.len(),
        series: daily_series(entries, catalog, start, end),
        progress: goal_progress(&average.macros, &goals),
        top_foods: top_foods(entries, catalog, Nutrient::Kcal, DEFAULT_TOP_FOODS),
        average,
        goals,
    }
}

fn profile_line(profile: &BodyProfile) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(age) = profile.age {
        parts.push(format!("Age: {}", age));
    }
    if let Some(sex) = profile.sex {
        parts.push(format!("Sex: {}", sex.as_str()));
    }
    if let Some(height) = profile.height_cm {
        parts.push(format!("Height: {:.0} cm", height));
    }
    if let Some(weight) = profile.weight_kg {
        parts.push(format!("Weight: {:.1} kg", weight));
    }
    if let Some(activity) = profile.activity {
        parts.push(format!("Activity: {}", activity.as_str()));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("   "))
    }
}

// ============================================================================
// PDF Generation Helper Functions
// ============================================================================

fn rgb_to_printpdf(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(
        r as f32 / 255.0,
        g as f32 / 255.0,
        b as f32 / 255.0,
        None,
    ))
}

fn add_text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    x: Mm,
    y: Mm,
    size: f32,
    color: (u8, u8, u8),
) {
    layer.set_fill_color(rgb_to_printpdf(color.0, color.1, color.2));
    layer.use_text(text, size, x, y, font);
}

fn add_line(
    layer: &PdfLayerReference,
    x1: Mm,
    y1: Mm,
    x2: Mm,
    y2: Mm,
    color: (u8, u8, u8),
    width: f32,
) {
    layer.set_outline_color(rgb_to_printpdf(color.0, color.1, color.2));
    layer.set_outline_thickness(width);

    let line = Line {
        points: vec![
            (Point::new(x1, y1), false),
            (Point::new(x2, y2), false),
        ],
        is_closed: false,
    };
    layer.add_line(line);
}

fn budget_color(budget: &Budget) -> (u8, u8, u8) {
    budget.color().unwrap_or(COLOR_BLACK)
}

// ============================================================================
// Nutrition Report
// ============================================================================

/// Write the report for an already computed summary
pub fn write_report(
    summary: &ReportSummary,
    profile: &BodyProfile,
    output_path: &Path,
    notes: Option<&[String]>,
) -> Result<(), String> {
    let (doc, page1, layer1) = PdfDocument::new(
        "Nutrition Report",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );

    let font = doc.add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| e.to_string())?;
    let font_bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| e.to_string())?;

    let mut layer = doc.get_page(page1).get_layer(layer1);
    let mut y = PAGE_HEIGHT - 20.0;

    // Title
    add_text(&layer, &font_bold, "Nutrition Report", Mm(MARGIN_LEFT), Mm(y), 18.0, COLOR_TITLE);
    y -= 10.0;

    if let Some(line) = profile_line(profile) {
        add_text(&layer, &font, &line, Mm(MARGIN_LEFT), Mm(y), 11.0, COLOR_BLACK);
        y -= 6.0;
    }

    add_text(&layer, &font, &format!("Report Period: {} to {}", summary.start, summary.end), Mm(MARGIN_LEFT), Mm(y), 11.0, COLOR_BLACK);
    let now = chrono::Local::now().format("%Y-%m-%d").to_string();
    add_text(&layer, &font, &format!("Generated: {}", now), Mm(120.0), Mm(y), 11.0, COLOR_BLACK);
    y -= 10.0;

    add_line(&layer, Mm(MARGIN_LEFT), Mm(y), Mm(200.0), Mm(y), COLOR_GRAY, 0.5);
    y -= 8.0;

    // Summary section
    add_text(&layer, &font_bold, "Summary", Mm(MARGIN_LEFT), Mm(y), 12.0, COLOR_BLACK);
    y -= 7.0;

    add_text(&layer, &font, &format!("Entries: {}", summary.total_entries), Mm(MARGIN_LEFT), Mm(y), 10.0, COLOR_BLACK);
    add_text(
        &layer,
        &font,
        &format!("Days Logged: {} of {}", summary.average.days_logged, summary.average.days_in_range),
        Mm(80.0),
        Mm(y),
        10.0,
        COLOR_BLACK,
    );
    y -= 8.0;

    // Average vs goal, one row per nutrient
    let headers = ["Nutrient", "Daily Avg", "Goal", "% of Goal", "Budget"];
    let col_widths = [30.0, 30.0, 30.0, 30.0, 40.0];
    let mut col_x = MARGIN_LEFT;
    for (i, header) in headers.iter().enumerate() {
        add_text(&layer, &font_bold, header, Mm(col_x), Mm(y), 9.0, COLOR_BLACK);
        col_x += col_widths[i];
    }
    y -= 5.0;

    for row in &summary.progress {
        let unit = row.nutrient.unit();
        let values = [
            row.nutrient.label().to_string(),
            format!("{:.0} {}", row.actual, unit),
            format!("{:.0} {}", row.goal, unit),
            format!("{}%", row.percentage),
            row.label.clone(),
        ];
        col_x = MARGIN_LEFT;
        for (i, value) in values.iter().enumerate() {
            let color = if i == 4 { budget_color(&row.budget) } else { COLOR_BLACK };
            add_text(&layer, &font, value, Mm(col_x), Mm(y), 9.0, color);
            col_x += col_widths[i];
        }
        y -= 5.0;
    }
    y -= 6.0;

    // Top foods
    if !summary.top_foods.is_empty() {
        add_text(&layer, &font_bold, "Top Foods by Calories", Mm(MARGIN_LEFT), Mm(y), 12.0, COLOR_BLACK);
        y -= 6.0;
        for (rank, food) in summary.top_foods.iter().enumerate() {
            add_text(&layer, &font, &format!("{}. {}", rank + 1, food.name), Mm(MARGIN_LEFT), Mm(y), 9.0, COLOR_BLACK);
            add_text(&layer, &font, &format!("{:.0} kcal", food.value), Mm(120.0), Mm(y), 9.0, COLOR_BLACK);
            y -= 5.0;
        }
        y -= 6.0;
    }

    // Daily table, continued on extra portrait pages as needed
    add_text(&layer, &font_bold, "Daily Totals", Mm(MARGIN_LEFT), Mm(y), 12.0, COLOR_BLACK);
    y -= 7.0;

    let headers = ["Date", "Day", "N", "kcal", "Fat", "Carbs", "Protein", "Budget"];
    let col_widths = [24.0, 14.0, 10.0, 20.0, 20.0, 20.0, 20.0, 30.0];
    let draw_header = |layer: &PdfLayerReference, y: f32| {
        let mut col_x = MARGIN_LEFT;
        for (i, header) in headers.iter().enumerate() {
            add_text(layer, &font_bold, header, Mm(col_x), Mm(y), 8.0, COLOR_BLACK);
            col_x += col_widths[i];
        }
    };
    draw_header(&layer, y);
    y -= 5.0;

    for day in &summary.series {
        if y < MARGIN_BOTTOM {
            let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Table Page");
            layer = doc.get_page(page).get_layer(page_layer);
            y = PAGE_HEIGHT - 20.0;
            draw_header(&layer, y);
            y -= 5.0;
        }

        let budget = Budget::new(summary.goals.kcal, day.totals.kcal);
        let values = [
            day.date.to_string(),
            day_of_week_abbrev(&day.date).to_string(),
            day.entry_count.to_string(),
            format!("{:.0}", day.totals.kcal),
            format!("{:.1}", day.totals.fat),
            format!("{:.1}", day.totals.carbs),
            format!("{:.1}", day.totals.protein),
            budget.label(),
        ];

        let row_color = if day.entry_count == 0 { COLOR_GRAY } else { COLOR_BLACK };
        col_x = MARGIN_LEFT;
        for (i, value) in values.iter().enumerate() {
            let color = if i == 7 && day.entry_count > 0 { budget_color(&budget) } else { row_color };
            add_text(&layer, &font, value, Mm(col_x), Mm(y), 7.0, color);
            col_x += col_widths[i];
        }
        y -= 4.5;
    }

    // ========================================================================
    // Landscape page for the trend chart
    // ========================================================================
    let (page2, layer2) = doc.add_page(Mm(PAGE_HEIGHT), Mm(PAGE_WIDTH), "Chart Page");
    let layer2 = doc.get_page(page2).get_layer(layer2);

    let mut y2 = PAGE_WIDTH - 20.0;

    add_text(&layer2, &font_bold, "Calorie Trend", Mm(MARGIN_LEFT), Mm(y2), 16.0, COLOR_TITLE);
    add_text(&layer2, &font, &format!("{} - {}", summary.start, summary.end), Mm(120.0), Mm(y2), 11.0, COLOR_BLACK);
    y2 -= 10.0;

    match generate_trend_chart(&summary.series, summary.goals.kcal, 1000, 400) {
        Ok(png_bytes) => {
            let dynamic_image = printpdf::image_crate::load_from_memory(&png_bytes)
                .map_err(|e| e.to_string())?;
            let pdf_image = Image::from_dynamic_image(&dynamic_image);

            // 1000x400 pixels at 120 DPI is about 212mm x 85mm
            let transform = ImageTransform {
                translate_x: Some(Mm(MARGIN_LEFT)),
                translate_y: Some(Mm(y2 - 90.0)),
                dpi: Some(120.0),
                ..Default::default()
            };

            pdf_image.add_to_layer(layer2.clone(), transform);
            y2 -= 95.0;
        }
        Err(e) => {
            tracing::warn!("Trend chart not embedded: {}", e);
            add_text(&layer2, &font, &format!("Chart generation error: {}", e), Mm(MARGIN_LEFT), Mm(y2 - 10.0), 9.0, COLOR_ERROR);
            y2 -= 15.0;
        }
    }

    y2 -= 5.0;
    add_text(&layer2, &font_bold, "Legend:", Mm(MARGIN_LEFT), Mm(y2), 10.0, COLOR_BLACK);
    add_text(&layer2, &font, "Calories", Mm(45.0), Mm(y2), 10.0, COLOR_TITLE);
    add_text(&layer2, &font, &format!("Goal ({:.0} kcal)", summary.goals.kcal), Mm(80.0), Mm(y2), 10.0, COLOR_GRAY);
    add_text(&layer2, &font, "Over goal", Mm(135.0), Mm(y2), 10.0, crate::nutrition::aggregate::OVER_BUDGET_COLOR);
    y2 -= 10.0;

    if let Some(notes_list) = notes {
        if !notes_list.is_empty() {
            add_text(&layer2, &font_bold, "Notes", Mm(MARGIN_LEFT), Mm(y2), 12.0, COLOR_BLACK);
            y2 -= 6.0;

            for note in notes_list {
                add_text(&layer2, &font, &format!("- {}", note), Mm(MARGIN_LEFT), Mm(y2), 9.0, COLOR_BLACK);
                y2 -= 5.0;
            }
        }
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
    }

    let file = File::create(output_path).map_err(|e| e.to_string())?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer).map_err(|e| e.to_string())?;

    tracing::info!(path = %output_path.display(), "Wrote nutrition report");
    Ok(())
}

/// Generate a nutrition PDF report for a date range
pub fn generate_nutrition_report(
    db: &Database,
    start_date: &str,
    end_date: &str,
    output_path: &str,
    notes: Option<Vec<String>>,
) -> Result<GenerateReportResponse, String> {
    let (start, end) = parse_range(start_date, end_date)?;
    let (entries, catalog) = load_range(db, start, end)?;

    if entries.is_empty() {
        return Err(format!("No entries found between {} and {}", start, end));
    }

    let goals = load_goals(db)?;
    let profile = {
        let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;
        BodyProfile::get(&conn).map_err(|e| format!("Failed to get profile: {}", e))?
    };

    let summary = summarize(&entries, &catalog, goals, start, end);
    write_report(&summary, &profile, Path::new(output_path), notes.as_deref())?;

    Ok(GenerateReportResponse {
        success: true,
        file_path: output_path.to_string(),
        total_entries: summary.total_entries,
        days_logged: summary.average.days_logged,
        days_in_range: summary.average.days_in_range,
        date_range: format!("{} to {}", start, end),
        message: format!(
            "Nutrition report generated with {} entries over {} logged days",
            summary.total_entries, summary.average.days_logged
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_in_memory;
    use crate::models::{FoodCategory, FoodDraft, Sex};
    use crate::nutrition::UnitMode;
    use crate::tools::entries::log_entry;
    use crate::tools::foods::add_food;

    fn seed(db: &Database) {
        let oats = add_food(
            db,
            FoodDraft {
                name: "Oats".to_string(),
                brand: None,
                category: FoodCategory::Grains,
                unit: UnitMode::Per100g,
                serving_size: None,
                kcal: 380.0,
                fat: 7.0,
                carbs: 66.0,
                protein: 13.0,
            },
        )
        .unwrap()
        .id;
        log_entry(db, "2025-05-01", oats, 500.0, Some("breakfast")).unwrap();
        log_entry(db, "2025-05-03", oats, 700.0, Some("breakfast")).unwrap();
    }

    #[test]
    fn test_summarize_uses_logged_days() {
        let db = open_in_memory().unwrap();
        seed(&db);
        let start = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 5, 4).unwrap();
        let (entries, catalog) = load_range(&db, start, end).unwrap();

        let summary = summarize(&entries, &catalog, load_goals(&db).unwrap(), start, end);
        assert_eq!(summary.series.len(), 4);
        assert_eq!(summary.average.days_logged, 2);
        assert_eq!(summary.average.macros.kcal, 2280.0);
        assert_eq!(summary.progress[0].percentage, 114);
        assert!(summary.progress[0].budget.is_over());
        assert_eq!(summary.top_foods[0].name, "Oats");
    }

    #[test]
    fn test_profile_line() {
        assert!(profile_line(&BodyProfile::default()).is_none());
        let profile = BodyProfile {
            age: Some(40),
            sex: Some(Sex::Female),
            ..Default::default()
        };
        assert_eq!(profile_line(&profile).unwrap(), "Age: 40   Sex: female");
    }

    #[test]
    fn test_generate_report_writes_pdf() {
        let db = open_in_memory().unwrap();
        seed(&db);
        let path = std::env::temp_dir().join(format!("macrotrack_report_{}.pdf", std::process::id()));

        let response = generate_nutrition_report(
            &db,
            "2025-05-01",
            "2025-05-07",
            path.to_str().unwrap(),
            Some(vec!["Holiday week".to_string()]),
        )
        .unwrap();
        assert!(response.success);
        assert_eq!(response.total_entries, 2);
        assert_eq!(response.days_in_range, 7);

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_generate_report_without_entries() {
        let db = open_in_memory().unwrap();
        assert!(generate_nutrition_report(&db, "2025-05-01", "2025-05-07", "/tmp/none.pdf", None).is_err());
    }
}
