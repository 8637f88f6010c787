//! Chart rendering tools
//!
//! Trend line, macro donut and meal split bars, drawn with plotters into an
//! RGB buffer and written out as PNG.

use std::f64::consts::PI;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbImage};
use serde::Serialize;

use crate::db::Database;
use crate::models::{Macros, MealType};
use crate::nutrition::aggregate::OVER_BUDGET_COLOR;
use crate::nutrition::{daily_series, meal_split, totals, DailyTotals, MealTotals};

use super::dashboard::{load_goals, load_range};
use super::{parse_date, parse_range};

// ============================================================================
// Color Constants (RGB 0-255)
// ============================================================================

const COLOR_KCAL: (u8, u8, u8) = (0, 112, 192);
const COLOR_FAT: (u8, u8, u8) = (255, 165, 0);
const COLOR_CARBS: (u8, u8, u8) = (0, 176, 80);
const COLOR_PROTEIN: (u8, u8, u8) = (112, 48, 160);
const COLOR_GOAL: (u8, u8, u8) = (128, 128, 128);

/// kcal per gram of fat, carbs and protein
const KCAL_PER_GRAM: [f64; 3] = [9.0, 4.0, 4.0];

const TREND_SIZE: (u32, u32) = (1000, 400);
const DONUT_SIZE: (u32, u32) = (600, 600);
const MEAL_SIZE: (u32, u32) = (800, 400);

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub success: bool,
    pub file_path: String,
    pub width: u32,
    pub height: u32,
    pub message: String,
}

fn rgb(c: (u8, u8, u8)) -> plotters::style::RGBColor {
    plotters::style::RGBColor(c.0, c.1, c.2)
}

/// Encode a raw RGB buffer as PNG
pub fn encode_png(buffer: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, String> {
    let img = RgbImage::from_raw(width, height, buffer).ok_or("Failed to create image from buffer")?;

    let mut png_bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(|e| e.to_string())?;

    Ok(png_bytes)
}

fn write_png(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, String> {
    std::fs::create_dir_all(dir).map_err(|e| e.to_string())?;
    let path = dir.join(file_name);
    std::fs::write(&path, bytes).map_err(|e| e.to_string())?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "Wrote chart");
    Ok(path)
}

fn short_date(day: &DailyTotals) -> String {
    day.date.format("%m/%d").to_string()
}

/// Calorie share of fat, carbs and protein, as fractions summing to 1
pub fn macro_shares(totals: &Macros) -> Option<[f64; 3]> {
    let kcal = [
        totals.fat * KCAL_PER_GRAM[0],
        totals.carbs * KCAL_PER_GRAM[1],
        totals.protein * KCAL_PER_GRAM[2],
    ];
    let sum: f64 = kcal.iter().sum();
    if sum <= 0.0 {
        return None;
    }
    Some([kcal[0] / sum, kcal[1] / sum, kcal[2] / sum])
}

/// Outline of one ring slice between two angles (radians, clockwise from 12 o'clock)
pub fn ring_slice(
    center: (i32, i32),
    outer: f64,
    inner: f64,
    start: f64,
    end: f64,
) -> Vec<(i32, i32)> {
    let steps = (((end - start) / (2.0 * PI)) * 120.0).ceil().max(2.0) as usize;
    let point = |radius: f64, angle: f64| {
        (
            center.0 + (radius * angle.sin()).round() as i32,
            center.1 - (radius * angle.cos()).round() as i32,
        )
    };

    let mut points = Vec::with_capacity(steps * 2 + 2);
    for i in 0..=steps {
        let a = start + (end - start) * i as f64 / steps as f64;
        points.push(point(outer, a));
    }
    for i in (0..=steps).rev() {
        let a = start + (end - start) * i as f64 / steps as f64;
        points.push(point(inner, a));
    }
    points
}

// ============================================================================
// Chart Generation (plotters)
// ============================================================================

/// Daily calorie line with the goal as a reference line; days over the goal
/// are marked in dark red
pub fn generate_trend_chart(
    series: &[DailyTotals],
    goal_kcal: f64,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, String> {
    use plotters::prelude::*;

    if series.is_empty() {
        return Err("No data to chart".to_string());
    }

    let mut buffer = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let y_max = series
            .iter()
            .map(|d| d.totals.kcal)
            .fold(goal_kcal, f64::max)
            .max(100.0)
            * 1.15;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(0..(series.len() as i32), 0.0..y_max)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .x_labels(series.len().min(10))
            .x_label_formatter(&|x| {
                if *x >= 0 && (*x as usize) < series.len() {
                    short_date(&series[*x as usize])
                } else {
                    String::new()
                }
            })
            .y_desc("kcal")
            .draw()
            .map_err(|e| e.to_string())?;

        if goal_kcal > 0.0 {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(0, goal_kcal), (series.len() as i32, goal_kcal)],
                    rgb(COLOR_GOAL).stroke_width(1),
                )))
                .map_err(|e| e.to_string())?
                .label("Goal")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], rgb(COLOR_GOAL).stroke_width(1)));
        }

        let points: Vec<(i32, f64)> = series
            .iter()
            .enumerate()
            .map(|(i, d)| (i as i32, d.totals.kcal))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), rgb(COLOR_KCAL).stroke_width(2)))
            .map_err(|e| e.to_string())?
            .label("Calories")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], rgb(COLOR_KCAL).stroke_width(2)));

        chart
            .draw_series(points.iter().map(|(x, y)| {
                let color = if goal_kcal > 0.0 && *y > goal_kcal {
                    rgb(OVER_BUDGET_COLOR)
                } else {
                    rgb(COLOR_KCAL)
                };
                Circle::new((*x, *y), 4, color.filled())
            }))
            .map_err(|e| e.to_string())?;

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
    }

    encode_png(buffer, width, height)
}

/// Donut of the calorie split between fat, carbs and protein
pub fn generate_macro_donut(totals: &Macros, width: u32, height: u32) -> Result<Vec<u8>, String> {
    use plotters::prelude::*;

    let shares = macro_shares(totals).ok_or("No macros to chart")?;

    let mut buffer = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let center = (width as i32 / 2, height as i32 / 2 - 20);
        let outer = (width.min(height) as f64) * 0.35;
        let inner = outer * 0.55;

        let slices = [
            ("Fat", shares[0], COLOR_FAT),
            ("Carbs", shares[1], COLOR_CARBS),
            ("Protein", shares[2], COLOR_PROTEIN),
        ];

        let mut angle = 0.0;
        for (_, share, color) in slices.iter() {
            if *share <= 0.0 {
                continue;
            }
            let end = angle + share * 2.0 * PI;
            root.draw(&Polygon::new(ring_slice(center, outer, inner, angle, end), rgb(*color).filled()))
                .map_err(|e| e.to_string())?;
            angle = end;
        }

        root.draw(&Text::new(
            format!("{:.0} kcal", totals.kcal),
            (center.0 - 45, center.1 - 10),
            ("sans-serif", 22).into_font().color(&BLACK),
        ))
        .map_err(|e| e.to_string())?;

        let legend_y = height as i32 - 50;
        for (i, (label, share, color)) in slices.iter().enumerate() {
            let x = 40 + i as i32 * (width as i32 - 80) / 3;
            root.draw(&Rectangle::new([(x, legend_y), (x + 16, legend_y + 16)], rgb(*color).filled()))
                .map_err(|e| e.to_string())?;
            root.draw(&Text::new(
                format!("{} {:.0}%", label, share * 100.0),
                (x + 22, legend_y),
                ("sans-serif", 18).into_font().color(&BLACK),
            ))
            .map_err(|e| e.to_string())?;
        }

        root.present().map_err(|e| e.to_string())?;
    }

    encode_png(buffer, width, height)
}

/// Calories per meal as bars, in fixed meal order
pub fn generate_meal_split_chart(meals: &[MealTotals], width: u32, height: u32) -> Result<Vec<u8>, String> {
    use plotters::prelude::*;

    if meals.iter().all(|m| m.totals.kcal <= 0.0) {
        return Err("No data to chart".to_string());
    }

    let mut buffer = vec![0u8; (width * height * 3) as usize];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| e.to_string())?;

        let y_max = meals.iter().map(|m| m.totals.kcal).fold(0.0, f64::max) * 1.15;
        let count = meals.len() as f64;

        let mut chart = ChartBuilder::on(&root)
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5..(count - 0.5), 0.0..y_max)
            .map_err(|e| e.to_string())?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(meals.len())
            .x_label_formatter(&|x| {
                let idx = x.round();
                if (x - idx).abs() < 1e-6 && idx >= 0.0 && (idx as usize) < meals.len() {
                    meals[idx as usize].meal.label().to_string()
                } else {
                    String::new()
                }
            })
            .y_desc("kcal")
            .draw()
            .map_err(|e| e.to_string())?;

        chart
            .draw_series(meals.iter().enumerate().map(|(i, m)| {
                let x = i as f64;
                let color = match m.meal {
                    MealType::Breakfast => COLOR_FAT,
                    MealType::Lunch => COLOR_CARBS,
                    MealType::Dinner => COLOR_KCAL,
                    MealType::Snack => COLOR_PROTEIN,
                    MealType::Other => COLOR_GOAL,
                };
                Rectangle::new([(x - 0.35, 0.0), (x + 0.35, m.totals.kcal)], rgb(color).filled())
            }))
            .map_err(|e| e.to_string())?;

        root.present().map_err(|e| e.to_string())?;
    }

    encode_png(buffer, width, height)
}

// ============================================================================
// Tools
// ============================================================================

/// Render the daily calorie trend over a range to a PNG file
pub fn render_trend_chart(
    db: &Database,
    chart_dir: &Path,
    start_date: &str,
    end_date: &str,
) -> Result<ChartResponse, String> {
    let (start, end) = parse_range(start_date, end_date)?;
    let (entries, catalog) = load_range(db, start, end)?;
    let goals = load_goals(db)?;

    let series = daily_series(&entries, &catalog, start, end);
    let (width, height) = TREND_SIZE;
    let png = generate_trend_chart(&series, goals.kcal, width, height)?;
    let path = write_png(chart_dir, &format!("trend_{}_{}.png", start, end), &png)?;

    Ok(ChartResponse {
        success: true,
        file_path: path.display().to_string(),
        width,
        height,
        message: format!("Trend chart for {} days", series.len()),
    })
}

/// Render the calorie split between macros for one day
pub fn render_macro_donut(db: &Database, chart_dir: &Path, date: &str) -> Result<ChartResponse, String> {
    let date = parse_date(date)?;
    let (entries, catalog) = load_range(db, date, date)?;

    let day_totals = totals(&entries, &catalog);
    let (width, height) = DONUT_SIZE;
    let png = generate_macro_donut(&day_totals, width, height)
        .map_err(|e| format!("{} for {}", e, date))?;
    let path = write_png(chart_dir, &format!("macros_{}.png", date), &png)?;

    Ok(ChartResponse {
        success: true,
        file_path: path.display().to_string(),
        width,
        height,
        message: format!("Macro split for {} ({:.0} kcal)", date, day_totals.kcal),
    })
}

/// Render calories per meal for one day
pub fn render_meal_split_chart(
    db: &Database,
    chart_dir: &Path,
    date: &str,
) -> Result<ChartResponse, String> {
    let date = parse_date(date)?;
    let (entries, catalog) = load_range(db, date, date)?;

    let meals = meal_split(&entries, &catalog);
    let (width, height) = MEAL_SIZE;
    let png = generate_meal_split_chart(&meals, width, height)
        .map_err(|e| format!("{} for {}", e, date))?;
    let path = write_png(chart_dir, &format!("meals_{}.png", date), &png)?;

    Ok(ChartResponse {
        success: true,
        file_path: path.display().to_string(),
        width,
        height,
        message: format!("Meal split for {}", date),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_png_signature() {
        let png = encode_png(vec![255u8; 4 * 3 * 3], 4, 3).unwrap();
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);
    }

    #[test]
    fn test_encode_png_rejects_short_buffer() {
        assert!(encode_png(vec![0u8; 5], 4, 3).is_err());
    }

    #[test]
    fn test_macro_shares() {
        let shares = macro_shares(&Macros::new(0.0, 10.0, 45.0, 22.5)).unwrap();
        assert!((shares[0] - 0.25).abs() < 1e-9);
        assert!((shares[1] - 0.5).abs() < 1e-9);
        assert!((shares[2] - 0.25).abs() < 1e-9);
        assert!(macro_shares(&Macros::zero()).is_none());
    }

    #[test]
    fn test_ring_slice_bounds() {
        let points = ring_slice((100, 100), 50.0, 25.0, 0.0, PI / 2.0);
        assert_eq!(points.first(), Some(&(100, 50)));
        assert!(points.contains(&(150, 100)));
        assert_eq!(points.last(), Some(&(100, 75)));
    }

    #[test]
    fn test_empty_inputs_are_rejected() {
        assert!(generate_trend_chart(&[], 2000.0, 100, 100).is_err());
        assert!(generate_macro_donut(&Macros::zero(), 100, 100).is_err());
        let meals: Vec<MealTotals> = MealType::ALL
            .iter()
            .map(|&meal| MealTotals { meal, totals: Macros::zero(), entry_count: 0 })
            .collect();
        assert!(generate_meal_split_chart(&meals, 100, 100).is_err());
    }
}
