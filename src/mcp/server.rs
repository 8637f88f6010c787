//! Macrotrack MCP Server Implementation
//!
//! Implements the MCP server with all Macrotrack tools.

use std::path::PathBuf;
use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::db::Database;
use crate::models::{FoodCategory, FoodDraft, FoodUpdate, GoalsUpdate};
use crate::nutrition::UnitMode;
use crate::tools::status::StatusTracker;
use crate::tools::{backup, charts, dashboard, entries, foods, goals, reports, sync};

/// Macrotrack MCP Service
#[derive(Clone)]
pub struct MacrotrackService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    config: Arc<Config>,
    tool_router: ToolRouter<MacrotrackService>,
}

impl MacrotrackService {
    pub fn new(config: Config, database: Database) -> Self {
        let tracker = StatusTracker::new(
            config.database_path.clone(),
            config.chart_dir.clone(),
            config.remote.is_some(),
        );
        Self {
            status_tracker: Arc::new(Mutex::new(tracker)),
            database,
            config: Arc::new(config),
            tool_router: Self::tool_router(),
        }
    }

    fn chart_dir(&self, output_dir: Option<&str>) -> PathBuf {
        output_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| self.config.chart_dir.clone())
    }
}

fn parse_unit(unit: &str) -> Result<UnitMode, McpError> {
    UnitMode::from_str(unit).ok_or_else(|| {
        McpError::invalid_params(
            format!("Invalid unit '{}'. Valid values: per100g, perServing", unit),
            None,
        )
    })
}

// ============================================================================
// Food Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddFoodParams {
    pub name: String,
    pub brand: Option<String>,
    /// meat, fish, dairy, eggs, grains, legumes, vegetables, fruit, nuts, fats, sweets, drinks, prepared, other
    pub category: Option<String>,
    /// "per100g" (values per 100 g, quantities in grams) or "perServing" (values per serving, quantities in servings)
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Grams in one serving; required for perServing
    pub serving_size: Option<f64>,
    pub kcal: f64,
    #[serde(default)]
    pub fat: f64,
    #[serde(default)]
    pub carbs: f64,
    #[serde(default)]
    pub protein: f64,
}

fn default_unit() -> String { "per100g".to_string() }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SearchFoodsParams {
    pub query: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 { 20 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct FoodIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListFoodsParams {
    pub category: Option<String>,
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_list_limit() -> i64 { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateFoodParams {
    pub id: i64,
    pub name: Option<String>,
    /// Empty string clears the brand
    pub brand: Option<String>,
    pub category: Option<String>,
    /// Switching unit converts the quantity of every entry using this food
    pub unit: Option<String>,
    pub serving_size: Option<f64>,
    pub kcal: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub protein: Option<f64>,
}

// ============================================================================
// Entry Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LogEntryParams {
    /// YYYY-MM-DD or "today"
    pub date: String,
    pub food_id: i64,
    /// Grams for per100g foods, servings for perServing foods
    pub quantity: f64,
    /// breakfast, lunch, dinner, snack or other
    pub meal: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct EntryIdParams {
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListEntriesParams {
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub meal: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateEntryParams {
    pub id: i64,
    pub date: Option<String>,
    /// Moving to another food converts the quantity unless quantity is also given
    pub food_id: Option<i64>,
    pub quantity: Option<f64>,
    pub meal: Option<String>,
}

// ============================================================================
// Goal Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetGoalsParams {
    pub kcal: Option<f64>,
    pub fat: Option<f64>,
    pub carbs: Option<f64>,
    pub protein: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetProfileParams {
    pub age: Option<u32>,
    /// female, male or other
    pub sex: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub body_fat_pct: Option<f64>,
    /// sedentary, light, moderate, active or very_active
    pub activity: Option<String>,
}

// ============================================================================
// Dashboard Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DateParams {
    /// YYYY-MM-DD or "today"
    pub date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DateRangeParams {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TopFoodsParams {
    pub start_date: String,
    pub end_date: String,
    /// kcal, fat, carbs or protein
    #[serde(default = "default_nutrient")]
    pub nutrient: String,
    pub limit: Option<usize>,
}

fn default_nutrient() -> String { "kcal".to_string() }

// ============================================================================
// Chart and Report Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TrendChartParams {
    pub start_date: String,
    pub end_date: String,
    /// Directory for the PNG; defaults to the configured chart directory
    pub output_dir: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DayChartParams {
    pub date: String,
    pub output_dir: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GenerateReportParams {
    pub start_date: String,
    pub end_date: String,
    /// PDF path; defaults to nutrition_report_<start>_<end>.pdf in the chart directory
    pub output_path: Option<String>,
    pub notes: Option<Vec<String>>,
}

// ============================================================================
// Backup and Remote Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ExportDataParams {
    pub file_path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ImportDataParams {
    pub file_path: String,
    /// "merge" (add under new ids) or "replace" (clear the store first)
    #[serde(default = "default_import_mode")]
    pub mode: String,
}

fn default_import_mode() -> String { "merge".to_string() }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemotePushParams {
    /// Push only entries in this range; all entries when omitted
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemotePullParams {
    #[serde(default = "default_import_mode")]
    pub mode: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

// ============================================================================
// Tool Router
// ============================================================================

#[tool_router]
impl MacrotrackService {
    // --- Status ---

    #[tool(description = "Get the current status of the Macrotrack service including build info, database status, and process information")]
    async fn macrotrack_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status();
        let json = serde_json::to_string_pretty(&status)
            .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get step-by-step instructions for logging food. Call this when starting a logging session or when unsure how units, conversions or goals work.")]
    fn logging_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::LOGGING_INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(LOGGING_INSTRUCTIONS)]))
    }

    // --- Foods ---

    #[tool(description = "Create a food with calories and macros per 100 g (unit per100g) or per serving (unit perServing, requires serving_size in grams)")]
    fn add_food(&self, Parameters(p): Parameters<AddFoodParams>) -> Result<CallToolResult, McpError> {
        let data = FoodDraft {
            name: p.name,
            brand: p.brand,
            category: p.category.as_deref().map(FoodCategory::from_str).unwrap_or_default(),
            unit: parse_unit(&p.unit)?,
            serving_size: p.serving_size,
            kcal: p.kcal, fat: p.fat, carbs: p.carbs, protein: p.protein,
        };
        let result = foods::add_food(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Search foods by name or brand")]
    fn search_foods(&self, Parameters(p): Parameters<SearchFoodsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::search_foods(&self.database, &p.query, p.limit).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get full details for a food including how many entries use it")]
    fn get_food(&self, Parameters(p): Parameters<FoodIdParams>) -> Result<CallToolResult, McpError> {
        let result = foods::get_food(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(food) => serde_json::to_string_pretty(&food),
            None => Ok(format!(r#"{{"error": "Food not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List foods with optional category filter and pagination")]
    fn list_foods(&self, Parameters(p): Parameters<ListFoodsParams>) -> Result<CallToolResult, McpError> {
        let result = foods::list_foods(&self.database, p.category.as_deref(), p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update a food. Changing its unit converts the quantity of every entry that uses it; changing only serving_size does not.")]
    fn update_food(&self, Parameters(p): Parameters<UpdateFoodParams>) -> Result<CallToolResult, McpError> {
        let unit = match p.unit.as_deref() {
            Some(u) => Some(parse_unit(u)?),
            None => None,
        };
        let data = FoodUpdate {
            name: p.name,
            brand: p.brand,
            category: p.category.as_deref().map(FoodCategory::from_str),
            unit,
            serving_size: p.serving_size,
            kcal: p.kcal, fat: p.fat, carbs: p.carbs, protein: p.protein,
        };
        let result = foods::update_food(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete a food. Entries that use it are kept and show as Unknown with zero nutrients.")]
    fn delete_food(&self, Parameters(p): Parameters<FoodIdParams>) -> Result<CallToolResult, McpError> {
        let result = foods::delete_food(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Entries ---

    #[tool(description = "Log an entry: a food eaten on a date, with quantity in grams (per100g foods) or servings (perServing foods)")]
    fn log_entry(&self, Parameters(p): Parameters<LogEntryParams>) -> Result<CallToolResult, McpError> {
        let result = entries::log_entry(&self.database, &p.date, p.food_id, p.quantity, p.meal.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get an entry with its resolved food and scaled nutrients")]
    fn get_entry(&self, Parameters(p): Parameters<EntryIdParams>) -> Result<CallToolResult, McpError> {
        let result = entries::get_entry(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = match result {
            Some(entry) => serde_json::to_string_pretty(&entry),
            None => Ok(format!(r#"{{"error": "Entry not found", "id": {}}}"#, p.id)),
        }.map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "List entries for a date, a date range and/or a meal, with their totals")]
    fn list_entries(&self, Parameters(p): Parameters<ListEntriesParams>) -> Result<CallToolResult, McpError> {
        let result = entries::list_entries(
            &self.database,
            p.date.as_deref(),
            p.start_date.as_deref(),
            p.end_date.as_deref(),
            p.meal.as_deref(),
            p.limit,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Update an entry. Reassigning it to a food with a different unit converts the quantity unless a quantity is given.")]
    fn update_entry(&self, Parameters(p): Parameters<UpdateEntryParams>) -> Result<CallToolResult, McpError> {
        let result = entries::update_entry(
            &self.database,
            p.id,
            p.date.as_deref(),
            p.food_id,
            p.quantity,
            p.meal.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Delete an entry")]
    fn delete_entry(&self, Parameters(p): Parameters<EntryIdParams>) -> Result<CallToolResult, McpError> {
        let deleted = entries::delete_entry(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        let json = if deleted {
            format!(r#"{{"success": true, "deleted_id": {}}}"#, p.id)
        } else {
            format!(r#"{{"error": "Entry not found", "id": {}}}"#, p.id)
        };
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Goals ---

    #[tool(description = "Get the daily kcal, fat, carbs and protein goals")]
    fn get_goals(&self) -> Result<CallToolResult, McpError> {
        let result = goals::get_goals(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Set any of the daily goals; omitted goals keep their value")]
    fn set_goals(&self, Parameters(p): Parameters<SetGoalsParams>) -> Result<CallToolResult, McpError> {
        let data = GoalsUpdate { kcal: p.kcal, fat: p.fat, carbs: p.carbs, protein: p.protein };
        let result = goals::set_goals(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Get the body profile (age, sex, height, weight, body fat, activity)")]
    fn get_profile(&self) -> Result<CallToolResult, McpError> {
        let result = goals::get_profile(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Replace the body profile")]
    fn set_profile(&self, Parameters(p): Parameters<SetProfileParams>) -> Result<CallToolResult, McpError> {
        let result = goals::set_profile(
            &self.database,
            p.age,
            p.sex.as_deref(),
            p.height_cm,
            p.weight_kg,
            p.body_fat_pct,
            p.activity.as_deref(),
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Dashboard ---

    #[tool(description = "Daily view: entries with display names, totals, goal percentages (not capped at 100), remaining or over budget, and the meal split")]
    fn day_summary(&self, Parameters(p): Parameters<DateParams>) -> Result<CallToolResult, McpError> {
        let result = dashboard::day_summary(&self.database, &p.date).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Daily totals for every day in a range (empty days included as zero) plus averages over days with entries")]
    fn trend(&self, Parameters(p): Parameters<DateRangeParams>) -> Result<CallToolResult, McpError> {
        let result = dashboard::trend(&self.database, &p.start_date, &p.end_date)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Foods contributing the most of one nutrient over a range (default top 5 by kcal)")]
    fn top_foods(&self, Parameters(p): Parameters<TopFoodsParams>) -> Result<CallToolResult, McpError> {
        let result = dashboard::top_foods(&self.database, &p.start_date, &p.end_date, &p.nutrient, p.limit)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Charts and Reports ---

    #[tool(description = "Render the daily calorie trend for a range as a PNG line chart, with the goal line and over-goal days in dark red")]
    fn render_trend_chart(&self, Parameters(p): Parameters<TrendChartParams>) -> Result<CallToolResult, McpError> {
        let dir = self.chart_dir(p.output_dir.as_deref());
        let result = charts::render_trend_chart(&self.database, &dir, &p.start_date, &p.end_date)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Render the calorie split between fat, carbs and protein for a day as a PNG donut chart")]
    fn render_macro_donut(&self, Parameters(p): Parameters<DayChartParams>) -> Result<CallToolResult, McpError> {
        let dir = self.chart_dir(p.output_dir.as_deref());
        let result = charts::render_macro_donut(&self.database, &dir, &p.date)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Render calories per meal for a day as a PNG bar chart")]
    fn render_meal_split_chart(&self, Parameters(p): Parameters<DayChartParams>) -> Result<CallToolResult, McpError> {
        let dir = self.chart_dir(p.output_dir.as_deref());
        let result = charts::render_meal_split_chart(&self.database, &dir, &p.date)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Generate a PDF nutrition report for a date range: averages against goals, top foods, daily totals and the calorie trend chart")]
    fn generate_nutrition_report(&self, Parameters(p): Parameters<GenerateReportParams>) -> Result<CallToolResult, McpError> {
        let output_path = p.output_path.unwrap_or_else(|| {
            self.config
                .chart_dir
                .join(format!("nutrition_report_{}_{}.pdf", p.start_date, p.end_date))
                .display()
                .to_string()
        });
        let result = reports::generate_nutrition_report(&self.database, &p.start_date, &p.end_date, &output_path, p.notes)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Backup ---

    #[tool(description = "Export goals, profile, foods and entries to a JSON backup file")]
    fn export_data(&self, Parameters(p): Parameters<ExportDataParams>) -> Result<CallToolResult, McpError> {
        let result = backup::export_data(&self.database, &p.file_path).map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Import a JSON backup file. mode=merge adds foods and entries under new ids; mode=replace clears the store first. Unusable rows are skipped and counted.")]
    fn import_data(&self, Parameters(p): Parameters<ImportDataParams>) -> Result<CallToolResult, McpError> {
        let result = backup::import_data(&self.database, &p.file_path, &p.mode)
            .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    // --- Remote ---

    #[tool(description = "Push foods, goals and entries (optionally a date range) to the configured remote backend")]
    async fn remote_push(&self, Parameters(p): Parameters<RemotePushParams>) -> Result<CallToolResult, McpError> {
        let result = sync::remote_push(
            &self.database,
            self.config.remote.as_ref(),
            p.start_date.as_deref(),
            p.end_date.as_deref(),
        )
        .await
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(description = "Pull foods, goals and entries from the configured remote backend, matching rows on id (mode merge or replace; replace with a date range clears only local entries in that range)")]
    async fn remote_pull(&self, Parameters(p): Parameters<RemotePullParams>) -> Result<CallToolResult, McpError> {
        let result = sync::remote_pull(
            &self.database,
            self.config.remote.as_ref(),
            &p.mode,
            p.start_date.as_deref(),
            p.end_date.as_deref(),
        )
        .await
        .map_err(|e| McpError::internal_error(e, None))?;
        let json = serde_json::to_string_pretty(&result).map_err(|e| McpError::internal_error(e.to_string(), None))?;
        Ok(CallToolResult::success(vec![Content::text(json)]))
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for MacrotrackService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "macrotrack".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Macrotrack".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Macrotrack - calorie and macro tracking against daily goals. \
                 IMPORTANT: Call logging_instructions before logging food. \
                 Foods: add/get/search/list/update/delete_food (unit per100g or perServing). \
                 Entries: log/get/list/update/delete_entry. \
                 Goals: get/set_goals, get/set_profile. \
                 Dashboard: day_summary, trend, top_foods. \
                 Charts: render_trend_chart, render_macro_donut, render_meal_split_chart. \
                 Reports: generate_nutrition_report. \
                 Backup: export_data, import_data. \
                 Remote: remote_push, remote_pull (when configured)."
                    .into(),
            ),
        }
    }
}
