use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::*;
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use schemars::JsonSchema;
use serde::Deserialize;
use sympto_core::{
    CycleAnalysis, RawObservation, chart_data, phase_description, phase_recommendations,
    phase_report, prediction_report,
};
use sympto_store::{Config, Store, StoreError};
use tokio::sync::Mutex;

use crate::input::ObservationInput;

/// Records returned by `list_records` when no limit is given.
const DEFAULT_LIST_LIMIT: usize = 30;

#[derive(Clone)]
pub struct SymptoServer {
    state: Arc<Mutex<ServerState>>,
    tool_router: ToolRouter<Self>,
}

struct ServerState {
    store: Store,
    config: Config,
}

impl SymptoServer {
    pub fn new(store: Store, config: Config) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServerState { store, config })),
            tool_router: Self::tool_router(),
        }
    }
}

impl ServerState {
    fn user(&self, requested: Option<i64>) -> i64 {
        requested.unwrap_or(self.config.profile.user)
    }

    fn analysis(&self, user: Option<i64>, window: Option<usize>) -> Result<CycleAnalysis, McpError> {
        let window = window.unwrap_or(self.config.analysis.window);
        self.store
            .analyze_user(self.user(user), window)
            .map_err(store_error)
    }
}

/// Caller mistakes become invalid params; everything else is internal.
fn store_error(e: StoreError) -> McpError {
    match e {
        StoreError::Core(_) | StoreError::InvalidData(_) => {
            McpError::invalid_params(e.to_string(), None)
        }
        other => {
            tracing::error!("store failure: {other}");
            McpError::internal_error(other.to_string(), None)
        }
    }
}

fn json_result(value: &serde_json::Value) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(
        serde_json::to_string_pretty(value).unwrap_or_default(),
    )]))
}

// --- Tool parameter types ---

#[derive(Debug, Deserialize, JsonSchema)]
struct RecordRequest {
    /// User id (defaults to the configured profile user)
    user: Option<i64>,
    /// Replace the whole record for that date instead of merging the given fields into it
    #[serde(default)]
    replace: bool,
    #[serde(flatten)]
    observation: ObservationInput,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ListRequest {
    /// User id (defaults to the configured profile user)
    user: Option<i64>,
    /// Maximum number of records, newest first (default 30)
    limit: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct DeleteRequest {
    /// User id (defaults to the configured profile user)
    user: Option<i64>,
    /// Date of the record to delete, YYYY-MM-DD
    date: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct AnalyzeRequest {
    /// User id (defaults to the configured profile user)
    user: Option<i64>,
    /// Number of most recent observed days to analyze (defaults to the configured window)
    window: Option<usize>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct UserRequest {
    /// User id (defaults to the configured profile user)
    user: Option<i64>,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ImportRequest {
    /// User id to import into (defaults to the configured profile user)
    user: Option<i64>,
    /// Export document as produced by export_records
    document: serde_json::Value,
}

#[tool_router]
impl SymptoServer {
    #[tool(
        description = "Record a daily fertility observation: basal body temperature, cervical mucus, menstruation, cervix position, symptoms and a note. Only the given fields are changed; other fields already recorded for that date are kept unless replace is true. The date defaults to today."
    )]
    async fn record_observation(
        &self,
        Parameters(req): Parameters<RecordRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let user = state.user(req.user);

        let obs = req
            .observation
            .into_observation(&state.config.input)
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        let saved = if req.replace {
            state.store.upsert_record(user, &obs).map_err(store_error)?;
            obs
        } else {
            state.store.apply_patch(user, &obs).map_err(store_error)?
        };
        let count = state.store.record_count(user).map_err(store_error)?;

        json_result(&serde_json::json!({
            "user": user,
            "record": saved,
            "record_count": count,
        }))
    }

    #[tool(description = "List a user's recorded observations, newest first.")]
    async fn list_records(
        &self,
        Parameters(req): Parameters<ListRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let user = state.user(req.user);
        let records: Vec<RawObservation> = state
            .store
            .recent_records(user, req.limit.unwrap_or(DEFAULT_LIST_LIMIT))
            .map_err(store_error)?;

        json_result(&serde_json::json!({
            "user": user,
            "count": records.len(),
            "records": records,
        }))
    }

    #[tool(description = "Delete the observation recorded for one date.")]
    async fn delete_record(
        &self,
        Parameters(req): Parameters<DeleteRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let user = state.user(req.user);
        let deleted = state
            .store
            .delete_record(user, &req.date)
            .map_err(store_error)?;

        json_result(&serde_json::json!({
            "user": user,
            "date": req.date,
            "deleted": deleted,
        }))
    }

    #[tool(
        description = "Classify every recorded day of the analysis window into a cycle phase (menstrual, follicular, ovulation, luteal, unknown), mark the fertile window and return chart data. Advisory only, not a contraceptive method."
    )]
    async fn analyze_cycle(
        &self,
        Parameters(req): Parameters<AnalyzeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let analysis = state.analysis(req.user, req.window)?;
        let chart = chart_data(&analysis.days);

        json_result(&serde_json::json!({
            "analysis": analysis,
            "chart": chart,
        }))
    }

    #[tool(
        description = "Current cycle phase with a short description and recommendations. Use when the user asks where they are in their cycle."
    )]
    async fn current_phase(
        &self,
        Parameters(req): Parameters<AnalyzeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let analysis = state.analysis(req.user, req.window)?;
        let phase = analysis.prediction.current_phase;

        json_result(&serde_json::json!({
            "phase": phase,
            "label": phase.label(),
            "status": analysis.status,
            "needs_more_data": analysis.status.needs_more_data(),
            "description": phase_description(phase),
            "recommendations": phase_recommendations(phase),
            "report": phase_report(&analysis),
        }))
    }

    #[tool(
        description = "Fertility summary: ovulation day, fertile days and an approximate next-ovulation date (a fixed 14-day offset from the last record, not a forecast)."
    )]
    async fn predict(
        &self,
        Parameters(req): Parameters<AnalyzeRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let analysis = state.analysis(req.user, req.window)?;

        json_result(&serde_json::json!({
            "status": analysis.status,
            "prediction": analysis.prediction,
            "report": prediction_report(&analysis),
        }))
    }

    #[tool(description = "Export all of a user's observations as a versioned JSON document.")]
    async fn export_records(
        &self,
        Parameters(req): Parameters<UserRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let user = state.user(req.user);
        let json = state.store.export_json_string(user).map_err(store_error)?;

        Ok(CallToolResult::success(vec![Content::text(json)]))
    }

    #[tool(
        description = "Import observations from a document produced by export_records. Records for dates already stored are overwritten; nothing is written if any record is malformed."
    )]
    async fn import_records(
        &self,
        Parameters(req): Parameters<ImportRequest>,
    ) -> Result<CallToolResult, McpError> {
        let state = self.state.lock().await;
        let user = state.user(req.user);
        let json = serde_json::to_string(&req.document)
            .map_err(|e| McpError::internal_error(e.to_string(), None))?;
        let imported = state
            .store
            .import_json_str(user, &json)
            .map_err(store_error)?;
        let count = state.store.record_count(user).map_err(store_error)?;

        json_result(&serde_json::json!({
            "user": user,
            "imported": imported,
            "record_count": count,
        }))
    }
}

#[tool_handler]
impl ServerHandler for SymptoServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Sympto-thermal cycle tracker. Help the user log daily fertility observations and \
                 understand their cycle.\n\n\
                 RECORDING:\n\
                 - Call record_observation whenever the user reports a morning temperature, mucus, \
                   bleeding, cervix position or symptoms. Ask for a missing date only if they clearly \
                   mean a day other than today.\n\
                 - Temperatures are °C; '36,6' and '36.6' are both fine. If a value is rejected, \
                   relay the reason and ask again.\n\n\
                 INTERPRETING:\n\
                 - current_phase for 'where am I in my cycle', predict for fertile days and the next \
                   ovulation, analyze_cycle for a day-by-day view or a chart.\n\
                 - At least 6 temperature readings are needed before ovulation can be detected. When \
                   needs_more_data is true, encourage regular measurements instead of guessing.\n\
                 - Results are advisory. Never present them as a contraceptive method or a diagnosis."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
