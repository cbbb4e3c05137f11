use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::config::settings;
use crate::db::tables::history_window;
use crate::controllers::require_admin;
use crate::AppState;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/tools").route(web::get().to(list_tools)));
    cfg.service(web::resource("/api/tools/execute").route(web::post().to(execute_tool)));
    cfg.service(web::resource("/api/tools/history").route(web::get().to(execution_history)));
    cfg.service(
        web::resource("/api/tools/config")
            .route(web::get().to(get_tool_config))
            .route(web::put().to(update_tool_config)),
    );
}

/// The registry's definitions, in the shape handed to the LLM client.
async fn list_tools(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    HttpResponse::Ok().json(serde_json::json!({
        "tools": state.registry.definitions()
    }))
}

/// Run one raw tool request through the pipeline. The response is
/// always 200 with the wire envelope; `success` carries the outcome.
async fn execute_tool(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<Value>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    let envelope = state.pipeline.run(&body.into_inner()).await;
    HttpResponse::Ok().json(envelope)
}

#[derive(Deserialize)]
struct HistoryQuery {
    days: Option<i64>,
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn execution_history(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<HistoryQuery>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    let days = query.days.unwrap_or(state.config.log_retention_days);
    let since = history_window(Utc::now(), days);
    let limit = query.limit.filter(|n| *n > 0).unwrap_or(50);
    let offset = query.offset.filter(|n| *n >= 0).unwrap_or(0);

    let summary = match state.db.tool_execution_summary(since) {
        Ok(s) => s,
        Err(e) => {
            log::error!("history summary query failed: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({"error": "failed to read execution history"}));
        }
    };
    let executions = match state.db.tool_execution_history(since, limit, offset) {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("history query failed: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({"error": "failed to read execution history"}));
        }
    };

    HttpResponse::Ok().json(serde_json::json!({
        "period_days": days,
        "summary": summary,
        "executions": executions,
    }))
}

async fn get_tool_config(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    HttpResponse::Ok().json(serde_json::json!({
        "tools": state.registry.definitions().iter().map(|d| d.name.clone()).collect::<Vec<_>>(),
        "allowed_commands": state.config.allowed_commands,
        "enforce_allowlist": state.config.enforce_allowlist,
        "commerce_enabled": state.config.commerce_enabled,
        "log_retention_days": state.config.log_retention_days,
    }))
}

#[derive(Deserialize)]
struct ToolConfigUpdate {
    allowed_commands: Option<Vec<String>>,
    enforce_allowlist: Option<bool>,
}

/// Persist allow-list settings. Stored values are applied at the next
/// startup; the running registry keeps its construction-time view.
async fn update_tool_config(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ToolConfigUpdate>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }

    if let Some(commands) = &body.allowed_commands {
        let joined = commands.join(",");
        if let Err(e) = state.db.set_setting(settings::ALLOWED_COMMANDS, &joined) {
            log::error!("failed to store allowed commands: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({"error": "failed to store setting"}));
        }
    }
    if let Some(enforce) = body.enforce_allowlist {
        let stored = if enforce { "1" } else { "0" };
        if let Err(e) = state.db.set_setting(settings::ENFORCE_ALLOWLIST, stored) {
            log::error!("failed to store allow-list enforcement flag: {}", e);
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({"error": "failed to store setting"}));
        }
    }

    HttpResponse::Ok().json(serde_json::json!({
        "updated": true,
        "applies": "next startup"
    }))
}
