use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use worker::{Context, Env, Request, Response, Result, RouteContext, Router};

use crate::actions;
use crate::auth;
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::export;
use crate::models::{
    CreatedResponse, D1_BINDING, LoginRequest, NextNumberResponse, PreviewRequest,
    SaveDraftRequest, SessionResponse, SuccessResponse, WizardRequest,
};
use crate::schema::{self, Collection, DocumentForm, DocumentType};
use crate::store::D1Store;

#[derive(Debug, Clone)]
pub struct AppState {
    pub config: AppConfig,
}

pub async fn handle(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    let state = AppState {
        config: AppConfig::from_env(&env),
    };

    Router::with_data(state)
        .post_async("/api/auth/login", login_route)
        .post_async("/api/auth/logout", logout_route)
        .get_async("/api/session", session_route)
        .get_async("/api/invoices/generate-number", next_number_route)
        .post_async("/api/wizard/step", wizard_step_route)
        .post_async("/api/preview/pages", preview_route)
        .post_async("/api/export/pdf", export_route)
        .get_async("/api/documents", list_documents_route)
        .post_async("/api/documents", create_document_route)
        .get_async("/api/documents/:id", get_document_route)
        .put_async("/api/documents/:id", update_document_route)
        .delete_async("/api/documents/:id", delete_document_route)
        .get_async("/api/documents/:id/pdf", document_pdf_route)
        .get_async("/api/drafts", list_drafts_route)
        .post_async("/api/drafts", save_draft_route)
        .get_async("/api/drafts/:id", get_draft_route)
        .delete_async("/api/drafts/:id", delete_draft_route)
        .run(req, env)
        .await
}

async fn login_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let config = &ctx.data.config;
    let outcome = async {
        let body = read_json::<LoginRequest>(&mut req).await?;
        auth::verify_token(config.admin_token.as_deref(), &body.token)?;
        Ok::<_, ApiError>(body.token)
    }
    .await;

    match outcome {
        Ok(token) => {
            let mut response = json_response(&SuccessResponse { success: true })?;
            response.headers_mut().set(
                "Set-Cookie",
                &auth::session_cookie(&config.cookie_name, &token, config.secure_cookies),
            )?;
            Ok(response)
        }
        Err(error) => {
            if let ApiError::Config(detail) = &error {
                worker::console_error!("login rejected: {detail}");
            }
            error.into_response()
        }
    }
}

async fn logout_route(_req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let config = &ctx.data.config;
    let mut response = json_response(&SuccessResponse { success: true })?;
    response.headers_mut().set(
        "Set-Cookie",
        &auth::clear_session_cookie(&config.cookie_name, config.secure_cookies),
    )?;
    Ok(response)
}

async fn session_route(req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let authenticated = require_session(&req, &ctx.data.config).is_ok();
    json_response(&SessionResponse { authenticated })
}

async fn next_number_route(req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let outcome = async {
        require_session(&req, &ctx.data.config)?;
        let query = parse_query(&req)?;
        let document_type = parse_document_type(&query)?;
        let store = d1_store(&ctx)?;
        let next_number = actions::next_number(&store, &ctx.data.config, document_type).await?;
        Ok::<_, ApiError>(NextNumberResponse { next_number })
    }
    .await;

    match outcome {
        Ok(response) => json_response(&response),
        Err(error) => error.into_response(),
    }
}

async fn wizard_step_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let outcome = async {
        require_session(&req, &ctx.data.config)?;
        let request = read_with_form::<WizardRequest>(&mut req).await?;
        actions::navigate(&request)
    }
    .await;

    match outcome {
        Ok(response) => json_response(&response),
        Err(error) => error.into_response(),
    }
}

async fn preview_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let outcome = async {
        require_session(&req, &ctx.data.config)?;
        let request = read_with_form::<PreviewRequest>(&mut req).await?;
        Ok::<_, ApiError>(actions::preview(&request))
    }
    .await;

    match outcome {
        Ok(response) => json_response(&response),
        Err(error) => error.into_response(),
    }
}

async fn export_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let outcome = async {
        require_session(&req, &ctx.data.config)?;
        let form = read_form(&mut req).await?;
        pdf_response(&form)
    }
    .await;

    match outcome {
        Ok(response) => Ok(response),
        Err(error) => {
            worker::console_error!("pdf export failed: {error}");
            error.into_response()
        }
    }
}

async fn list_documents_route(req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let outcome = async {
        require_session(&req, &ctx.data.config)?;
        let query = parse_query(&req)?;
        let collection = parse_collection(&query)?;
        let store = d1_store(&ctx)?;
        actions::list_documents(&store, collection).await
    }
    .await;

    match outcome {
        Ok(records) => json_response(&records),
        Err(error) => error.into_response(),
    }
}

async fn create_document_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let outcome = async {
        require_session(&req, &ctx.data.config)?;
        let form = read_form(&mut req).await?;
        let store = d1_store(&ctx)?;
        actions::create_document(&store, &form, now_utc()).await
    }
    .await;

    match outcome {
        Ok(record) => {
            worker::console_log!(
                "created {} {} (id {})",
                record.fields.collection.as_str(),
                record.fields.number,
                record.id
            );
            Ok(json_response(&CreatedResponse {
                success: true,
                id: record.id,
            })?
            .with_status(201))
        }
        Err(error) => {
            log_write_failure("create", &error);
            error.into_response()
        }
    }
}

async fn get_document_route(req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let outcome = async {
        require_session(&req, &ctx.data.config)?;
        let id = parse_id(&ctx)?;
        let store = d1_store(&ctx)?;
        actions::find_document(&store, id).await
    }
    .await;

    match outcome {
        Ok(record) => json_response(&record),
        Err(error) => error.into_response(),
    }
}

async fn update_document_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let outcome = async {
        require_session(&req, &ctx.data.config)?;
        let id = parse_id(&ctx)?;
        let form = read_form(&mut req).await?;
        let store = d1_store(&ctx)?;
        actions::update_document(&store, id, &form, now_utc()).await
    }
    .await;

    match outcome {
        Ok(record) => {
            worker::console_log!("updated document {}", record.id);
            json_response(&record)
        }
        Err(error) => {
            log_write_failure("update", &error);
            error.into_response()
        }
    }
}

async fn delete_document_route(req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let outcome = async {
        require_session(&req, &ctx.data.config)?;
        let id = parse_id(&ctx)?;
        let store = d1_store(&ctx)?;
        actions::delete_document(&store, id).await
    }
    .await;

    match outcome {
        Ok(()) => json_response(&SuccessResponse { success: true }),
        Err(error) => error.into_response(),
    }
}

async fn document_pdf_route(req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let outcome = async {
        require_session(&req, &ctx.data.config)?;
        let id = parse_id(&ctx)?;
        let store = d1_store(&ctx)?;
        let record = actions::find_document(&store, id).await?;
        pdf_response(&record.to_form())
    }
    .await;

    match outcome {
        Ok(response) => Ok(response),
        Err(error) => {
            worker::console_error!("pdf export failed: {error}");
            error.into_response()
        }
    }
}

async fn list_drafts_route(req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let outcome = async {
        require_session(&req, &ctx.data.config)?;
        let store = d1_store(&ctx)?;
        actions::list_drafts(&store).await
    }
    .await;

    match outcome {
        Ok(drafts) => json_response(&drafts),
        Err(error) => error.into_response(),
    }
}

async fn save_draft_route(mut req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let outcome = async {
        require_session(&req, &ctx.data.config)?;
        let request = read_json::<SaveDraftRequest>(&mut req).await?;
        let store = d1_store(&ctx)?;
        actions::save_draft(
            &store,
            request.id,
            request.name.as_deref(),
            request.data,
            request.current_step,
            now_utc(),
        )
        .await
    }
    .await;

    match outcome {
        Ok(draft) => json_response(&draft),
        Err(error) => error.into_response(),
    }
}

async fn get_draft_route(req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let outcome = async {
        require_session(&req, &ctx.data.config)?;
        let id = parse_id(&ctx)?;
        let store = d1_store(&ctx)?;
        actions::find_draft(&store, id).await
    }
    .await;

    match outcome {
        Ok(draft) => json_response(&draft),
        Err(error) => error.into_response(),
    }
}

async fn delete_draft_route(req: Request, ctx: RouteContext<AppState>) -> Result<Response> {
    let outcome = async {
        require_session(&req, &ctx.data.config)?;
        let id = parse_id(&ctx)?;
        let store = d1_store(&ctx)?;
        actions::delete_draft(&store, id).await
    }
    .await;

    match outcome {
        Ok(()) => json_response(&SuccessResponse { success: true }),
        Err(error) => error.into_response(),
    }
}

fn require_session(req: &Request, config: &AppConfig) -> Result<(), ApiError> {
    let cookie_header = req.headers().get("Cookie")?;
    if auth::has_session(
        cookie_header.as_deref(),
        &config.cookie_name,
        config.admin_token.as_deref(),
    ) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized("login required".to_string()))
    }
}

fn d1_store(ctx: &RouteContext<AppState>) -> Result<D1Store, ApiError> {
    Ok(D1Store::new(ctx.env.d1(D1_BINDING)?))
}

fn pdf_response(form: &DocumentForm) -> Result<Response, ApiError> {
    let exported = export::render_pdf(form);
    let mut response = Response::from_bytes(exported.bytes)?;
    response.headers_mut().set("Content-Type", "application/pdf")?;
    response.headers_mut().set(
        "Content-Disposition",
        &format!("attachment; filename=\"{}\"", export::export_filename(form)),
    )?;
    response
        .headers_mut()
        .set("X-Page-Count", &exported.pagination.page_count().to_string())?;
    response.headers_mut().set("Cache-Control", "no-store")?;
    Ok(response)
}

fn log_write_failure(action: &str, error: &ApiError) {
    match error {
        ApiError::Conflict(message) => {
            worker::console_log!("{action} rejected: {message}");
        }
        ApiError::Validation(_) | ApiError::Parse(_) | ApiError::NotFound(_) => {}
        _ => worker::console_error!("{action} failed: {error}"),
    }
}

fn json_response<T>(payload: &T) -> Result<Response>
where
    T: Serialize,
{
    let mut response = Response::from_json(payload)?;
    response.headers_mut().set("Cache-Control", "no-store")?;
    Ok(response)
}

async fn read_json<T>(req: &mut Request) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let body = req.text().await?;
    Ok(serde_json::from_str(&body)?)
}

async fn read_form(req: &mut Request) -> Result<DocumentForm, ApiError> {
    let mut body = read_json::<serde_json::Value>(req).await?;
    schema::default_issue_date(&mut body, now_utc().date_naive());
    Ok(serde_json::from_value(body)?)
}

/// Reads a request body whose form sits under `form`.
async fn read_with_form<T>(req: &mut Request) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let mut body = read_json::<serde_json::Value>(req).await?;
    if let Some(form) = body.get_mut("form") {
        schema::default_issue_date(form, now_utc().date_naive());
    }
    Ok(serde_json::from_value(body)?)
}

fn parse_query(req: &Request) -> Result<HashMap<String, String>, ApiError> {
    let url = req.url()?;
    let query = url
        .query_pairs()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect::<HashMap<_, _>>();
    Ok(query)
}

fn parse_id(ctx: &RouteContext<AppState>) -> Result<i64, ApiError> {
    let raw = ctx
        .param("id")
        .ok_or_else(|| ApiError::BadRequest("missing id".to_string()))?;
    Ok(raw.parse::<i64>()?)
}

pub fn parse_document_type(query: &HashMap<String, String>) -> Result<DocumentType, ApiError> {
    let Some(raw) = query.get("type") else {
        return Ok(DocumentType::default());
    };
    DocumentType::parse(raw)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown document type: {raw}")))
}

pub fn parse_collection(query: &HashMap<String, String>) -> Result<Collection, ApiError> {
    let Some(raw) = query.get("collection") else {
        return Ok(Collection::Invoice);
    };
    Collection::parse(raw)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown collection: {raw}")))
}

fn now_utc() -> DateTime<Utc> {
    let millis = i64::try_from(worker::Date::now().as_millis()).unwrap_or_default();
    DateTime::from_timestamp_millis(millis).unwrap_or(DateTime::UNIX_EPOCH)
}
