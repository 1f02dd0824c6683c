pub mod actions;
pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod models;
pub mod numbering;
pub mod pagination;
pub mod routes;
pub mod schema;
pub mod store;
pub mod totals;
pub mod wizard;

use worker::{Context, Env, Request, Response, Result, event};

#[event(fetch)]
async fn fetch(req: Request, env: Env, ctx: Context) -> Result<Response> {
    routes::handle(req, env, ctx).await
}
