//! # tb-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core services.

use std::sync::Arc;

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tb_core::clock::Clock;
use tb_core::error::AppError;
use tb_core::models::{Applied, CreatePost, PostId};
use tb_core::services::{IdentityStore, InteractionEngine, PostRegistry, RankingService};
use tb_core::traits::{ForumRepo, TokenIssuer};

use crate::error::ApiResult;
use crate::extract::Principal;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub identity: IdentityStore,
    pub registry: Arc<PostRegistry>,
    pub interactions: InteractionEngine,
    pub ranking: RankingService,
}

impl AppState {
    /// Wires every service over one shared repository.
    pub fn new(repo: Arc<dyn ForumRepo>, tokens: Arc<dyn TokenIssuer>, clock: Arc<dyn Clock>) -> Self {
        let registry = Arc::new(PostRegistry::new(repo.clone(), clock));
        Self {
            identity: IdentityStore::new(repo, tokens),
            interactions: InteractionEngine::new(registry.clone()),
            ranking: RankingService::new(registry.clone()),
            registry,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub interaction_type: String,
    #[serde(default)]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

pub async fn register(data: web::Data<AppState>, body: web::Json<Credentials>) -> ApiResult<HttpResponse> {
    let Credentials { username, password } = body.into_inner();
    data.identity.register(&username, &password).await?;
    Ok(HttpResponse::Created().json(json!({
        "message": format!("User {} created successfully", username.trim())
    })))
}

pub async fn login(data: web::Data<AppState>, body: web::Json<Credentials>) -> ApiResult<HttpResponse> {
    let token = data.identity.authenticate(&body.username, &body.password).await?;
    Ok(HttpResponse::Ok().json(token))
}

pub async fn create_post(
    data: web::Data<AppState>,
    principal: Principal,
    body: web::Json<CreatePost>,
) -> ApiResult<HttpResponse> {
    let id = data.registry.create_post(principal.0.name(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "message": "Post created successfully", "id": id })))
}

/// Live posts of a topic. Summaries only; the body is left out.
pub async fn browse_topic(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let messages = data.registry.list_by_topic(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "messages": messages })))
}

/// A single Live post of a topic, body included.
pub async fn view_post(data: web::Data<AppState>, path: web::Path<(String, PostId)>) -> ApiResult<HttpResponse> {
    let (topic, id) = path.into_inner();
    let post = data
        .registry
        .get_post(&topic, id)
        .await?
        .ok_or(AppError::PostNotFound(id))?;
    Ok(HttpResponse::Ok().json(post))
}

pub async fn expired_history(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let messages = data.ranking.expired_history(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "messages": messages })))
}

pub async fn most_active(data: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let ranking = data.ranking.most_active_per_topic().await?;
    Ok(HttpResponse::Ok().json(ranking))
}

pub async fn interact(
    data: web::Data<AppState>,
    principal: Principal,
    path: web::Path<PostId>,
    body: web::Json<InteractionRequest>,
) -> ApiResult<HttpResponse> {
    let post_id = path.into_inner();
    let applied = data
        .interactions
        .apply_interaction(&principal.0, post_id, &body.interaction_type, body.comment.as_deref())
        .await?;

    let message = format!("{} added successfully", capitalize(applied.kind().as_str()));
    let response = match applied {
        Applied::Reacted { likes, dislikes, .. } => {
            json!({ "message": message, "likes": likes, "dislikes": dislikes })
        }
        Applied::Commented(comment) => json!({ "message": message, "comment": comment }),
    };
    Ok(HttpResponse::Ok().json(response))
}

pub async fn list_comments(data: web::Data<AppState>, path: web::Path<PostId>) -> ApiResult<HttpResponse> {
    let comments = data.interactions.list_comments(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "comments": comments })))
}

pub async fn add_comment(
    data: web::Data<AppState>,
    principal: Principal,
    path: web::Path<PostId>,
    body: web::Json<CommentRequest>,
) -> ApiResult<HttpResponse> {
    let id = data
        .interactions
        .add_comment(&principal.0, path.into_inner(), &body.text)
        .await?;
    Ok(HttpResponse::Created().json(json!({ "message": "Comment added successfully", "id": id })))
}

pub async fn list_interactions(data: web::Data<AppState>, path: web::Path<PostId>) -> ApiResult<HttpResponse> {
    let interactions = data.interactions.list_interactions(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "interactions": interactions })))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
