use crate::errors::ContentEngineError;
use crate::models::{
    ArticleListQuery, CommentaireListQuery, CreateArticleRequest, CreateCategorieRequest,
    CreateCommentaireRequest, CreateTagRequest, UpdateArticleRequest, UpdateCategorieRequest,
    UpdateCommentaireRequest,
};
use crate::repository::{ArticleFilter, CommentaireFilter};
use crate::security::Requester;
use crate::services::ContentService;
use actix_web::{web, HttpResponse};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Health check endpoint
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "content-engine",
        "version": "1.0.0"
    }))
}

// ---------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------

pub async fn create_categorie(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    request: web::Json<CreateCategorieRequest>,
) -> Result<HttpResponse, ContentEngineError> {
    let categorie = service
        .create_categorie(&requester, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(categorie))
}

pub async fn list_categories(
    service: web::Data<Arc<ContentService>>,
) -> Result<HttpResponse, ContentEngineError> {
    let categories = service.list_categories().await?;
    Ok(HttpResponse::Ok().json(categories))
}

pub async fn get_categorie(
    service: web::Data<Arc<ContentService>>,
    categorie_id: web::Path<Uuid>,
) -> Result<HttpResponse, ContentEngineError> {
    let categorie = service.get_categorie(*categorie_id).await?;
    Ok(HttpResponse::Ok().json(categorie))
}

pub async fn update_categorie(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    categorie_id: web::Path<Uuid>,
    request: web::Json<UpdateCategorieRequest>,
) -> Result<HttpResponse, ContentEngineError> {
    let categorie = service
        .update_categorie(&requester, *categorie_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(categorie))
}

pub async fn delete_categorie(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    categorie_id: web::Path<Uuid>,
) -> Result<HttpResponse, ContentEngineError> {
    service.delete_categorie(&requester, *categorie_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---------------------------------------------------------------------
// Articles
// ---------------------------------------------------------------------

pub async fn create_article(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    request: web::Json<CreateArticleRequest>,
) -> Result<HttpResponse, ContentEngineError> {
    let article = service
        .create_article(&requester, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(article))
}

pub async fn list_articles(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    query: web::Query<ArticleListQuery>,
) -> Result<HttpResponse, ContentEngineError> {
    let query = query.into_inner();
    let articles = service
        .list_articles(
            &requester,
            ArticleFilter {
                categorie_slug: query.categorie,
                statut: query.statut,
                search: query.search,
            },
        )
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "total": articles.len(),
        "articles": articles
    })))
}

pub async fn get_article(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    article_id: web::Path<Uuid>,
) -> Result<HttpResponse, ContentEngineError> {
    let article = service.get_article(&requester, *article_id).await?;
    Ok(HttpResponse::Ok().json(article))
}

pub async fn get_article_by_slug(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    slug: web::Path<String>,
) -> Result<HttpResponse, ContentEngineError> {
    let article = service.get_article_by_slug(&requester, &slug).await?;
    Ok(HttpResponse::Ok().json(article))
}

pub async fn update_article(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    article_id: web::Path<Uuid>,
    request: web::Json<UpdateArticleRequest>,
) -> Result<HttpResponse, ContentEngineError> {
    let article = service
        .update_article(&requester, *article_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(article))
}

pub async fn delete_article(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    article_id: web::Path<Uuid>,
) -> Result<HttpResponse, ContentEngineError> {
    service.delete_article(&requester, *article_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------

pub async fn create_commentaire(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    request: web::Json<CreateCommentaireRequest>,
) -> Result<HttpResponse, ContentEngineError> {
    let commentaire = service
        .create_commentaire(&requester, request.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(commentaire))
}

pub async fn list_commentaires(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    query: web::Query<CommentaireListQuery>,
) -> Result<HttpResponse, ContentEngineError> {
    let query = query.into_inner();
    let commentaires = service
        .list_commentaires(
            &requester,
            CommentaireFilter {
                article_id: query.article,
                valide: query.valide,
            },
        )
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "total": commentaires.len(),
        "commentaires": commentaires
    })))
}

pub async fn update_commentaire(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    commentaire_id: web::Path<Uuid>,
    request: web::Json<UpdateCommentaireRequest>,
) -> Result<HttpResponse, ContentEngineError> {
    let commentaire = service
        .update_commentaire(&requester, *commentaire_id, request.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(commentaire))
}

pub async fn delete_commentaire(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    commentaire_id: web::Path<Uuid>,
) -> Result<HttpResponse, ContentEngineError> {
    service
        .delete_commentaire(&requester, *commentaire_id)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Moderation approval
pub async fn valider_commentaire(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    commentaire_id: web::Path<Uuid>,
) -> Result<HttpResponse, ContentEngineError> {
    service
        .valider_commentaire(&requester, *commentaire_id)
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "id": *commentaire_id,
        "valide": true
    })))
}

// ---------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------

pub async fn create_tag(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    request: web::Json<CreateTagRequest>,
) -> Result<HttpResponse, ContentEngineError> {
    let tag = service.create_tag(&requester, request.into_inner()).await?;
    Ok(HttpResponse::Created().json(tag))
}

pub async fn list_tags(
    service: web::Data<Arc<ContentService>>,
) -> Result<HttpResponse, ContentEngineError> {
    let tags = service.list_tags().await?;
    Ok(HttpResponse::Ok().json(tags))
}

pub async fn get_tag(
    service: web::Data<Arc<ContentService>>,
    tag_id: web::Path<Uuid>,
) -> Result<HttpResponse, ContentEngineError> {
    let tag = service.get_tag(*tag_id).await?;
    Ok(HttpResponse::Ok().json(tag))
}

pub async fn delete_tag(
    service: web::Data<Arc<ContentService>>,
    requester: Requester,
    tag_id: web::Path<Uuid>,
) -> Result<HttpResponse, ContentEngineError> {
    service.delete_tag(&requester, *tag_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

// ---------------------------------------------------------------------
// Skills
// ---------------------------------------------------------------------

pub async fn list_skills(
    service: web::Data<Arc<ContentService>>,
) -> Result<HttpResponse, ContentEngineError> {
    let skills = service.list_skills().await?;
    Ok(HttpResponse::Ok().json(skills))
}

/// Configure routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/categories")
            .route("", web::post().to(create_categorie))
            .route("", web::get().to(list_categories))
            .route("/{id}", web::get().to(get_categorie))
            .route("/{id}", web::put().to(update_categorie))
            .route("/{id}", web::delete().to(delete_categorie)),
    )
    .service(
        web::scope("/api/v1/articles")
            .route("", web::post().to(create_article))
            .route("", web::get().to(list_articles))
            .route("/slug/{slug}", web::get().to(get_article_by_slug))
            .route("/{id}", web::get().to(get_article))
            .route("/{id}", web::put().to(update_article))
            .route("/{id}", web::delete().to(delete_article)),
    )
    .service(
        web::scope("/api/v1/commentaires")
            .route("", web::post().to(create_commentaire))
            .route("", web::get().to(list_commentaires))
            .route("/{id}", web::put().to(update_commentaire))
            .route("/{id}", web::delete().to(delete_commentaire))
            .route("/{id}/valider", web::post().to(valider_commentaire)),
    )
    .service(
        web::scope("/api/v1/tags")
            .route("", web::post().to(create_tag))
            .route("", web::get().to(list_tags))
            .route("/{id}", web::get().to(get_tag))
            .route("/{id}", web::delete().to(delete_tag)),
    )
    .service(web::scope("/api/v1/skills").route("", web::get().to(list_skills)))
    .route("/health", web::get().to(health_check));
}
