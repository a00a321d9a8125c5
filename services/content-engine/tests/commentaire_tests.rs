//! Comment moderation, server-assigned fields, and threading, exercised
//! through the service layer against the in-memory repositories.

use content_engine::errors::ContentEngineError;
use content_engine::memory::{
    InMemoryArticleRepo, InMemoryCategorieRepo, InMemoryCommentaireRepo, InMemorySkillRepo,
    InMemoryTagRepo,
};
use content_engine::models::{
    ArticleStatut, CreateArticleRequest, CreateCommentaireRequest, UpdateCommentaireRequest,
};
use content_engine::repository::CommentaireFilter;
use content_engine::security::{AuthenticatedUser, Requester};
use content_engine::services::ContentService;
use std::sync::Arc;
use uuid::Uuid;

fn service() -> ContentService {
    let categories = Arc::new(InMemoryCategorieRepo::new());
    let tags = Arc::new(InMemoryTagRepo::new());
    let articles = Arc::new(InMemoryArticleRepo::with_shared(&tags, &categories));
    ContentService::new(
        categories,
        articles,
        tags,
        Arc::new(InMemoryCommentaireRepo::new()),
        Arc::new(InMemorySkillRepo::new()),
        3,
    )
}

fn staff() -> Requester {
    Requester::User(AuthenticatedUser {
        id: Uuid::new_v4(),
        name: "admin".to_string(),
        elevated: true,
    })
}

fn member(name: &str) -> Requester {
    Requester::User(AuthenticatedUser {
        id: Uuid::new_v4(),
        name: name.to_string(),
        elevated: false,
    })
}

async fn published_article(service: &ContentService) -> Uuid {
    service
        .create_article(
            &member("Fatou"),
            CreateArticleRequest {
                titre: "Un article commente".to_string(),
                contenu: "Du contenu pour accueillir des commentaires.".to_string(),
                image: None,
                categorie: None,
                statut: Some(ArticleStatut::Published),
                meta_description: None,
                mots_cles: None,
                tags: None,
            },
        )
        .await
        .unwrap()
        .id
}

fn commentaire(article: Uuid, contenu: &str) -> CreateCommentaireRequest {
    CreateCommentaireRequest {
        article,
        auteur: Some("Visiteur".to_string()),
        contenu: contenu.to_string(),
        parent: None,
    }
}

#[tokio::test]
async fn test_new_comments_await_moderation() {
    let service = service();
    let article = published_article(&service).await;

    let created = service
        .create_commentaire(
            &Requester::Anonymous,
            commentaire(article, "Tres bon article, merci !"),
        )
        .await
        .unwrap();
    assert!(!created.valide);

    // Hidden from public reads until validated
    let public = service
        .list_commentaires(&Requester::Anonymous, CommentaireFilter::default())
        .await
        .unwrap();
    assert!(public.is_empty());

    // Staff see it pending
    let all = service
        .list_commentaires(&staff(), CommentaireFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 1);

    // After approval it becomes public
    service
        .valider_commentaire(&staff(), created.id)
        .await
        .unwrap();
    let public = service
        .list_commentaires(&Requester::Anonymous, CommentaireFilter::default())
        .await
        .unwrap();
    assert_eq!(public.len(), 1);
    assert!(public[0].valide);
}

#[tokio::test]
async fn test_moderation_is_staff_only() {
    let service = service();
    let article = published_article(&service).await;

    let created = service
        .create_commentaire(
            &Requester::Anonymous,
            commentaire(article, "Un commentaire en attente"),
        )
        .await
        .unwrap();

    let err = service
        .valider_commentaire(&member("Ousmane"), created.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ContentEngineError::Forbidden));
}

#[tokio::test]
async fn test_author_identity_is_server_assigned() {
    let service = service();
    let article = published_article(&service).await;
    let aicha = member("Aicha");

    // The caller-supplied label is ignored for authenticated requesters
    let mut request = commentaire(article, "Je me permets d'intervenir ici.");
    request.auteur = Some("Quelqu'un d'autre".to_string());
    let created = service.create_commentaire(&aicha, request).await.unwrap();

    assert_eq!(created.auteur, "Aicha");
    assert_eq!(created.auteur_user_id, aicha.user().map(|u| u.id));

    // Anonymous requesters must provide a label
    let mut request = commentaire(article, "Un avis anonyme sur le sujet.");
    request.auteur = None;
    let err = service
        .create_commentaire(&Requester::Anonymous, request)
        .await
        .unwrap_err();
    assert!(matches!(err, ContentEngineError::AuthorRequired));
}

#[tokio::test]
async fn test_comment_body_minimum_is_enforced() {
    let service = service();
    let article = published_article(&service).await;

    let err = service
        .create_commentaire(&Requester::Anonymous, commentaire(article, "court"))
        .await
        .unwrap_err();
    assert!(matches!(err, ContentEngineError::Validation(_)));
}

#[tokio::test]
async fn test_commenting_an_invisible_draft_is_not_found() {
    let service = service();
    let draft = service
        .create_article(
            &member("Fatou"),
            CreateArticleRequest {
                titre: "Brouillon".to_string(),
                contenu: "Pas encore publie.".to_string(),
                image: None,
                categorie: None,
                statut: Some(ArticleStatut::Draft),
                meta_description: None,
                mots_cles: None,
                tags: None,
            },
        )
        .await
        .unwrap();

    let err = service
        .create_commentaire(
            &Requester::Anonymous,
            commentaire(draft.id, "Un commentaire sur un brouillon"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ContentEngineError::ArticleNotFound(_)));
}

#[tokio::test]
async fn test_article_detail_threads_validated_comments() {
    let service = service();
    let article = published_article(&service).await;
    let admin = staff();

    let parent = service
        .create_commentaire(&Requester::Anonymous, commentaire(article, "Le commentaire racine"))
        .await
        .unwrap();
    let mut reply = commentaire(article, "Une reponse au commentaire racine");
    reply.parent = Some(parent.id);
    let reply = service
        .create_commentaire(&Requester::Anonymous, reply)
        .await
        .unwrap();

    service.valider_commentaire(&admin, parent.id).await.unwrap();

    // Only the validated root is public; the pending reply stays hidden
    let detail = service
        .get_article(&Requester::Anonymous, article)
        .await
        .unwrap();
    assert_eq!(detail.commentaires.len(), 1);
    assert!(detail.commentaires[0].reponses.is_empty());

    // Staff get the full thread, nested
    let detail = service.get_article(&admin, article).await.unwrap();
    assert_eq!(detail.commentaires.len(), 1);
    assert_eq!(detail.commentaires[0].reponses.len(), 1);
    assert_eq!(detail.commentaires[0].reponses[0].id, reply.id);
}

#[tokio::test]
async fn test_reparenting_cannot_create_a_cycle() {
    let service = service();
    let article = published_article(&service).await;
    let admin = staff();

    // racine <- milieu <- feuille
    let racine = service
        .create_commentaire(&admin, commentaire(article, "Le commentaire racine"))
        .await
        .unwrap();
    let mut milieu = commentaire(article, "Le commentaire du milieu");
    milieu.parent = Some(racine.id);
    let milieu = service.create_commentaire(&admin, milieu).await.unwrap();
    let mut feuille = commentaire(article, "Le commentaire feuille");
    feuille.parent = Some(milieu.id);
    let feuille = service.create_commentaire(&admin, feuille).await.unwrap();

    // racine under feuille would close the loop
    let err = service
        .update_commentaire(
            &admin,
            racine.id,
            UpdateCommentaireRequest {
                contenu: None,
                parent: Some(feuille.id),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ContentEngineError::InvalidParent(_)));

    // Self-parenting is rejected outright
    let err = service
        .update_commentaire(
            &admin,
            racine.id,
            UpdateCommentaireRequest {
                contenu: None,
                parent: Some(racine.id),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ContentEngineError::InvalidParent(_)));

    // A legal re-parent still works
    service
        .update_commentaire(
            &admin,
            feuille.id,
            UpdateCommentaireRequest {
                contenu: None,
                parent: Some(racine.id),
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn test_cross_article_parent_is_rejected() {
    let service = service();
    let article_a = published_article(&service).await;
    let article_b = published_article(&service).await;

    let on_a = service
        .create_commentaire(&Requester::Anonymous, commentaire(article_a, "Commentaire sur A"))
        .await
        .unwrap();

    let mut on_b = commentaire(article_b, "Reponse depuis l'article B");
    on_b.parent = Some(on_a.id);
    let err = service
        .create_commentaire(&Requester::Anonymous, on_b)
        .await
        .unwrap_err();
    assert!(matches!(err, ContentEngineError::InvalidParent(_)));
}
