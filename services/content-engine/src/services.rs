use crate::comments;
use crate::errors::{ContentEngineError, Result};
use crate::models::{
    Article, ArticleDetail, ArticleListItem, ArticleStatut, Categorie, Commentaire,
    CreateArticleRequest, CreateCategorieRequest, CreateCommentaireRequest, CreateTagRequest,
    Skill, Tag, UpdateArticleRequest, UpdateCategorieRequest, UpdateCommentaireRequest,
};
use crate::repository::{
    ArticleFilter, ArticleRepo, CategorieRepo, CommentaireFilter, CommentaireRepo, SkillRepo,
    TagRepo,
};
use crate::security::{AuthenticatedUser, Requester};
use crate::slug;
use crate::visibility::{scope_for, Scope};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

fn require_user<'a>(requester: &'a Requester) -> Result<&'a AuthenticatedUser> {
    requester.user().ok_or(ContentEngineError::Unauthorized)
}

/// Uniform gate for restricted writes: rejected before any lookup, so the
/// response never depends on whether the resource exists.
fn require_elevated<'a>(requester: &'a Requester) -> Result<&'a AuthenticatedUser> {
    let user = require_user(requester)?;
    if !user.elevated {
        return Err(ContentEngineError::Forbidden);
    }
    Ok(user)
}

pub struct ContentService {
    categories: Arc<dyn CategorieRepo>,
    articles: Arc<dyn ArticleRepo>,
    tags: Arc<dyn TagRepo>,
    commentaires: Arc<dyn CommentaireRepo>,
    skills: Arc<dyn SkillRepo>,
    slug_retry_attempts: u32,
}

impl ContentService {
    pub fn new(
        categories: Arc<dyn CategorieRepo>,
        articles: Arc<dyn ArticleRepo>,
        tags: Arc<dyn TagRepo>,
        commentaires: Arc<dyn CommentaireRepo>,
        skills: Arc<dyn SkillRepo>,
        slug_retry_attempts: u32,
    ) -> Self {
        ContentService {
            categories,
            articles,
            tags,
            commentaires,
            skills,
            slug_retry_attempts: slug_retry_attempts.max(1),
        }
    }

    // -----------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------

    pub async fn create_categorie(
        &self,
        requester: &Requester,
        request: CreateCategorieRequest,
    ) -> Result<Categorie> {
        require_elevated(requester)?;
        request.validate()?;

        let base = slug::base_slug(&request.nom, slug::CATEGORIE_SLUG_BASE);
        for _ in 0..self.slug_retry_attempts {
            let existing: HashSet<String> =
                self.categories.slugs_like(&base).await?.into_iter().collect();
            let candidate = slug::resolve_collision(&base, &existing);

            match self
                .categories
                .create(Categorie {
                    id: Uuid::new_v4(),
                    nom: request.nom.clone(),
                    slug: candidate,
                })
                .await
            {
                Err(ContentEngineError::Conflict(reason)) => {
                    warn!("Categorie insert conflicted ({}), retrying", reason);
                    continue;
                }
                other => return other,
            }
        }

        Err(ContentEngineError::Conflict(
            "categorie already exists".to_string(),
        ))
    }

    pub async fn list_categories(&self) -> Result<Vec<Categorie>> {
        self.categories.list().await
    }

    pub async fn get_categorie(&self, id: Uuid) -> Result<Categorie> {
        self.categories
            .get(id)
            .await?
            .ok_or(ContentEngineError::CategorieNotFound(id))
    }

    /// The slug never changes, even when the name does.
    pub async fn update_categorie(
        &self,
        requester: &Requester,
        id: Uuid,
        request: UpdateCategorieRequest,
    ) -> Result<Categorie> {
        require_elevated(requester)?;
        request.validate()?;

        let mut categorie = self.get_categorie(id).await?;
        categorie.nom = request.nom;
        self.categories.update(categorie).await
    }

    pub async fn delete_categorie(&self, requester: &Requester, id: Uuid) -> Result<()> {
        require_elevated(requester)?;
        if !self.categories.delete(id).await? {
            return Err(ContentEngineError::CategorieNotFound(id));
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Articles
    // -----------------------------------------------------------------

    pub async fn create_article(
        &self,
        requester: &Requester,
        request: CreateArticleRequest,
    ) -> Result<Article> {
        let user = require_user(requester)?;
        request.validate()?;

        if let Some(categorie_id) = request.categorie {
            self.get_categorie(categorie_id).await?;
        }
        let tag_ids = self.resolve_tag_ids(request.tags.as_deref()).await?;

        let now = Utc::now();
        let base = slug::base_slug(&request.titre, slug::ARTICLE_SLUG_BASE);
        for _ in 0..self.slug_retry_attempts {
            let existing: HashSet<String> =
                self.articles.slugs_like(&base).await?.into_iter().collect();
            let candidate = slug::resolve_collision(&base, &existing);

            let article = Article {
                id: Uuid::new_v4(),
                titre: request.titre.clone(),
                slug: candidate,
                contenu: request.contenu.clone(),
                image: request.image.clone(),
                categorie_id: request.categorie,
                auteur_id: Some(user.id),
                auteur_nom: Some(user.name.clone()),
                statut: request.statut.unwrap_or(ArticleStatut::Draft),
                meta_description: request.meta_description.clone().unwrap_or_default(),
                mots_cles: request.mots_cles.clone().unwrap_or_default(),
                date_creation: now,
                date_modification: now,
            };

            match self.articles.create(article).await {
                Err(ContentEngineError::Conflict(reason)) => {
                    warn!("Article insert conflicted ({}), retrying", reason);
                    continue;
                }
                Err(e) => return Err(e),
                Ok(article) => {
                    if !tag_ids.is_empty() {
                        self.articles.set_tags(article.id, &tag_ids).await?;
                    }
                    info!("Article {} created as {}", article.id, article.slug);
                    return Ok(article);
                }
            }
        }

        Err(ContentEngineError::Conflict(
            "article already exists".to_string(),
        ))
    }

    pub async fn list_articles(
        &self,
        requester: &Requester,
        filter: ArticleFilter,
    ) -> Result<Vec<ArticleListItem>> {
        let articles = self.articles.list(scope_for(requester), filter).await?;

        let categorie_ids: Vec<Uuid> = articles
            .iter()
            .filter_map(|a| a.categorie_id)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        let categories: HashMap<Uuid, Categorie> = self
            .categories
            .get_many(&categorie_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let article_ids: Vec<Uuid> = articles.iter().map(|a| a.id).collect();
        let mut tag_map: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for (article_id, tag) in self.articles.tags_of_many(&article_ids).await? {
            tag_map.entry(article_id).or_default().push(tag);
        }

        Ok(articles
            .into_iter()
            .map(|article| ArticleListItem {
                extrait: article.extrait(),
                categorie: article.categorie_id.and_then(|id| categories.get(&id).cloned()),
                tags: tag_map.remove(&article.id).unwrap_or_default(),
                id: article.id,
                titre: article.titre,
                slug: article.slug,
                image: article.image,
                auteur: article.auteur_nom,
                date_creation: article.date_creation,
                statut: article.statut,
                meta_description: article.meta_description,
                mots_cles: article.mots_cles,
            })
            .collect())
    }

    pub async fn get_article(&self, requester: &Requester, id: Uuid) -> Result<ArticleDetail> {
        let article = self
            .articles
            .get(id, scope_for(requester))
            .await?
            .ok_or(ContentEngineError::ArticleNotFound(id))?;
        self.assemble_detail(requester, article).await
    }

    pub async fn get_article_by_slug(
        &self,
        requester: &Requester,
        slug: &str,
    ) -> Result<ArticleDetail> {
        let article = self
            .articles
            .get_by_slug(slug, scope_for(requester))
            .await?
            .ok_or_else(|| ContentEngineError::ArticleSlugNotFound(slug.to_string()))?;
        self.assemble_detail(requester, article).await
    }

    async fn assemble_detail(
        &self,
        requester: &Requester,
        article: Article,
    ) -> Result<ArticleDetail> {
        let categorie = match article.categorie_id {
            Some(id) => self.categories.get(id).await?,
            None => None,
        };
        let tags = self.articles.tags_of(article.id).await?;
        let thread = self
            .commentaires
            .list_thread(article.id, scope_for(requester))
            .await?;

        Ok(ArticleDetail {
            commentaires: comments::build_thread(&thread),
            categorie,
            tags,
            id: article.id,
            titre: article.titre,
            slug: article.slug,
            contenu: article.contenu,
            image: article.image,
            auteur: article.auteur_nom,
            date_creation: article.date_creation,
            date_modification: article.date_modification,
            statut: article.statut,
            meta_description: article.meta_description,
            mots_cles: article.mots_cles,
        })
    }

    pub async fn update_article(
        &self,
        requester: &Requester,
        id: Uuid,
        request: UpdateArticleRequest,
    ) -> Result<Article> {
        let user = require_user(requester)?;
        request.validate()?;

        let article = self
            .articles
            .get(id, scope_for(requester))
            .await?
            .ok_or(ContentEngineError::ArticleNotFound(id))?;
        if !user.elevated && article.auteur_id != Some(user.id) {
            return Err(ContentEngineError::Forbidden);
        }

        if let Some(categorie_id) = request.categorie {
            self.get_categorie(categorie_id).await?;
        }

        let mut updated = article;
        if let Some(titre) = request.titre {
            updated.titre = titre;
        }
        if let Some(contenu) = request.contenu {
            updated.contenu = contenu;
        }
        if request.image.is_some() {
            updated.image = request.image;
        }
        if request.categorie.is_some() {
            updated.categorie_id = request.categorie;
        }
        if let Some(statut) = request.statut {
            updated.statut = statut;
        }
        if let Some(meta_description) = request.meta_description {
            updated.meta_description = meta_description;
        }
        if let Some(mots_cles) = request.mots_cles {
            updated.mots_cles = mots_cles;
        }
        updated.date_modification = Utc::now();

        let updated = self.articles.update(updated).await?;

        if let Some(tags) = request.tags {
            let tag_ids = self.resolve_tag_ids(Some(&tags)).await?;
            self.articles.set_tags(updated.id, &tag_ids).await?;
        }

        Ok(updated)
    }

    pub async fn delete_article(&self, requester: &Requester, id: Uuid) -> Result<()> {
        let user = require_user(requester)?;

        let article = self
            .articles
            .get(id, scope_for(requester))
            .await?
            .ok_or(ContentEngineError::ArticleNotFound(id))?;
        if !user.elevated && article.auteur_id != Some(user.id) {
            return Err(ContentEngineError::Forbidden);
        }

        // Comments go down with the article
        self.articles.delete(id).await?;
        Ok(())
    }

    async fn resolve_tag_ids(&self, ids: Option<&[Uuid]>) -> Result<Vec<Uuid>> {
        let unique: Vec<Uuid> = ids
            .unwrap_or_default()
            .iter()
            .copied()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        if unique.is_empty() {
            return Ok(unique);
        }

        let found: HashSet<Uuid> = self
            .tags
            .get_many(&unique)
            .await?
            .into_iter()
            .map(|t| t.id)
            .collect();
        if let Some(missing) = unique.iter().find(|id| !found.contains(id)) {
            return Err(ContentEngineError::TagNotFound(*missing));
        }
        Ok(unique)
    }

    // -----------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------

    /// Open to anonymous requesters. The moderation flag and the
    /// authenticated-author backreference are server-assigned; the caller
    /// can never set them.
    pub async fn create_commentaire(
        &self,
        requester: &Requester,
        request: CreateCommentaireRequest,
    ) -> Result<Commentaire> {
        request.validate()?;

        let article = self
            .articles
            .get(request.article, scope_for(requester))
            .await?
            .ok_or(ContentEngineError::ArticleNotFound(request.article))?;

        let (auteur, auteur_user_id) = match requester.user() {
            Some(user) => (user.name.clone(), Some(user.id)),
            None => {
                let auteur = request
                    .auteur
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or(ContentEngineError::AuthorRequired)?;
                (auteur.to_string(), None)
            }
        };

        if let Some(parent_id) = request.parent {
            let parent = self
                .commentaires
                .get(parent_id)
                .await?
                .ok_or(ContentEngineError::CommentaireNotFound(parent_id))?;
            if parent.article_id != article.id {
                return Err(ContentEngineError::InvalidParent(
                    "parent belongs to a different article".to_string(),
                ));
            }
        }

        self.commentaires
            .create(Commentaire {
                id: Uuid::new_v4(),
                article_id: article.id,
                auteur,
                auteur_user_id,
                contenu: request.contenu,
                date_creation: Utc::now(),
                valide: false,
                parent_id: request.parent,
            })
            .await
    }

    pub async fn list_commentaires(
        &self,
        requester: &Requester,
        filter: CommentaireFilter,
    ) -> Result<Vec<Commentaire>> {
        self.commentaires.list(scope_for(requester), filter).await
    }

    pub async fn update_commentaire(
        &self,
        requester: &Requester,
        id: Uuid,
        request: UpdateCommentaireRequest,
    ) -> Result<Commentaire> {
        let user = require_user(requester)?;
        request.validate()?;

        let commentaire = self
            .commentaires
            .get(id)
            .await?
            .ok_or(ContentEngineError::CommentaireNotFound(id))?;
        if !user.elevated && commentaire.auteur_user_id != Some(user.id) {
            return Err(ContentEngineError::Forbidden);
        }

        let mut updated = commentaire.clone();
        if let Some(contenu) = request.contenu {
            updated.contenu = contenu;
        }
        if let Some(parent_id) = request.parent {
            self.check_parent(&commentaire, parent_id).await?;
            updated.parent_id = Some(parent_id);
        }

        self.commentaires.update(updated).await
    }

    /// Re-parenting must keep the thread a tree: no self-parenting, no
    /// parenting under one's own descendant, no crossing articles.
    async fn check_parent(&self, commentaire: &Commentaire, parent_id: Uuid) -> Result<()> {
        if parent_id == commentaire.id {
            return Err(ContentEngineError::InvalidParent(
                "a comment cannot be its own parent".to_string(),
            ));
        }

        let parent = self
            .commentaires
            .get(parent_id)
            .await?
            .ok_or(ContentEngineError::CommentaireNotFound(parent_id))?;
        if parent.article_id != commentaire.article_id {
            return Err(ContentEngineError::InvalidParent(
                "parent belongs to a different article".to_string(),
            ));
        }

        let thread = self
            .commentaires
            .list_thread(commentaire.article_id, Scope::All)
            .await?;
        let parents: HashMap<Uuid, Option<Uuid>> =
            thread.iter().map(|c| (c.id, c.parent_id)).collect();
        if comments::creates_cycle(&parents, commentaire.id, parent_id) {
            return Err(ContentEngineError::InvalidParent(
                "re-parenting would create a cycle".to_string(),
            ));
        }

        Ok(())
    }

    pub async fn delete_commentaire(&self, requester: &Requester, id: Uuid) -> Result<()> {
        require_elevated(requester)?;
        if !self.commentaires.delete(id).await? {
            return Err(ContentEngineError::CommentaireNotFound(id));
        }
        Ok(())
    }

    /// Moderation approval; the only way a comment becomes publicly
    /// visible.
    pub async fn valider_commentaire(&self, requester: &Requester, id: Uuid) -> Result<()> {
        require_elevated(requester)?;
        if !self.commentaires.validate(id).await? {
            return Err(ContentEngineError::CommentaireNotFound(id));
        }
        info!("Commentaire {} validated", id);
        Ok(())
    }

    // -----------------------------------------------------------------
    // Tags
    // -----------------------------------------------------------------

    pub async fn create_tag(
        &self,
        requester: &Requester,
        request: CreateTagRequest,
    ) -> Result<Tag> {
        require_elevated(requester)?;
        request.validate()?;

        let nom = request.nom.trim().to_lowercase();
        let base = slug::base_slug(&nom, slug::TAG_SLUG_BASE);
        for _ in 0..self.slug_retry_attempts {
            let existing: HashSet<String> =
                self.tags.slugs_like(&base).await?.into_iter().collect();
            let candidate = slug::resolve_collision(&base, &existing);

            match self
                .tags
                .create(Tag {
                    id: Uuid::new_v4(),
                    nom: nom.clone(),
                    slug: candidate,
                })
                .await
            {
                Err(ContentEngineError::Conflict(reason)) => {
                    warn!("Tag insert conflicted ({}), retrying", reason);
                    continue;
                }
                other => return other,
            }
        }

        Err(ContentEngineError::Conflict("tag already exists".to_string()))
    }

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.tags.list().await
    }

    pub async fn get_tag(&self, id: Uuid) -> Result<Tag> {
        self.tags
            .get(id)
            .await?
            .ok_or(ContentEngineError::TagNotFound(id))
    }

    pub async fn delete_tag(&self, requester: &Requester, id: Uuid) -> Result<()> {
        require_elevated(requester)?;
        if !self.tags.delete(id).await? {
            return Err(ContentEngineError::TagNotFound(id));
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Skills
    // -----------------------------------------------------------------

    pub async fn list_skills(&self) -> Result<Vec<Skill>> {
        self.skills.list().await
    }
}
