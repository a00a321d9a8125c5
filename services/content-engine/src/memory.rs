//! In-memory repository implementations, used by the test suites in place
//! of PostgreSQL. Uniqueness and scope semantics mirror `database.rs`.

use crate::errors::{ContentEngineError, Result};
use crate::models::{Article, Categorie, Commentaire, Skill, Tag};
use crate::repository::{
    ArticleFilter, ArticleRepo, CategorieRepo, CommentaireFilter, CommentaireRepo, SkillRepo,
    TagRepo,
};
use crate::visibility::Scope;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

fn slug_matches(slug: &str, base: &str) -> bool {
    slug == base || slug.starts_with(&format!("{}-", base))
}

#[derive(Default)]
pub struct InMemoryCategorieRepo {
    categories: Arc<RwLock<HashMap<Uuid, Categorie>>>,
}

impl InMemoryCategorieRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CategorieRepo for InMemoryCategorieRepo {
    async fn create(&self, categorie: Categorie) -> Result<Categorie> {
        let mut categories = self.categories.write().await;
        if categories
            .values()
            .any(|c| c.nom == categorie.nom || c.slug == categorie.slug)
        {
            return Err(ContentEngineError::Conflict(
                "categorie already exists".to_string(),
            ));
        }
        categories.insert(categorie.id, categorie.clone());
        Ok(categorie)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Categorie>> {
        Ok(self.categories.read().await.get(&id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Categorie>> {
        Ok(self
            .categories
            .read()
            .await
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Categorie>> {
        let categories = self.categories.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| categories.get(id).cloned())
            .collect())
    }

    async fn list(&self) -> Result<Vec<Categorie>> {
        let mut rows: Vec<Categorie> = self.categories.read().await.values().cloned().collect();
        rows.sort_by(|a, b| a.nom.cmp(&b.nom));
        Ok(rows)
    }

    async fn update(&self, categorie: Categorie) -> Result<Categorie> {
        let mut categories = self.categories.write().await;
        if categories
            .values()
            .any(|c| c.id != categorie.id && c.nom == categorie.nom)
        {
            return Err(ContentEngineError::Conflict(
                "categorie already exists".to_string(),
            ));
        }
        let entry = categories
            .get_mut(&categorie.id)
            .ok_or(ContentEngineError::CategorieNotFound(categorie.id))?;
        entry.nom = categorie.nom;
        Ok(entry.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.categories.write().await.remove(&id).is_some())
    }

    async fn slugs_like(&self, base: &str) -> Result<Vec<String>> {
        Ok(self
            .categories
            .read()
            .await
            .values()
            .filter(|c| slug_matches(&c.slug, base))
            .map(|c| c.slug.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryArticleRepo {
    articles: Arc<RwLock<HashMap<Uuid, Article>>>,
    article_tags: Arc<RwLock<HashMap<Uuid, Vec<Uuid>>>>,
    tags: Arc<RwLock<HashMap<Uuid, Tag>>>,
    categories: Arc<RwLock<HashMap<Uuid, Categorie>>>,
}

impl InMemoryArticleRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share tag and category state with sibling in-memory repos so joins
    /// behave like the relational store.
    pub fn with_shared(
        tags: &InMemoryTagRepo,
        categories: &InMemoryCategorieRepo,
    ) -> Self {
        InMemoryArticleRepo {
            articles: Arc::new(RwLock::new(HashMap::new())),
            article_tags: Arc::new(RwLock::new(HashMap::new())),
            tags: tags.tags.clone(),
            categories: categories.categories.clone(),
        }
    }

    fn in_scope(article: &Article, scope: Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::Public => article.statut == crate::models::ArticleStatut::Published,
        }
    }
}

#[async_trait]
impl ArticleRepo for InMemoryArticleRepo {
    async fn create(&self, article: Article) -> Result<Article> {
        let mut articles = self.articles.write().await;
        if articles.values().any(|a| a.slug == article.slug) {
            return Err(ContentEngineError::Conflict(
                "article already exists".to_string(),
            ));
        }
        articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn get(&self, id: Uuid, scope: Scope) -> Result<Option<Article>> {
        Ok(self
            .articles
            .read()
            .await
            .get(&id)
            .filter(|a| Self::in_scope(a, scope))
            .cloned())
    }

    async fn get_by_slug(&self, slug: &str, scope: Scope) -> Result<Option<Article>> {
        Ok(self
            .articles
            .read()
            .await
            .values()
            .find(|a| a.slug == slug && Self::in_scope(a, scope))
            .cloned())
    }

    async fn list(&self, scope: Scope, filter: ArticleFilter) -> Result<Vec<Article>> {
        let categories = self.categories.read().await;
        let categorie_id = filter.categorie_slug.as_deref().map(|slug| {
            categories
                .values()
                .find(|c| c.slug == slug)
                .map(|c| c.id)
        });

        let statut = match scope {
            Scope::Public => Some(crate::models::ArticleStatut::Published),
            Scope::All => filter.statut,
        };
        let search = filter.search.map(|s| s.to_lowercase());

        let mut rows: Vec<Article> = self
            .articles
            .read()
            .await
            .values()
            .filter(|a| statut.map_or(true, |s| a.statut == s))
            .filter(|a| match &categorie_id {
                None => true,
                // Unknown slug matches nothing, like the SQL join
                Some(None) => false,
                Some(Some(id)) => a.categorie_id == Some(*id),
            })
            .filter(|a| {
                search.as_deref().map_or(true, |needle| {
                    a.titre.to_lowercase().contains(needle)
                        || a.contenu.to_lowercase().contains(needle)
                        || a.meta_description.to_lowercase().contains(needle)
                        || a.mots_cles.to_lowercase().contains(needle)
                })
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date_creation.cmp(&a.date_creation));
        Ok(rows)
    }

    async fn update(&self, article: Article) -> Result<Article> {
        let mut articles = self.articles.write().await;
        let entry = articles
            .get_mut(&article.id)
            .ok_or(ContentEngineError::ArticleNotFound(article.id))?;
        // Slug stays as assigned
        let slug = entry.slug.clone();
        *entry = article;
        entry.slug = slug;
        Ok(entry.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        self.article_tags.write().await.remove(&id);
        Ok(self.articles.write().await.remove(&id).is_some())
    }

    async fn slugs_like(&self, base: &str) -> Result<Vec<String>> {
        Ok(self
            .articles
            .read()
            .await
            .values()
            .filter(|a| slug_matches(&a.slug, base))
            .map(|a| a.slug.clone())
            .collect())
    }

    async fn set_tags(&self, article_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
        let unique: HashSet<Uuid> = tag_ids.iter().copied().collect();
        self.article_tags
            .write()
            .await
            .insert(article_id, unique.into_iter().collect());
        Ok(())
    }

    async fn tags_of(&self, article_id: Uuid) -> Result<Vec<Tag>> {
        let tags = self.tags.read().await;
        let mut rows: Vec<Tag> = self
            .article_tags
            .read()
            .await
            .get(&article_id)
            .map(|ids| ids.iter().filter_map(|id| tags.get(id).cloned()).collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| a.nom.cmp(&b.nom));
        Ok(rows)
    }

    async fn tags_of_many(&self, article_ids: &[Uuid]) -> Result<Vec<(Uuid, Tag)>> {
        let mut rows = Vec::new();
        for article_id in article_ids {
            for tag in self.tags_of(*article_id).await? {
                rows.push((*article_id, tag));
            }
        }
        Ok(rows)
    }
}

#[derive(Default)]
pub struct InMemoryCommentaireRepo {
    commentaires: Arc<RwLock<HashMap<Uuid, Commentaire>>>,
}

impl InMemoryCommentaireRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn in_scope(commentaire: &Commentaire, scope: Scope) -> bool {
        match scope {
            Scope::All => true,
            Scope::Public => commentaire.valide,
        }
    }
}

#[async_trait]
impl CommentaireRepo for InMemoryCommentaireRepo {
    async fn create(&self, commentaire: Commentaire) -> Result<Commentaire> {
        self.commentaires
            .write()
            .await
            .insert(commentaire.id, commentaire.clone());
        Ok(commentaire)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Commentaire>> {
        Ok(self.commentaires.read().await.get(&id).cloned())
    }

    async fn list(&self, scope: Scope, filter: CommentaireFilter) -> Result<Vec<Commentaire>> {
        let valide = match scope {
            Scope::Public => Some(true),
            Scope::All => filter.valide,
        };
        let mut rows: Vec<Commentaire> = self
            .commentaires
            .read()
            .await
            .values()
            .filter(|c| filter.article_id.map_or(true, |id| c.article_id == id))
            .filter(|c| valide.map_or(true, |v| c.valide == v))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date_creation.cmp(&a.date_creation));
        Ok(rows)
    }

    async fn list_thread(&self, article_id: Uuid, scope: Scope) -> Result<Vec<Commentaire>> {
        let mut rows: Vec<Commentaire> = self
            .commentaires
            .read()
            .await
            .values()
            .filter(|c| c.article_id == article_id && Self::in_scope(c, scope))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.date_creation.cmp(&b.date_creation));
        Ok(rows)
    }

    async fn update(&self, commentaire: Commentaire) -> Result<Commentaire> {
        let mut commentaires = self.commentaires.write().await;
        let entry = commentaires
            .get_mut(&commentaire.id)
            .ok_or(ContentEngineError::CommentaireNotFound(commentaire.id))?;
        entry.contenu = commentaire.contenu;
        entry.parent_id = commentaire.parent_id;
        Ok(entry.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.commentaires.write().await.remove(&id).is_some())
    }

    async fn validate(&self, id: Uuid) -> Result<bool> {
        let mut commentaires = self.commentaires.write().await;
        match commentaires.get_mut(&id) {
            Some(commentaire) => {
                commentaire.valide = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct InMemoryTagRepo {
    pub(crate) tags: Arc<RwLock<HashMap<Uuid, Tag>>>,
}

impl InMemoryTagRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TagRepo for InMemoryTagRepo {
    async fn create(&self, tag: Tag) -> Result<Tag> {
        let mut tags = self.tags.write().await;
        if tags.values().any(|t| t.nom == tag.nom || t.slug == tag.slug) {
            return Err(ContentEngineError::Conflict(
                "tag already exists".to_string(),
            ));
        }
        tags.insert(tag.id, tag.clone());
        Ok(tag)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Tag>> {
        Ok(self.tags.read().await.get(&id).cloned())
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Tag>> {
        let tags = self.tags.read().await;
        Ok(ids.iter().filter_map(|id| tags.get(id).cloned()).collect())
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        let mut rows: Vec<Tag> = self.tags.read().await.values().cloned().collect();
        rows.sort_by(|a, b| a.nom.cmp(&b.nom));
        Ok(rows)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        Ok(self.tags.write().await.remove(&id).is_some())
    }

    async fn slugs_like(&self, base: &str) -> Result<Vec<String>> {
        Ok(self
            .tags
            .read()
            .await
            .values()
            .filter(|t| slug_matches(&t.slug, base))
            .map(|t| t.slug.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct InMemorySkillRepo {
    skills: Arc<RwLock<Vec<Skill>>>,
}

impl InMemorySkillRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, skills: Vec<Skill>) {
        *self.skills.write().await = skills;
    }
}

#[async_trait]
impl SkillRepo for InMemorySkillRepo {
    async fn list(&self) -> Result<Vec<Skill>> {
        let mut rows = self.skills.read().await.clone();
        rows.sort_by(|a, b| a.nom.cmp(&b.nom));
        Ok(rows)
    }
}
