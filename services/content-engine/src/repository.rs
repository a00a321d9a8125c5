//! Entity repositories. Handlers and domain logic depend on these traits,
//! never on a concrete store. Read methods take a `Scope` so visibility is
//! enforced at the repository boundary.

use crate::errors::Result;
use crate::models::{Article, ArticleStatut, Categorie, Commentaire, Skill, Tag};
use crate::visibility::Scope;
use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub categorie_slug: Option<String>,
    pub statut: Option<ArticleStatut>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CommentaireFilter {
    pub article_id: Option<Uuid>,
    pub valide: Option<bool>,
}

#[async_trait]
pub trait CategorieRepo: Send + Sync {
    async fn create(&self, categorie: Categorie) -> Result<Categorie>;
    async fn get(&self, id: Uuid) -> Result<Option<Categorie>>;
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Categorie>>;
    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Categorie>>;
    async fn list(&self) -> Result<Vec<Categorie>>;
    async fn update(&self, categorie: Categorie) -> Result<Categorie>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    /// Slugs equal to `base` or starting with `base-`, for collision
    /// resolution.
    async fn slugs_like(&self, base: &str) -> Result<Vec<String>>;
}

#[async_trait]
pub trait ArticleRepo: Send + Sync {
    async fn create(&self, article: Article) -> Result<Article>;
    async fn get(&self, id: Uuid, scope: Scope) -> Result<Option<Article>>;
    async fn get_by_slug(&self, slug: &str, scope: Scope) -> Result<Option<Article>>;
    async fn list(&self, scope: Scope, filter: ArticleFilter) -> Result<Vec<Article>>;
    async fn update(&self, article: Article) -> Result<Article>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn slugs_like(&self, base: &str) -> Result<Vec<String>>;
    async fn set_tags(&self, article_id: Uuid, tag_ids: &[Uuid]) -> Result<()>;
    async fn tags_of(&self, article_id: Uuid) -> Result<Vec<Tag>>;
    /// Tag rows for a batch of articles, as (article_id, tag) pairs.
    async fn tags_of_many(&self, article_ids: &[Uuid]) -> Result<Vec<(Uuid, Tag)>>;
}

#[async_trait]
pub trait CommentaireRepo: Send + Sync {
    async fn create(&self, commentaire: Commentaire) -> Result<Commentaire>;
    async fn get(&self, id: Uuid) -> Result<Option<Commentaire>>;
    async fn list(&self, scope: Scope, filter: CommentaireFilter) -> Result<Vec<Commentaire>>;
    /// Every comment of one article within the scope, for thread assembly.
    async fn list_thread(&self, article_id: Uuid, scope: Scope) -> Result<Vec<Commentaire>>;
    async fn update(&self, commentaire: Commentaire) -> Result<Commentaire>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    /// Moderation approval. Returns false when the comment does not exist.
    async fn validate(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait TagRepo: Send + Sync {
    async fn create(&self, tag: Tag) -> Result<Tag>;
    async fn get(&self, id: Uuid) -> Result<Option<Tag>>;
    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Tag>>;
    async fn list(&self) -> Result<Vec<Tag>>;
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn slugs_like(&self, base: &str) -> Result<Vec<String>>;
}

#[async_trait]
pub trait SkillRepo: Send + Sync {
    async fn list(&self) -> Result<Vec<Skill>>;
}
