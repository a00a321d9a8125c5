use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::ValidationError;

/// Publication status of an article
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatut {
    Draft,
    Published,
}

impl ArticleStatut {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArticleStatut::Draft => "draft",
            ArticleStatut::Published => "published",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Categorie {
    pub id: Uuid,
    pub nom: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Article {
    pub id: Uuid,
    pub titre: String,
    pub slug: String,
    pub contenu: String,
    pub image: Option<String>,               // opaque path/URL, no media pipeline
    pub categorie_id: Option<Uuid>,
    pub auteur_id: Option<Uuid>,
    pub auteur_nom: Option<String>,
    pub statut: ArticleStatut,
    pub meta_description: String,
    pub mots_cles: String,                   // comma-separated keywords
    pub date_creation: DateTime<Utc>,
    pub date_modification: DateTime<Utc>,
}

pub const EXTRAIT_LEN: usize = 300;

impl Article {
    /// Short excerpt used by the list serialization.
    pub fn extrait(&self) -> String {
        if self.contenu.chars().count() > EXTRAIT_LEN {
            let cut: String = self.contenu.chars().take(EXTRAIT_LEN).collect();
            format!("{}...", cut)
        } else {
            self.contenu.clone()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: Uuid,
    pub nom: String,                         // stored lowercase
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Commentaire {
    pub id: Uuid,
    pub article_id: Uuid,
    pub auteur: String,                      // display label, free text
    pub auteur_user_id: Option<Uuid>,        // set iff the requester was authenticated
    pub contenu: String,
    pub date_creation: DateTime<Utc>,
    pub valide: bool,                        // moderation gate, defaults false
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Skill {
    pub id: Uuid,
    pub nom: String,
    pub description: String,
}

// ---------------------------------------------------------------------------
// Request DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Serialize, validator::Validate)]
pub struct CreateCategorieRequest {
    #[validate(length(min = 3, max = 100))]
    pub nom: String,
}

#[derive(Debug, Deserialize, Serialize, validator::Validate)]
pub struct UpdateCategorieRequest {
    #[validate(length(min = 3, max = 100))]
    pub nom: String,
}

#[derive(Debug, Deserialize, Serialize, validator::Validate)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, max = 250))]
    pub titre: String,
    #[validate(length(min = 1))]
    pub contenu: String,
    pub image: Option<String>,
    pub categorie: Option<Uuid>,
    pub statut: Option<ArticleStatut>,
    #[validate(length(max = 300))]
    pub meta_description: Option<String>,
    #[validate(length(max = 300))]
    pub mots_cles: Option<String>,
    pub tags: Option<Vec<Uuid>>,
}

#[derive(Debug, Default, Deserialize, Serialize, validator::Validate)]
pub struct UpdateArticleRequest {
    #[validate(length(min = 1, max = 250))]
    pub titre: Option<String>,
    #[validate(length(min = 1))]
    pub contenu: Option<String>,
    pub image: Option<String>,
    pub categorie: Option<Uuid>,
    pub statut: Option<ArticleStatut>,
    #[validate(length(max = 300))]
    pub meta_description: Option<String>,
    #[validate(length(max = 300))]
    pub mots_cles: Option<String>,
    pub tags: Option<Vec<Uuid>>,
}

pub const COMMENTAIRE_MIN_LEN: usize = 10;
pub const COMMENTAIRE_MAX_LEN: usize = 1000;

#[derive(Debug, Deserialize, Serialize, validator::Validate)]
pub struct CreateCommentaireRequest {
    pub article: Uuid,
    /// Display label; ignored for authenticated requesters, required for
    /// anonymous ones.
    #[validate(length(min = 2, max = 150))]
    pub auteur: Option<String>,
    #[validate(custom = "validate_commentaire_contenu")]
    pub contenu: String,
    pub parent: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Serialize, validator::Validate)]
pub struct UpdateCommentaireRequest {
    #[validate(custom = "validate_commentaire_contenu")]
    pub contenu: Option<String>,
    pub parent: Option<Uuid>,
}

#[derive(Debug, Deserialize, Serialize, validator::Validate)]
pub struct CreateTagRequest {
    #[validate(length(min = 2, max = 100))]
    pub nom: String,
}

#[derive(Debug, Deserialize)]
pub struct ArticleListQuery {
    /// Category slug, equality match
    pub categorie: Option<String>,
    /// Effective for elevated requesters only
    pub statut: Option<ArticleStatut>,
    /// Substring match over titre/contenu/meta_description/mots_cles
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentaireListQuery {
    pub article: Option<Uuid>,
    /// Effective for elevated requesters only
    pub valide: Option<bool>,
}

/// Anti-spam floor and ceiling on the trimmed body.
fn validate_commentaire_contenu(contenu: &str) -> Result<(), ValidationError> {
    let trimmed = contenu.trim();
    if trimmed.chars().count() < COMMENTAIRE_MIN_LEN {
        return Err(ValidationError::new("contenu_too_short"));
    }
    if trimmed.chars().count() > COMMENTAIRE_MAX_LEN {
        return Err(ValidationError::new("contenu_too_long"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ArticleListItem {
    pub id: Uuid,
    pub titre: String,
    pub slug: String,
    pub extrait: String,
    pub image: Option<String>,
    pub categorie: Option<Categorie>,
    pub auteur: Option<String>,
    pub tags: Vec<Tag>,
    pub date_creation: DateTime<Utc>,
    pub statut: ArticleStatut,
    pub meta_description: String,
    pub mots_cles: String,
}

#[derive(Debug, Serialize)]
pub struct ArticleDetail {
    pub id: Uuid,
    pub titre: String,
    pub slug: String,
    pub contenu: String,
    pub image: Option<String>,
    pub categorie: Option<Categorie>,
    pub auteur: Option<String>,
    pub tags: Vec<Tag>,
    pub date_creation: DateTime<Utc>,
    pub date_modification: DateTime<Utc>,
    pub statut: ArticleStatut,
    pub meta_description: String,
    pub mots_cles: String,
    pub commentaires: Vec<CommentaireNode>,
}

/// One comment with its replies, assembled at read time from the flat store.
#[derive(Debug, Clone, Serialize)]
pub struct CommentaireNode {
    pub id: Uuid,
    pub auteur: String,
    pub auteur_user: Option<Uuid>,
    pub contenu: String,
    pub date_creation: DateTime<Utc>,
    pub valide: bool,
    pub parent: Option<Uuid>,
    pub reponses: Vec<CommentaireNode>,
}
