use crate::errors::{ContentEngineError, Result};
use crate::models::{Article, Categorie, Commentaire, Skill, Tag};
use crate::repository::{
    ArticleFilter, ArticleRepo, CategorieRepo, CommentaireFilter, CommentaireRepo, SkillRepo,
    TagRepo,
};
use crate::visibility::Scope;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Pool, Postgres, Row};
use std::time::Duration;
use uuid::Uuid;

pub struct Database {
    pool: Pool<Postgres>,
}

impl Database {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Database { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps a unique-constraint violation onto Conflict so the slug loop can
/// retry; everything else stays a database error.
fn map_unique_violation(e: sqlx::Error, what: &str) -> ContentEngineError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            return ContentEngineError::Conflict(format!("{} already exists", what));
        }
    }
    ContentEngineError::Database(e)
}

/// Articles outside the scope behave as if they did not exist.
fn statut_gate(scope: Scope) -> Option<&'static str> {
    match scope {
        Scope::Public => Some("published"),
        Scope::All => None,
    }
}

fn valide_gate(scope: Scope) -> Option<bool> {
    match scope {
        Scope::Public => Some(true),
        Scope::All => None,
    }
}

#[async_trait]
impl CategorieRepo for Database {
    async fn create(&self, categorie: Categorie) -> Result<Categorie> {
        sqlx::query_as::<_, Categorie>(
            r#"
            INSERT INTO categories (id, nom, slug)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(categorie.id)
        .bind(&categorie.nom)
        .bind(&categorie.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "categorie"))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Categorie>> {
        let categorie = sqlx::query_as::<_, Categorie>(
            r#"
            SELECT * FROM categories WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(categorie)
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Categorie>> {
        let categorie = sqlx::query_as::<_, Categorie>(
            r#"
            SELECT * FROM categories WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(categorie)
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Categorie>> {
        let categories = sqlx::query_as::<_, Categorie>(
            r#"
            SELECT * FROM categories WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn list(&self) -> Result<Vec<Categorie>> {
        let categories = sqlx::query_as::<_, Categorie>(
            r#"
            SELECT * FROM categories ORDER BY nom
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn update(&self, categorie: Categorie) -> Result<Categorie> {
        sqlx::query_as::<_, Categorie>(
            r#"
            UPDATE categories SET nom = $2 WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(categorie.id)
        .bind(&categorie.nom)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "categorie"))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM categories WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn slugs_like(&self, base: &str) -> Result<Vec<String>> {
        let slugs = sqlx::query_scalar::<_, String>(
            r#"
            SELECT slug FROM categories WHERE slug = $1 OR slug LIKE $2
            "#,
        )
        .bind(base)
        .bind(format!("{}-%", base))
        .fetch_all(&self.pool)
        .await?;

        Ok(slugs)
    }
}

#[async_trait]
impl ArticleRepo for Database {
    async fn create(&self, article: Article) -> Result<Article> {
        sqlx::query_as::<_, Article>(
            r#"
            INSERT INTO articles (
                id, titre, slug, contenu, image, categorie_id,
                auteur_id, auteur_nom, statut, meta_description, mots_cles,
                date_creation, date_modification
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(article.id)
        .bind(&article.titre)
        .bind(&article.slug)
        .bind(&article.contenu)
        .bind(&article.image)
        .bind(article.categorie_id)
        .bind(article.auteur_id)
        .bind(&article.auteur_nom)
        .bind(article.statut)
        .bind(&article.meta_description)
        .bind(&article.mots_cles)
        .bind(article.date_creation)
        .bind(article.date_modification)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "article"))
    }

    async fn get(&self, id: Uuid, scope: Scope) -> Result<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(
            r#"
            SELECT * FROM articles
            WHERE id = $1 AND ($2::text IS NULL OR statut = $2)
            "#,
        )
        .bind(id)
        .bind(statut_gate(scope))
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }

    async fn get_by_slug(&self, slug: &str, scope: Scope) -> Result<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(
            r#"
            SELECT * FROM articles
            WHERE slug = $1 AND ($2::text IS NULL OR statut = $2)
            "#,
        )
        .bind(slug)
        .bind(statut_gate(scope))
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }

    async fn list(&self, scope: Scope, filter: ArticleFilter) -> Result<Vec<Article>> {
        // The scope gate wins over the caller's statut filter.
        let statut = statut_gate(scope)
            .map(|s| s.to_string())
            .or_else(|| filter.statut.map(|s| s.as_str().to_string()));
        let search = filter.search.map(|s| format!("%{}%", s));

        let articles = sqlx::query_as::<_, Article>(
            r#"
            SELECT a.* FROM articles a
            LEFT JOIN categories c ON c.id = a.categorie_id
            WHERE ($1::text IS NULL OR a.statut = $1)
              AND ($2::text IS NULL OR c.slug = $2)
              AND ($3::text IS NULL
                   OR a.titre ILIKE $3
                   OR a.contenu ILIKE $3
                   OR a.meta_description ILIKE $3
                   OR a.mots_cles ILIKE $3)
            ORDER BY a.date_creation DESC
            "#,
        )
        .bind(statut)
        .bind(filter.categorie_slug)
        .bind(search)
        .fetch_all(&self.pool)
        .await?;

        Ok(articles)
    }

    async fn update(&self, article: Article) -> Result<Article> {
        // The slug is immutable once assigned and is deliberately absent
        // from the SET list.
        let article = sqlx::query_as::<_, Article>(
            r#"
            UPDATE articles SET
                titre = $2,
                contenu = $3,
                image = $4,
                categorie_id = $5,
                statut = $6,
                meta_description = $7,
                mots_cles = $8,
                date_modification = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(article.id)
        .bind(&article.titre)
        .bind(&article.contenu)
        .bind(&article.image)
        .bind(article.categorie_id)
        .bind(article.statut)
        .bind(&article.meta_description)
        .bind(&article.mots_cles)
        .bind(article.date_modification)
        .fetch_one(&self.pool)
        .await?;

        Ok(article)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM articles WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn slugs_like(&self, base: &str) -> Result<Vec<String>> {
        let slugs = sqlx::query_scalar::<_, String>(
            r#"
            SELECT slug FROM articles WHERE slug = $1 OR slug LIKE $2
            "#,
        )
        .bind(base)
        .bind(format!("{}-%", base))
        .fetch_all(&self.pool)
        .await?;

        Ok(slugs)
    }

    async fn set_tags(&self, article_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM article_tags WHERE article_id = $1
            "#,
        )
        .bind(article_id)
        .execute(&mut *tx)
        .await?;

        for tag_id in tag_ids {
            sqlx::query(
                r#"
                INSERT INTO article_tags (article_id, tag_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(article_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn tags_of(&self, article_id: Uuid) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT t.* FROM tags t
            JOIN article_tags at ON at.tag_id = t.id
            WHERE at.article_id = $1
            ORDER BY t.nom
            "#,
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    async fn tags_of_many(&self, article_ids: &[Uuid]) -> Result<Vec<(Uuid, Tag)>> {
        let rows = sqlx::query(
            r#"
            SELECT at.article_id, t.id, t.nom, t.slug FROM tags t
            JOIN article_tags at ON at.tag_id = t.id
            WHERE at.article_id = ANY($1)
            ORDER BY t.nom
            "#,
        )
        .bind(article_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                (
                    row.get("article_id"),
                    Tag {
                        id: row.get("id"),
                        nom: row.get("nom"),
                        slug: row.get("slug"),
                    },
                )
            })
            .collect())
    }
}

#[async_trait]
impl CommentaireRepo for Database {
    async fn create(&self, commentaire: Commentaire) -> Result<Commentaire> {
        let commentaire = sqlx::query_as::<_, Commentaire>(
            r#"
            INSERT INTO commentaires (
                id, article_id, auteur, auteur_user_id, contenu,
                date_creation, valide, parent_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(commentaire.id)
        .bind(commentaire.article_id)
        .bind(&commentaire.auteur)
        .bind(commentaire.auteur_user_id)
        .bind(&commentaire.contenu)
        .bind(commentaire.date_creation)
        .bind(commentaire.valide)
        .bind(commentaire.parent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(commentaire)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Commentaire>> {
        let commentaire = sqlx::query_as::<_, Commentaire>(
            r#"
            SELECT * FROM commentaires WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(commentaire)
    }

    async fn list(&self, scope: Scope, filter: CommentaireFilter) -> Result<Vec<Commentaire>> {
        // The moderation gate wins over the caller's valide filter.
        let valide = valide_gate(scope).or(filter.valide);

        let commentaires = sqlx::query_as::<_, Commentaire>(
            r#"
            SELECT * FROM commentaires
            WHERE ($1::uuid IS NULL OR article_id = $1)
              AND ($2::boolean IS NULL OR valide = $2)
            ORDER BY date_creation DESC
            "#,
        )
        .bind(filter.article_id)
        .bind(valide)
        .fetch_all(&self.pool)
        .await?;

        Ok(commentaires)
    }

    async fn list_thread(&self, article_id: Uuid, scope: Scope) -> Result<Vec<Commentaire>> {
        let commentaires = sqlx::query_as::<_, Commentaire>(
            r#"
            SELECT * FROM commentaires
            WHERE article_id = $1 AND ($2::boolean IS NULL OR valide = $2)
            ORDER BY date_creation ASC
            "#,
        )
        .bind(article_id)
        .bind(valide_gate(scope))
        .fetch_all(&self.pool)
        .await?;

        Ok(commentaires)
    }

    async fn update(&self, commentaire: Commentaire) -> Result<Commentaire> {
        let commentaire = sqlx::query_as::<_, Commentaire>(
            r#"
            UPDATE commentaires SET contenu = $2, parent_id = $3
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(commentaire.id)
        .bind(&commentaire.contenu)
        .bind(commentaire.parent_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(commentaire)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM commentaires WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn validate(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE commentaires SET valide = TRUE WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TagRepo for Database {
    async fn create(&self, tag: Tag) -> Result<Tag> {
        sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (id, nom, slug)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(tag.id)
        .bind(&tag.nom)
        .bind(&tag.slug)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "tag"))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            SELECT * FROM tags WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(tag)
    }

    async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT * FROM tags WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT * FROM tags ORDER BY nom
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM tags WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn slugs_like(&self, base: &str) -> Result<Vec<String>> {
        let slugs = sqlx::query_scalar::<_, String>(
            r#"
            SELECT slug FROM tags WHERE slug = $1 OR slug LIKE $2
            "#,
        )
        .bind(base)
        .bind(format!("{}-%", base))
        .fetch_all(&self.pool)
        .await?;

        Ok(slugs)
    }
}

#[async_trait]
impl SkillRepo for Database {
    async fn list(&self) -> Result<Vec<Skill>> {
        let skills = sqlx::query_as::<_, Skill>(
            r#"
            SELECT * FROM skills ORDER BY nom
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(skills)
    }
}
