//! Role-gated read visibility.
//!
//! One predicate per entity, applied at the repository boundary through
//! `Scope`, never branched inline in handlers. Filtering happens on every
//! read, so a role change is reflected immediately.

use crate::models::{Article, ArticleStatut, Commentaire};
use crate::security::Requester;

/// Which slice of the store a requester may read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Published articles and validated comments only.
    Public,
    /// Everything (elevated requesters).
    All,
}

pub fn scope_for(requester: &Requester) -> Scope {
    if requester.is_elevated() {
        Scope::All
    } else {
        Scope::Public
    }
}

pub fn article_visible(requester: &Requester, article: &Article) -> bool {
    requester.is_elevated() || article.statut == ArticleStatut::Published
}

pub fn commentaire_visible(requester: &Requester, commentaire: &Commentaire) -> bool {
    requester.is_elevated() || commentaire.valide
}
