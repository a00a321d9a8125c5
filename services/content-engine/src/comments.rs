//! Comment threading.
//!
//! Comments are stored flat, each holding an optional parent id. The tree
//! shape only exists at read time, built here from whatever slice of the
//! arena the caller is allowed to see. Parent assignment is validated
//! against self- and descendant-parenting, so the chains stay acyclic.

use crate::models::{Commentaire, CommentaireNode};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// Assemble the reply tree for one article from a flat comment list.
/// Top-level comments come newest first, replies oldest first. A visible
/// reply whose parent was filtered out is promoted to the top level rather
/// than dropped.
pub fn build_thread(comments: &[Commentaire]) -> Vec<CommentaireNode> {
    let ids: HashSet<Uuid> = comments.iter().map(|c| c.id).collect();

    let mut children: HashMap<Uuid, Vec<&Commentaire>> = HashMap::new();
    let mut roots: Vec<&Commentaire> = Vec::new();
    for comment in comments {
        match comment.parent_id {
            Some(parent) if ids.contains(&parent) => {
                children.entry(parent).or_default().push(comment)
            }
            _ => roots.push(comment),
        }
    }

    roots.sort_by(|a, b| b.date_creation.cmp(&a.date_creation));
    for replies in children.values_mut() {
        replies.sort_by(|a, b| a.date_creation.cmp(&b.date_creation));
    }

    roots
        .into_iter()
        .map(|c| to_node(c, &children))
        .collect()
}

fn to_node(comment: &Commentaire, children: &HashMap<Uuid, Vec<&Commentaire>>) -> CommentaireNode {
    let reponses = children
        .get(&comment.id)
        .map(|replies| replies.iter().map(|r| to_node(r, children)).collect())
        .unwrap_or_default();

    CommentaireNode {
        id: comment.id,
        auteur: comment.auteur.clone(),
        auteur_user: comment.auteur_user_id,
        contenu: comment.contenu.clone(),
        date_creation: comment.date_creation,
        valide: comment.valide,
        parent: comment.parent_id,
        reponses,
    }
}

/// Would re-parenting `comment_id` under `new_parent` close a loop?
/// True when the new parent is the comment itself or one of its
/// descendants. `parents` maps every comment of the article to its
/// current parent.
pub fn creates_cycle(
    parents: &HashMap<Uuid, Option<Uuid>>,
    comment_id: Uuid,
    new_parent: Uuid,
) -> bool {
    let mut cursor = Some(new_parent);
    while let Some(current) = cursor {
        if current == comment_id {
            return true;
        }
        cursor = parents.get(&current).copied().flatten();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn comment(id: u128, parent: Option<u128>, minute: u32) -> Commentaire {
        Commentaire {
            id: Uuid::from_u128(id),
            article_id: Uuid::from_u128(999),
            auteur: format!("auteur-{}", id),
            auteur_user_id: None,
            contenu: "Un commentaire suffisamment long".to_string(),
            date_creation: Utc.with_ymd_and_hms(2025, 8, 29, 10, minute, 0).unwrap(),
            valide: true,
            parent_id: parent.map(Uuid::from_u128),
        }
    }

    #[test]
    fn test_thread_nests_replies_under_parents() {
        let comments = vec![
            comment(1, None, 0),
            comment(2, Some(1), 1),
            comment(3, Some(1), 2),
            comment(4, Some(2), 3),
            comment(5, None, 4),
        ];

        let thread = build_thread(&comments);
        assert_eq!(thread.len(), 2);
        // Newest root first
        assert_eq!(thread[0].id, Uuid::from_u128(5));
        assert_eq!(thread[1].id, Uuid::from_u128(1));
        // Replies oldest first
        assert_eq!(thread[1].reponses.len(), 2);
        assert_eq!(thread[1].reponses[0].id, Uuid::from_u128(2));
        assert_eq!(thread[1].reponses[0].reponses[0].id, Uuid::from_u128(4));
    }

    #[test]
    fn test_reply_to_hidden_parent_is_promoted() {
        // Parent (id 1) filtered out by moderation; its reply must still
        // appear instead of vanishing.
        let comments = vec![comment(2, Some(1), 1)];
        let thread = build_thread(&comments);
        assert_eq!(thread.len(), 1);
        assert_eq!(thread[0].id, Uuid::from_u128(2));
    }

    #[test]
    fn test_cycle_detection() {
        // 1 <- 2 <- 3
        let parents: HashMap<Uuid, Option<Uuid>> = [
            (Uuid::from_u128(1), None),
            (Uuid::from_u128(2), Some(Uuid::from_u128(1))),
            (Uuid::from_u128(3), Some(Uuid::from_u128(2))),
        ]
        .into_iter()
        .collect();

        // Self-parenting
        assert!(creates_cycle(&parents, Uuid::from_u128(1), Uuid::from_u128(1)));
        // Descendant-parenting: 1 under 3 closes 1 -> 2 -> 3 -> 1
        assert!(creates_cycle(&parents, Uuid::from_u128(1), Uuid::from_u128(3)));
        // Re-parenting a leaf onto the root is fine
        assert!(!creates_cycle(&parents, Uuid::from_u128(3), Uuid::from_u128(1)));
    }
}
