//! Built-in courses that can be played without supplying documents.

use crate::error::IngestionError;
use crate::ingest::collapse_whitespace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Course {
    /// Short identifier accepted on the command line.
    pub slug: &'static str,
    pub title: &'static str,
    pub content: &'static str,
}

impl Course {
    /// Course text as a corpus.
    pub fn corpus(&self) -> String {
        collapse_whitespace(self.content)
    }
}

pub const BUILT_IN_COURSES: [Course; 2] = [
    Course {
        slug: "remote-work-1",
        title: "Télétravail saison 1",
        content: r#"
INTRODUCTION AU TÉLÉTRAVAIL

Le télétravail est une forme d'organisation du travail dans laquelle un travailleur accomplit ses tâches en dehors des locaux de son employeur, de façon régulière et volontaire, en utilisant les technologies de l'information et de la communication (TIC).

Les avantages principaux :
1. Gain de temps (moins de transports).
2. Meilleur équilibre vie pro / vie perso.
3. Productivité accrue (moins d'interruptions).

Les défis majeurs :
1. Isolement social.
2. Difficulté à déconnecter (Droit à la déconnexion).
3. Communication asynchrone nécessaire.
"#,
    },
    Course {
        slug: "remote-work-2",
        title: "Télétravail saison 2",
        content: r#"
MANAGEMENT ET OUTILS DU TÉLÉTRAVAIL AVANCÉ

Pour réussir le télétravail à long terme, il faut maîtriser les outils et le management à distance.

Outils collaboratifs clés :
- Visioconférence : Zoom, Teams, Google Meet.
- Messagerie instantanée : Slack, Discord (communication rapide).
- Gestion de projet : Trello, Asana, Notion (suivi des tâches).

Bonnes pratiques de management :
- Management par objectifs (résultats) plutôt que par présence.
- Faire confiance à ses équipes.
- Maintenir des rituels informels (pauses café virtuelles) pour la cohésion d'équipe.
- Sécuriser les données (VPN, Mots de passe forts).
"#,
    },
];

/// Look a course up by slug or title, ignoring case.
pub fn find_course(query: &str) -> Result<&'static Course, IngestionError> {
    let query = query.trim();
    BUILT_IN_COURSES
        .iter()
        .find(|c| c.slug.eq_ignore_ascii_case(query) || c.title.to_lowercase() == query.to_lowercase())
        .ok_or_else(|| IngestionError::UnknownCourse(query.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_by_slug_or_title() {
        assert_eq!(find_course("remote-work-1").unwrap().title, "Télétravail saison 1");
        assert_eq!(find_course(" REMOTE-WORK-2 ").unwrap().slug, "remote-work-2");
        assert_eq!(find_course("télétravail SAISON 2").unwrap().slug, "remote-work-2");
    }

    #[test]
    fn unknown_course_is_an_error() {
        assert!(matches!(
            find_course("underwater basket weaving"),
            Err(IngestionError::UnknownCourse(name)) if name == "underwater basket weaving"
        ));
    }

    #[test]
    fn corpus_is_single_line() {
        for course in &BUILT_IN_COURSES {
            let corpus = course.corpus();
            assert!(!corpus.is_empty());
            assert!(!corpus.contains('\n'));
        }
    }
}
