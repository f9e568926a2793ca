//! Wire shapes of the TMDb v3 responses we read. Unknown fields are ignored.

use serde::Deserialize;

use actor_link_core::{EntityId, MovieDetail, PersonDetail};

/// `/person/{id}/movie_credits` and `/movie/{id}/credits` both carry a `cast` array.
#[derive(Debug, Deserialize)]
pub struct CreditsResponse {
    #[serde(default)]
    pub cast: Vec<CastEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CastEntry {
    pub id: EntityId,
}

impl CreditsResponse {
    pub fn ids(self) -> Vec<EntityId> {
        self.cast.into_iter().map(|c| c.id).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct PersonResponse {
    pub name: Option<String>,
    pub birthday: Option<String>,
    pub deathday: Option<String>,
    pub profile_path: Option<String>,
}

impl From<PersonResponse> for PersonDetail {
    fn from(p: PersonResponse) -> Self {
        PersonDetail {
            name: p.name.filter(|n| !n.is_empty()).unwrap_or_else(|| "Unknown".to_string()),
            birthday: p.birthday.filter(|d| !d.is_empty()),
            deathday: p.deathday.filter(|d| !d.is_empty()),
            profile_path: p.profile_path,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MovieResponse {
    pub title: Option<String>,
    pub original_title: Option<String>,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
}

impl From<MovieResponse> for MovieDetail {
    fn from(m: MovieResponse) -> Self {
        let title = m
            .title
            .filter(|t| !t.is_empty())
            .or(m.original_title.filter(|t| !t.is_empty()))
            .unwrap_or_else(|| "Unknown".to_string());
        MovieDetail {
            title,
            release_year: m.release_date.as_deref().and_then(release_year),
            poster_path: m.poster_path,
        }
    }
}

/// Year of a `YYYY-MM-DD` date. TMDb sends `""` for unknown dates.
fn release_year(date: &str) -> Option<i32> {
    date.get(..4)?.parse().ok()
}
