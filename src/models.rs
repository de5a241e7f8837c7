use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Genre {
    Drama,
    Action,
    Crime,
    Adventure,
    #[serde(rename = "Sci-Fi")]
    SciFi,
    Romance,
    Biography,
    Fantasy,
}

impl Genre {
    pub const ALL: [Genre; 8] = [
        Genre::Drama,
        Genre::Action,
        Genre::Crime,
        Genre::Adventure,
        Genre::SciFi,
        Genre::Romance,
        Genre::Biography,
        Genre::Fantasy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Genre::Drama => "Drama",
            Genre::Action => "Action",
            Genre::Crime => "Crime",
            Genre::Adventure => "Adventure",
            Genre::SciFi => "Sci-Fi",
            Genre::Romance => "Romance",
            Genre::Biography => "Biography",
            Genre::Fantasy => "Fantasy",
        }
    }

    /// Case-insensitive equality against a filter token.
    pub fn matches(self, token: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(token)
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("unknown genre: {0}")]
pub struct UnknownGenre(pub String);

impl FromStr for Genre {
    type Err = UnknownGenre;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownGenre(s.to_string()))
    }
}

/// A stored movie in its flattened external shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: String,
    pub title: String,
    pub year: i32,
    pub director: String,
    pub duration: i32,
    pub poster: String,
    pub rate: f64,
    pub genre: Vec<Genre>,
}

/// Fields of a movie that passed create validation. Carries no id: ids are
/// assigned by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewMovie {
    pub title: String,
    pub year: i32,
    pub director: String,
    pub duration: i32,
    pub poster: String,
    pub rate: f64,
    pub genre: Vec<Genre>,
}

impl NewMovie {
    pub fn with_id(self, id: String) -> Movie {
        Movie {
            id,
            title: self.title,
            year: self.year,
            director: self.director,
            duration: self.duration,
            poster: self.poster,
            rate: self.rate,
            genre: self.genre,
        }
    }
}

/// Fields of a partial update that passed validation. `None` means "leave as is".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MoviePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<Vec<Genre>>,
}

impl MoviePatch {
    pub fn is_empty(&self) -> bool {
        *self == MoviePatch::default()
    }
}

impl Movie {
    /// Overwrites every field present in `patch`. The id is never touched.
    pub fn apply(&mut self, patch: &MoviePatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if let Some(director) = &patch.director {
            self.director = director.clone();
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(poster) = &patch.poster {
            self.poster = poster.clone();
        }
        if let Some(rate) = patch.rate {
            self.rate = rate;
        }
        if let Some(genre) = &patch.genre {
            self.genre = genre.clone();
        }
    }

    pub fn has_genre(&self, token: &str) -> bool {
        self.genre.iter().any(|g| g.matches(token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arrival() -> Movie {
        Movie {
            id: "a1".to_string(),
            title: "Arrival".to_string(),
            year: 2016,
            director: "Denis Villeneuve".to_string(),
            duration: 116,
            poster: "https://example.com/a.jpg".to_string(),
            rate: 0.0,
            genre: vec![Genre::SciFi, Genre::Drama],
        }
    }

    #[test]
    fn empty_patch_leaves_movie_unchanged() {
        let mut movie = arrival();
        movie.apply(&MoviePatch::default());
        assert_eq!(movie, arrival());
    }

    #[test]
    fn patch_overwrites_only_present_fields() {
        let mut movie = arrival();
        movie.apply(&MoviePatch { rate: Some(8.5), ..Default::default() });

        let mut expected = arrival();
        expected.rate = 8.5;
        assert_eq!(movie, expected);
    }

    #[test]
    fn genre_serializes_with_display_names() {
        let json = serde_json::to_string(&[Genre::SciFi, Genre::Drama]).unwrap();
        assert_eq!(json, r#"["Sci-Fi","Drama"]"#);
        assert_eq!("Sci-Fi".parse::<Genre>().unwrap(), Genre::SciFi);
        assert!("sci-fi".parse::<Genre>().is_err());
    }

    #[test]
    fn genre_matching_ignores_case() {
        let movie = arrival();
        assert!(movie.has_genre("sci-fi"));
        assert!(movie.has_genre("DRAMA"));
        assert!(!movie.has_genre("Action"));
    }
}
