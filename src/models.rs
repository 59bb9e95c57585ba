use jiff::{Timestamp, civil::DateTime, tz::TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

pub const TITLE_MAX_CHARS: usize = 200;
pub const POSTER_MAX_CHARS: usize = 500;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub poster_image: Option<String>,
    #[serde(deserialize_with = "de_timestamp")]
    pub created_at: Timestamp,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub updated_at: Option<Timestamp>,
}

// Unset fields are left out of the payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poster_image: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Genre {
    Action,
    Comedy,
    Drama,
    Horror,
    Romance,
    SciFi,
    Thriller,
    Animation,
    Documentary,
    Fantasy,
}

impl Genre {
    pub const ALL: [Genre; 10] = [
        Genre::Action,
        Genre::Comedy,
        Genre::Drama,
        Genre::Horror,
        Genre::Romance,
        Genre::SciFi,
        Genre::Thriller,
        Genre::Animation,
        Genre::Documentary,
        Genre::Fantasy,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Comedy => "Comedy",
            Genre::Drama => "Drama",
            Genre::Horror => "Horror",
            Genre::Romance => "Romance",
            Genre::SciFi => "Sci-Fi",
            Genre::Thriller => "Thriller",
            Genre::Animation => "Animation",
            Genre::Documentary => "Documentary",
            Genre::Fantasy => "Fantasy",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Genre::ALL.into_iter().find(|g| g.label().eq_ignore_ascii_case(label))
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SortOption {
    #[default]
    TitleAsc,
    TitleDesc,
    RatingAsc,
    RatingDesc,
}

impl SortOption {
    pub const ALL: [SortOption; 4] =
        [SortOption::TitleAsc, SortOption::TitleDesc, SortOption::RatingAsc, SortOption::RatingDesc];

    // Unknown or empty values fall back to title ascending.
    pub fn parse(value: &str) -> Self {
        SortOption::ALL.into_iter().find(|s| s.value() == value.trim()).unwrap_or_default()
    }

    pub fn value(self) -> &'static str {
        match self {
            SortOption::TitleAsc => "title-asc",
            SortOption::TitleDesc => "title-desc",
            SortOption::RatingAsc => "rating-asc",
            SortOption::RatingDesc => "rating-desc",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortOption::TitleAsc => "Title (A-Z)",
            SortOption::TitleDesc => "Title (Z-A)",
            SortOption::RatingAsc => "Rating (Low to High)",
            SortOption::RatingDesc => "Rating (High to Low)",
        }
    }

    pub fn sort_by(self) -> &'static str {
        match self {
            SortOption::TitleAsc | SortOption::TitleDesc => "title",
            SortOption::RatingAsc | SortOption::RatingDesc => "rating",
        }
    }

    pub fn sort_order(self) -> &'static str {
        match self {
            SortOption::TitleAsc | SortOption::RatingAsc => "asc",
            SortOption::TitleDesc | SortOption::RatingDesc => "desc",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ListQuery {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ListQuery {
    pub fn new(search: &str, genre: &str, sort: SortOption) -> Self {
        Self {
            search: Some(search.to_string()),
            genre: Some(genre.to_string()),
            sort_by: Some(sort.sort_by().to_string()),
            sort_order: Some(sort.sort_order().to_string()),
        }
    }

    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("search", &self.search),
            ("genre", &self.genre),
            ("sortBy", &self.sort_by),
            ("sortOrder", &self.sort_order),
        ]
        .into_iter()
        .filter_map(|(key, value)| {
            value.as_deref().filter(|v| !v.is_empty()).map(|v| (key, v))
        })
        .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ListFilters {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub sort: String,
}

impl ListFilters {
    pub fn sort_option(&self) -> SortOption {
        SortOption::parse(&self.sort)
    }

    pub fn is_filtered(&self) -> bool {
        !self.search.trim().is_empty() || !self.genre.trim().is_empty()
    }

    pub fn list_query(&self) -> ListQuery {
        ListQuery::new(self.search.trim(), self.genre.trim(), self.sort_option())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MovieForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub poster_image: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldErrors {
    pub title: Option<String>,
    pub rating: Option<String>,
    pub poster_image: Option<String>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.rating.is_none()
            && self.poster_image.is_none()
    }
}

impl MovieForm {
    pub fn from_movie(movie: &Movie) -> Self {
        Self {
            title: movie.title.clone(),
            genre: movie.genre.clone().unwrap_or_default(),
            rating: movie.rating.map(|r| r.to_string()).unwrap_or_default(),
            poster_image: movie.poster_image.clone().unwrap_or_default(),
        }
    }

    pub fn to_draft(&self) -> Result<MovieDraft, FieldErrors> {
        let mut errors = FieldErrors::default();

        let title = self.title.trim();
        if title.is_empty() {
            errors.title = Some("Title is required".to_string());
        } else if title.chars().count() > TITLE_MAX_CHARS {
            errors.title = Some(format!("Title must be at most {TITLE_MAX_CHARS} characters"));
        }

        // known labels are normalized, anything else is kept as given
        let genre = non_blank(&self.genre).map(|raw| match Genre::from_label(raw) {
            Some(known) => known.label().to_string(),
            None => raw.to_string(),
        });

        let rating = match non_blank(&self.rating) {
            None => None,
            Some(raw) => match raw.parse::<u8>() {
                Ok(r) if (1..=5).contains(&r) => Some(r),
                _ => {
                    errors.rating = Some("Rating must be a whole number from 1 to 5".to_string());
                    None
                },
            },
        };

        let poster_image = non_blank(&self.poster_image);
        if let Some(url) = poster_image {
            if url.chars().count() > POSTER_MAX_CHARS {
                errors.poster_image =
                    Some(format!("Poster URL must be at most {POSTER_MAX_CHARS} characters"));
            } else if !is_web_url(url) {
                errors.poster_image = Some("Poster must be an http(s) URL".to_string());
            }
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(MovieDraft {
            title: title.to_string(),
            genre,
            rating,
            poster_image: poster_image.map(str::to_string),
        })
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn is_web_url(value: &str) -> bool {
    reqwest::Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}

// Offset-less date-times are read as UTC.
pub fn parse_server_time(raw: &str) -> Result<Timestamp, jiff::Error> {
    if let Ok(ts) = raw.parse::<Timestamp>() {
        return Ok(ts);
    }
    let dt: DateTime = raw.parse()?;
    Ok(dt.to_zoned(TimeZone::UTC)?.timestamp())
}

fn de_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Timestamp, D::Error> {
    let raw = String::deserialize(d)?;
    parse_server_time(&raw).map_err(serde::de::Error::custom)
}

fn de_opt_timestamp<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
    Option::<String>::deserialize(d)?
        .map(|raw| parse_server_time(&raw).map_err(serde::de::Error::custom))
        .transpose()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn form(title: &str, genre: &str, rating: &str, poster: &str) -> MovieForm {
        MovieForm {
            title: title.to_string(),
            genre: genre.to_string(),
            rating: rating.to_string(),
            poster_image: poster.to_string(),
        }
    }

    #[test]
    fn decodes_backend_movie() {
        let movie: Movie = serde_json::from_value(json!({
            "id": 7,
            "title": "Alien",
            "genre": "Sci-Fi",
            "rating": 5,
            "posterImage": null,
            "createdAt": "2024-03-01T10:15:00.1234567",
            "updatedAt": "2024-03-02T08:00:00Z"
        }))
        .unwrap();

        assert_eq!(movie.id, 7);
        assert_eq!(movie.genre.as_deref(), Some("Sci-Fi"));
        assert_eq!(movie.poster_image, None);
        assert_eq!(movie.created_at.as_second(), 1_709_288_100);
        assert_eq!(movie.updated_at.unwrap().as_second(), 1_709_366_400);
    }

    #[test]
    fn missing_optional_fields_decode_as_none() {
        let movie: Movie = serde_json::from_value(json!({
            "id": 1,
            "title": "Heat",
            "createdAt": "2024-01-01T00:00:00+02:00"
        }))
        .unwrap();
        assert_eq!(movie.rating, None);
        assert_eq!(movie.updated_at, None);
    }

    #[test]
    fn draft_omits_unset_fields() {
        let draft = MovieDraft { title: "Heat".to_string(), rating: Some(4), ..Default::default() };
        assert_eq!(serde_json::to_value(&draft).unwrap(), json!({"title": "Heat", "rating": 4}));
    }

    #[test]
    fn blank_optional_fields_become_absent() {
        let draft = form("  Heat  ", "   ", "", "  ").to_draft().unwrap();
        assert_eq!(
            draft,
            MovieDraft { title: "Heat".to_string(), ..Default::default() }
        );
    }

    #[test]
    fn genre_is_normalized_to_its_label() {
        let draft = form("Arrival", "sci-fi", "4", "https://img.example/a.jpg").to_draft().unwrap();
        assert_eq!(draft.genre.as_deref(), Some("Sci-Fi"));
        assert_eq!(draft.rating, Some(4));
        assert_eq!(draft.poster_image.as_deref(), Some("https://img.example/a.jpg"));
    }

    #[test]
    fn unlisted_genre_passes_through() {
        let draft = form("Unforgiven", " Western ", "", "").to_draft().unwrap();
        assert_eq!(draft.genre.as_deref(), Some("Western"));
    }

    #[test]
    fn rejects_out_of_range_fields() {
        let long_title = "x".repeat(TITLE_MAX_CHARS + 1);
        let errors = form(&long_title, "Western", "6", "not a url").to_draft().unwrap_err();
        assert!(errors.title.is_some());
        assert!(errors.rating.is_some());
        assert!(errors.poster_image.is_some());

        let errors = form("", "", "0", "").to_draft().unwrap_err();
        assert_eq!(errors.title.as_deref(), Some("Title is required"));
        assert!(errors.rating.is_some());
    }

    #[test]
    fn title_limit_counts_characters() {
        let title = "é".repeat(TITLE_MAX_CHARS);
        assert!(form(&title, "", "", "").to_draft().is_ok());
    }

    #[test]
    fn sort_option_maps_to_query_fields() {
        let sort = SortOption::parse("rating-desc");
        assert_eq!((sort.sort_by(), sort.sort_order()), ("rating", "desc"));
        assert_eq!(SortOption::parse(""), SortOption::TitleAsc);
        assert_eq!(SortOption::parse("bogus"), SortOption::TitleAsc);
    }

    #[test]
    fn list_query_skips_empty_values() {
        let query = ListQuery::new("", "Drama", SortOption::TitleAsc);
        assert_eq!(
            query.pairs(),
            vec![("genre", "Drama"), ("sortBy", "title"), ("sortOrder", "asc")]
        );
        assert!(ListQuery::default().pairs().is_empty());
    }

    #[test]
    fn filters_build_list_query() {
        let filters = ListFilters {
            search: "  ali ".to_string(),
            genre: String::new(),
            sort: "rating-desc".to_string(),
        };
        assert!(filters.is_filtered());
        assert_eq!(
            filters.list_query().pairs(),
            vec![("search", "ali"), ("sortBy", "rating"), ("sortOrder", "desc")]
        );
        assert!(!ListFilters::default().is_filtered());
    }
}
