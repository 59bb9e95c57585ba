use maud::{DOCTYPE, Markup, html};

use crate::models::{
    FieldErrors, Genre, ListFilters, Movie, MovieForm, POSTER_MAX_CHARS, SortOption,
    TITLE_MAX_CHARS,
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";
const DATASTAR_CDN: &str =
    "https://cdn.jsdelivr.net/npm/@sudodevnull/datastar@0.19.9/dist/datastar.js";
const POSTER_PLACEHOLDER: &str = "https://via.placeholder.com/400x600?text=No+Poster";

const REFRESH_RESULTS: &str = "$seq++; @get('/movies/results?view=' + $view + '&seq=' + $seq \
     + '&search=' + encodeURIComponent($search) + '&genre=' + encodeURIComponent($genre) \
     + '&sort=' + $sort)";

pub const LIST_FAILED: &str = "Failed to load movies. Please try again.";

pub enum Listing {
    Movies(Vec<Movie>),
    Failed,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FormMode {
    Create,
    Edit(i64),
}

impl FormMode {
    fn heading(self) -> &'static str {
        match self {
            FormMode::Create => "Add New Movie",
            FormMode::Edit(_) => "Edit Movie",
        }
    }

    fn action(self) -> String {
        match self {
            FormMode::Create => "/create".to_string(),
            FormMode::Edit(id) => format!("/edit/{id}"),
        }
    }

    fn submit_label(self) -> &'static str {
        match self {
            FormMode::Create => "Add Movie",
            FormMode::Edit(_) => "Save Changes",
        }
    }
}

pub fn index_page(
    filters: &ListFilters,
    view_id: &str,
    listing: &Listing,
    notice: Option<&str>,
) -> String {
    let signals = serde_json::json!({
        "view": view_id,
        "seq": 0,
        "search": filters.search,
        "genre": filters.genre,
        "sort": filters.sort_option().value(),
    })
    .to_string();
    let sort = filters.sort_option();

    page(
        "Movie Management",
        html! {
            div class="min-h-screen bg-gradient-to-br from-purple-50 via-pink-50 to-red-50" {
                div class="max-w-7xl mx-auto px-4 py-8" data-signals=(signals) {
                    div class="text-center mb-8" {
                        h1 class="text-4xl font-bold text-gray-900 mb-3" { "Movie Management" }
                        p class="text-gray-600" { "Manage your watchlist - Add, edit, search, and organize your movies" }
                    }

                    @if let Some(notice) = notice {
                        div class="bg-yellow-50 border border-yellow-200 text-yellow-800 px-4 py-3 rounded-lg mb-6" role="alert" {
                            (notice)
                        }
                    }

                    form class="bg-white rounded-2xl shadow-lg p-4 mb-8 grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-5 gap-3" method="get" action="/" {
                        input class="px-4 py-2.5 border border-gray-300 rounded-lg" type="text" name="search" placeholder="Search by title..." value=(filters.search) data-bind-search data-on-input=(REFRESH_RESULTS);

                        select class="px-4 py-2.5 border border-gray-300 rounded-lg bg-white" name="genre" data-bind-genre data-on-change=(REFRESH_RESULTS) {
                            option value="" selected[filters.genre.is_empty()] { "All Genres" }
                            @for genre in Genre::ALL {
                                option value=(genre.label()) selected[filters.genre == genre.label()] { (genre.label()) }
                            }
                        }

                        select class="px-4 py-2.5 border border-gray-300 rounded-lg bg-white" name="sort" data-bind-sort data-on-change=(REFRESH_RESULTS) {
                            @for option in SortOption::ALL {
                                option value=(option.value()) selected[option == sort] { (option.label()) }
                            }
                        }

                        button class="px-4 py-2.5 bg-gray-200 text-gray-800 rounded-lg font-semibold" type="submit" { "Apply" }

                        a class="px-4 py-2.5 bg-gradient-to-r from-purple-600 to-pink-600 text-white rounded-lg font-semibold text-center" href="/create" {
                            "Add New Movie"
                        }
                    }

                    (results_markup(filters, listing))
                }
            }
        },
    )
}

pub fn results_fragment(filters: &ListFilters, listing: &Listing) -> String {
    results_markup(filters, listing).into_string()
}

pub fn movie_form_page(
    mode: FormMode,
    form: &MovieForm,
    errors: &FieldErrors,
    alert: Option<&str>,
) -> String {
    page(
        mode.heading(),
        html! {
            div class="min-h-screen bg-gradient-to-br from-purple-50 via-pink-50 to-red-50 py-8" {
                div class="max-w-2xl mx-auto px-4" {
                    a class="text-purple-600 hover:text-purple-700 font-medium" href="/" { "← Back to Movies" }

                    div class="mt-6 bg-white rounded-2xl shadow-xl p-6" {
                        h1 class="text-2xl font-bold mb-6 text-gray-800" { (mode.heading()) }

                        @if let Some(alert) = alert {
                            div class="bg-red-50 border border-red-200 text-red-700 px-4 py-3 rounded-lg mb-6" role="alert" {
                                (alert)
                            }
                        }

                        form class="space-y-6" method="post" action=(mode.action()) {
                            div {
                                label class="block text-sm font-semibold text-gray-700 mb-2" for="title" {
                                    "Title " span class="text-red-500" { "*" }
                                }
                                input class="w-full px-4 py-2.5 border border-gray-300 rounded-lg" type="text" id="title" name="title" required maxlength=(TITLE_MAX_CHARS) value=(form.title);
                                p class="mt-1 text-xs text-gray-500" { (form.title.chars().count()) "/" (TITLE_MAX_CHARS) " characters" }
                                (field_error(errors.title.as_deref()))
                            }

                            div {
                                label class="block text-sm font-semibold text-gray-700 mb-2" for="genre" { "Genre (Optional)" }
                                @let stored = form.genre.trim();
                                @let known = Genre::from_label(stored);
                                select class="w-full px-4 py-2.5 border border-gray-300 rounded-lg bg-white" id="genre" name="genre" {
                                    option value="" selected[stored.is_empty()] { "Select a genre" }
                                    @for genre in Genre::ALL {
                                        option value=(genre.label()) selected[known == Some(genre)] { (genre.label()) }
                                    }
                                    // genres outside the list are kept as they are
                                    @if !stored.is_empty() && known.is_none() {
                                        option value=(stored) selected { (stored) }
                                    }
                                }
                            }

                            div {
                                label class="block text-sm font-semibold text-gray-700 mb-2" for="rating" { "Rating (Optional, 1-5 stars)" }
                                select class="w-full px-4 py-2.5 border border-gray-300 rounded-lg bg-white" id="rating" name="rating" {
                                    option value="" selected[form.rating.trim().is_empty()] { "No rating" }
                                    @for value in 1u8..=5 {
                                        option value=(value) selected[form.rating.trim() == value.to_string()] {
                                            (stars_text(value)) " (" (value) "/5)"
                                        }
                                    }
                                }
                                (field_error(errors.rating.as_deref()))
                            }

                            div {
                                label class="block text-sm font-semibold text-gray-700 mb-2" for="poster_image" { "Poster Image URL (Optional)" }
                                input class="w-full px-4 py-2.5 border border-gray-300 rounded-lg" type="url" id="poster_image" name="poster_image" maxlength=(POSTER_MAX_CHARS) value=(form.poster_image);
                                (field_error(errors.poster_image.as_deref()))
                                @if !form.poster_image.trim().is_empty() {
                                    img class="mt-3 w-full max-w-sm h-64 object-cover rounded-lg border border-gray-200 mx-auto" src=(form.poster_image.trim()) alt="Preview" onerror="this.style.display='none'";
                                }
                            }

                            div class="flex flex-col sm:flex-row gap-3 pt-4" {
                                button class="w-full sm:flex-1 px-6 py-2.5 bg-gradient-to-r from-purple-600 to-pink-600 text-white rounded-lg font-semibold" type="submit" {
                                    (mode.submit_label())
                                }
                                a class="w-full sm:flex-1 px-6 py-2.5 bg-gray-300 text-gray-700 rounded-lg font-semibold text-center" href="/" { "Cancel" }
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn error_page(message: String) -> String {
    page(
        "Error",
        html! {
            div class="min-h-screen bg-gray-50 flex items-center justify-center" {
                div class="max-w-xl w-full px-6" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-2xl font-bold text-gray-900" { "Error" }
                        p class="mt-4 text-gray-700" { (message) }
                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Back" }
                    }
                }
            }
        },
    )
}

fn page(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
                script type="module" src=(DATASTAR_CDN) {}
            }
            body { (body) }
        }
    }
    .into_string()
}

fn results_markup(filters: &ListFilters, listing: &Listing) -> Markup {
    html! {
        div id="results" {
            @match listing {
                Listing::Failed => {
                    div class="bg-red-50 border border-red-200 text-red-700 px-4 py-3 rounded-lg" role="alert" {
                        (LIST_FAILED)
                    }
                }
                Listing::Movies(movies) => {
                    @if movies.is_empty() {
                        div class="text-center py-16 bg-white rounded-2xl shadow-lg" {
                            @if filters.is_filtered() {
                                p class="text-lg text-gray-600 mb-2" { "No movies found" }
                                p class="text-sm text-gray-500" { "Try adjusting your filters" }
                            } @else {
                                p class="text-lg text-gray-600 mb-2" { "No movies yet" }
                                p class="text-sm text-gray-500" { "Add your first movie to get started" }
                            }
                        }
                    } @else {
                        div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-3 xl:grid-cols-4 gap-6" {
                            @for movie in movies {
                                (movie_card(movie))
                            }
                        }
                    }
                }
            }
        }
    }
}

fn movie_card(movie: &Movie) -> Markup {
    let confirm = serde_json::to_string(&format!(
        "Are you sure you want to delete \"{}\"?",
        movie.title
    ))
    .unwrap_or_else(|_| "\"Delete this movie?\"".to_string());

    html! {
        div class="bg-white rounded-2xl shadow-lg overflow-hidden" {
            @if let Some(poster) = movie.poster_image.as_deref().filter(|p| !p.is_empty()) {
                div class="relative h-64 overflow-hidden bg-gray-100" {
                    img class="w-full h-full object-cover" src=(poster) alt=(movie.title) onerror=(format!("this.src='{POSTER_PLACEHOLDER}'"));
                }
            } @else {
                div class="h-64 bg-gradient-to-br from-gray-100 to-gray-200" {}
            }

            div class="p-4" {
                h3 class="text-lg font-bold mb-2 text-gray-800 line-clamp-2" { (movie.title) }

                @if let Some(genre) = movie.genre.as_deref().filter(|g| !g.is_empty()) {
                    span class="inline-block mb-3 px-3 py-1 bg-purple-100 text-purple-700 rounded-full text-xs font-medium" { (genre) }
                }

                div class="mb-3" { (rating_markup(movie.rating)) }

                div class="text-xs text-gray-400 mb-4" {
                    "Added " (format_date(movie.created_at))
                    @if let Some(updated) = movie.updated_at {
                        " · updated " (format_date(updated))
                    }
                }

                div class="flex gap-2" {
                    a class="flex-1 px-3 py-2 bg-yellow-500 text-white rounded-lg text-center font-medium" href=(format!("/edit/{}", movie.id)) { "Edit" }
                    form class="flex-1" method="post" action=(format!("/movies/{}/delete", movie.id)) onsubmit=(format!("return confirm({confirm})")) {
                        button class="w-full px-3 py-2 bg-red-500 text-white rounded-lg font-medium" type="submit" { "Delete" }
                    }
                }
            }
        }
    }
}

fn rating_markup(rating: Option<u8>) -> Markup {
    html! {
        @match rating.filter(|r| *r > 0) {
            None => {
                span class="text-gray-400 text-sm" { "No rating" }
            }
            Some(rating) => {
                span class="text-yellow-400 text-lg" { (stars_text(rating)) }
                span class="ml-1 text-sm text-gray-600" { "(" (rating) "/5)" }
            }
        }
    }
}

fn format_date(ts: jiff::Timestamp) -> String {
    ts.strftime("%b %d, %Y").to_string()
}

fn stars_text(rating: u8) -> String {
    let filled = usize::from(rating.min(5));
    format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
}

fn field_error(message: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = message {
            p class="mt-1 text-sm text-red-600" { (message) }
        }
    }
}
