//! Closed genre list for catalog entities
//!
//! Admin forms autocomplete against this list and the API rejects writes
//! naming a genre outside it.

/// All genres accepted on songs, albums, and artists.
pub const GENRES: &[&str] = &[
    "Afrobeat",
    "Afrobeats",
    "Alternative",
    "Alternative Rock",
    "Ambient",
    "Bhangra",
    "Bluegrass",
    "Blues",
    "Bollywood",
    "Chillwave",
    "Classical",
    "Contemporary R&B",
    "Country",
    "Cumbia",
    "Dancehall",
    "Disco",
    "Drum and Bass",
    "Dubstep",
    "Electro-pop",
    "Electronic",
    "Electronic Dance Music (EDM)",
    "Flamenco",
    "Folk",
    "Funk",
    "Garage",
    "Gospel",
    "Grime",
    "Hip-Hop",
    "Hip-Hop/Rap",
    "House",
    "Hyperpop",
    "Indie",
    "Industrial",
    "J-Pop",
    "Jazz",
    "K-Pop",
    "Latin",
    "Lo-fi",
    "Merengue",
    "Metal",
    "New Wave",
    "Opera",
    "Pop",
    "Punk",
    "R&B",
    "R&B/Soul",
    "Reggae",
    "Rock",
    "Salsa",
    "Ska",
    "Soul",
    "Soundtrack",
    "Sufi",
    "Synth-pop",
    "Techno",
    "Trance",
    "Trap",
    "Trap Soul",
    "Vaporwave",
    "World",
    "Zouk",
];

/// Exact-match check against the closed genre list.
pub fn is_valid_genre(genre: &str) -> bool {
    GENRES.contains(&genre)
}
