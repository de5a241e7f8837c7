#![allow(dead_code)]

use moviesd::models::{Genre, NewMovie};
use serde_json::{Value, json};

pub fn arrival_payload() -> Value {
    json!({
        "title": "Arrival",
        "year": 2016,
        "director": "Denis Villeneuve",
        "duration": 116,
        "poster": "https://example.com/a.jpg",
        "genre": ["Sci-Fi", "Drama"]
    })
}

pub fn new_movie(title: &str, genre: &[Genre]) -> NewMovie {
    NewMovie {
        title: title.to_string(),
        year: 2010,
        director: "Christopher Nolan".to_string(),
        duration: 148,
        poster: "https://example.com/poster.jpg".to_string(),
        rate: 8.8,
        genre: genre.to_vec(),
    }
}
