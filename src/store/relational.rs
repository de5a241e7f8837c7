use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, JoinType, NotSet,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait, Unchanged,
    sea_query::LikeExpr,
};
use tracing::debug;

use super::MovieStore;
use crate::{
    entities::{genre, movie, movie_genre},
    error::{StoreError, StoreResult},
    identifier::{BinaryUuidIds, IdScheme},
    models::{Genre, Movie, MoviePatch, NewMovie, UnknownGenre},
};

/// Movies in a relational database with genres normalized into `genres` and
/// `movie_genres`. Binary keys never leave this type.
#[derive(Clone)]
pub struct RelationalStore {
    db: DatabaseConnection,
    ids: BinaryUuidIds,
}

impl RelationalStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db, ids: BinaryUuidIds }
    }

    async fn find_one<C: ConnectionTrait>(&self, conn: &C, key: &[u8]) -> StoreResult<Option<Movie>> {
        let Some(row) = movie::Entity::find_by_id(key.to_vec()).one(conn).await? else {
            return Ok(None);
        };
        Ok(self.denormalize(conn, vec![row]).await?.pop())
    }

    /// Attaches each movie's genre names, in stored position order.
    async fn denormalize<C: ConnectionTrait>(
        &self,
        conn: &C,
        rows: Vec<movie::Model>,
    ) -> StoreResult<Vec<Movie>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let keys: Vec<Vec<u8>> = rows.iter().map(|m| m.id.clone()).collect();
        let links = movie_genre::Entity::find()
            .filter(movie_genre::Column::MovieId.is_in(keys))
            .order_by_asc(movie_genre::Column::Position)
            .find_also_related(genre::Entity)
            .all(conn)
            .await?;

        let mut genres: HashMap<Vec<u8>, Vec<Genre>> = HashMap::new();
        for (link, row) in links {
            let Some(row) = row else {
                return Err(StoreError::Corrupt(format!("dangling genre id {}", link.genre_id)));
            };
            let genre: Genre =
                row.name.parse().map_err(|e: UnknownGenre| StoreError::Corrupt(e.to_string()))?;
            genres.entry(link.movie_id).or_default().push(genre);
        }

        rows.into_iter()
            .map(|row| {
                let genre = genres.remove(&row.id).unwrap_or_default();
                self.assemble(row, genre)
            })
            .collect()
    }

    fn assemble(&self, row: movie::Model, genre: Vec<Genre>) -> StoreResult<Movie> {
        let id = self
            .ids
            .decode(&row.id)
            .ok_or_else(|| StoreError::Corrupt(format!("movie key of {} bytes", row.id.len())))?;
        if genre.is_empty() {
            return Err(StoreError::Corrupt(format!("movie {id} has no genres")));
        }
        Ok(Movie {
            id,
            title: row.title,
            year: row.year,
            director: row.director,
            duration: row.duration,
            poster: row.poster,
            rate: row.rate,
            genre,
        })
    }

    async fn link_genres<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: &[u8],
        genres: &[Genre],
    ) -> StoreResult<()> {
        for (position, genre) in genres.iter().enumerate() {
            let genre_id = genre_id(conn, *genre).await?;
            let link = movie_genre::ActiveModel {
                movie_id: Set(key.to_vec()),
                genre_id: Set(genre_id),
                position: Set(position as i32),
            };
            movie_genre::Entity::insert(link).exec_without_returning(conn).await?;
        }
        Ok(())
    }
}

async fn genre_id<C: ConnectionTrait>(conn: &C, genre: Genre) -> StoreResult<i32> {
    if let Some(row) =
        genre::Entity::find().filter(genre::Column::Name.eq(genre.as_str())).one(conn).await?
    {
        return Ok(row.id);
    }

    let row = genre::ActiveModel { id: NotSet, name: Set(genre.as_str().to_string()) };
    Ok(genre::Entity::insert(row).exec(conn).await?.last_insert_id)
}

fn like_pattern(token: &str) -> String {
    let mut out = String::with_capacity(token.len() + 2);
    out.push('%');
    for c in token.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

#[async_trait]
impl MovieStore for RelationalStore {
    async fn list_all(&self) -> StoreResult<Vec<Movie>> {
        let rows = movie::Entity::find()
            .order_by_asc(movie::Column::Title)
            .order_by_asc(movie::Column::Id)
            .all(&self.db)
            .await?;
        self.denormalize(&self.db, rows).await
    }

    async fn list_by_genre(&self, genre: &str) -> StoreResult<Vec<Movie>> {
        let links = movie_genre::Entity::find()
            .join(JoinType::InnerJoin, movie_genre::Relation::Genre.def())
            .filter(genre::Column::Name.like(LikeExpr::new(like_pattern(genre)).escape('\\')))
            .all(&self.db)
            .await?;

        let keys: HashSet<Vec<u8>> = links.into_iter().map(|l| l.movie_id).collect();
        debug!(genre = %genre, matches = keys.len(), "genre join");
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let rows = movie::Entity::find()
            .filter(movie::Column::Id.is_in(keys))
            .order_by_asc(movie::Column::Title)
            .order_by_asc(movie::Column::Id)
            .all(&self.db)
            .await?;
        self.denormalize(&self.db, rows).await
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Option<Movie>> {
        let Some(key) = self.ids.from_external(id) else {
            return Ok(None);
        };
        self.find_one(&self.db, &key).await
    }

    async fn create(&self, movie: NewMovie) -> StoreResult<Movie> {
        let key = self.ids.generate();
        let row = movie::ActiveModel {
            id: Set(key.to_vec()),
            title: Set(movie.title.clone()),
            year: Set(movie.year),
            director: Set(movie.director.clone()),
            duration: Set(movie.duration),
            poster: Set(movie.poster.clone()),
            rate: Set(movie.rate),
        };

        let txn = self.db.begin().await?;
        movie::Entity::insert(row).exec_without_returning(&txn).await?;
        self.link_genres(&txn, &key, &movie.genre).await?;
        txn.commit().await?;

        let id = self.ids.to_external(&key);
        debug!(id = %id, "inserted movie row");
        Ok(movie.with_id(id))
    }

    async fn update(&self, id: &str, patch: &MoviePatch) -> StoreResult<Option<Movie>> {
        let Some(key) = self.ids.from_external(id) else {
            return Ok(None);
        };

        let txn = self.db.begin().await?;
        let Some(mut current) = self.find_one(&txn, &key).await? else {
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(current));
        }
        current.apply(patch);

        let row = movie::ActiveModel {
            id: Unchanged(key.to_vec()),
            title: Set(current.title.clone()),
            year: Set(current.year),
            director: Set(current.director.clone()),
            duration: Set(current.duration),
            poster: Set(current.poster.clone()),
            rate: Set(current.rate),
        };
        row.update(&txn).await?;

        if let Some(genres) = &patch.genre {
            movie_genre::Entity::delete_many()
                .filter(movie_genre::Column::MovieId.eq(key.to_vec()))
                .exec(&txn)
                .await?;
            self.link_genres(&txn, &key, genres).await?;
        }
        txn.commit().await?;

        Ok(Some(current))
    }

    async fn delete(&self, id: &str) -> StoreResult<Option<Movie>> {
        let Some(key) = self.ids.from_external(id) else {
            return Ok(None);
        };

        let txn = self.db.begin().await?;
        let Some(existing) = self.find_one(&txn, &key).await? else {
            return Ok(None);
        };
        movie_genre::Entity::delete_many()
            .filter(movie_genre::Column::MovieId.eq(key.to_vec()))
            .exec(&txn)
            .await?;
        movie::Entity::delete_by_id(key.to_vec()).exec(&txn).await?;
        txn.commit().await?;

        Ok(Some(existing))
    }
}
