use sea_orm_migration::{prelude::*, schema::*};

const GENRE_NAMES: [&str; 8] =
    ["Drama", "Action", "Crime", "Adventure", "Sci-Fi", "Romance", "Biography", "Fantasy"];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Movies::Id).binary_len(16).not_null().primary_key())
                    .col(string_len(Movies::Title, 255))
                    .col(integer(Movies::Year))
                    .col(string_len(Movies::Director, 255))
                    .col(integer(Movies::Duration))
                    .col(text(Movies::Poster))
                    .col(double(Movies::Rate).default(0.0))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_title")
                    .table(Movies::Table)
                    .col(Movies::Title)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genres::Table)
                    .if_not_exists()
                    .col(pk_auto(Genres::Id))
                    .col(string_len_uniq(Genres::Name, 255))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MovieGenres::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(MovieGenres::MovieId).binary_len(16).not_null())
                    .col(integer(MovieGenres::GenreId))
                    .col(integer(MovieGenres::Position))
                    .primary_key(
                        Index::create().col(MovieGenres::MovieId).col(MovieGenres::GenreId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_genres_movie")
                            .from(MovieGenres::Table, MovieGenres::MovieId)
                            .to(Movies::Table, Movies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_movie_genres_genre")
                            .from(MovieGenres::Table, MovieGenres::GenreId)
                            .to(Genres::Table, Genres::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movie_genres_genre")
                    .table(MovieGenres::Table)
                    .col(MovieGenres::GenreId)
                    .to_owned(),
            )
            .await?;

        let mut seed = Query::insert();
        seed.into_table(Genres::Table).columns([Genres::Name]);
        for name in GENRE_NAMES {
            seed.values_panic([name.into()]);
        }
        manager.exec_stmt(seed.to_owned()).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(MovieGenres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    Title,
    Year,
    Director,
    Duration,
    Poster,
    Rate,
}

#[derive(DeriveIden)]
enum Genres {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum MovieGenres {
    Table,
    MovieId,
    GenreId,
    Position,
}
