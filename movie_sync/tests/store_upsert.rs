mod common;
use common::{count, fk_check_empty, raw, setup_store, tmdb_detail, tmdb_listing_item};

use movie_data_ingestor::{
    models::{
        movie::{ExternalIdKind, NormalizedMovie, RatingSource},
        raw::{CatalogGenre, ProviderTag},
    },
    normalize::normalize,
};
use movie_sync::{
    metrics::PerformanceTier,
    store::{DetailOutcome, StoreError, UpsertOutcome},
};
use rust_decimal_macros::dec;
use serde_json::json;

fn tmdb(payload: serde_json::Value) -> NormalizedMovie {
    normalize(ProviderTag::Tmdb, &raw(payload)).expect("normalize")
}

#[test]
fn missing_release_date_is_rejected_for_new_movies() {
    let (_db, mut store) = setup_store();

    let undated = tmdb(tmdb_listing_item(42, "Undated", ""));
    assert!(undated.release_date.is_none());
    let err = store.upsert(&undated).unwrap_err();
    assert!(matches!(err, StoreError::MissingReleaseDate { .. }));
    assert_eq!(store.movie_count().unwrap(), 0);

    let dated = tmdb(tmdb_listing_item(42, "Undated", "2001-01-01"));
    assert!(store.upsert(&dated).unwrap().created());
    assert_eq!(store.movie_count().unwrap(), 1);
}

#[test]
fn create_stores_everything_and_derives_roi() {
    let (_db, mut store) = setup_store();
    let outcome = store
        .upsert(&tmdb(tmdb_detail(27205, "Inception", 160_000_000, 825_532_764)))
        .unwrap();
    let UpsertOutcome::Created { movie_id } = outcome else {
        panic!("expected a new movie, got {outcome:?}");
    };

    let movie = store.get_movie(movie_id).unwrap().expect("stored");
    assert_eq!(movie.title, "Inception");
    assert_eq!(movie.budget, Some(dec!(160000000)));
    assert_eq!(movie.roi_percent, Some(dec!(415.96)));
    assert_eq!(movie.performance_tier(), PerformanceTier::Excellent);
    assert_eq!(movie.is_profitable(), Some(true));
    assert_eq!(movie.studio.as_ref().map(|s| s.name.as_str()), Some("Legendary Pictures"));
    let genre_names: Vec<&str> = movie.genres.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(genre_names, ["Action", "Science Fiction"]);
    let imdb = movie.external_ids.get(&ExternalIdKind::Imdb);
    assert_eq!(imdb.map(String::as_str), Some("tt0027205"));
    assert_eq!(movie.rating(RatingSource::Tmdb).map(|r| r.value), Some(dec!(8.4)));
}

#[test]
fn matching_record_is_left_untouched() {
    let (_db, mut store) = setup_store();
    let first = store
        .upsert(&tmdb(tmdb_detail(27205, "Inception", 160_000_000, 825_532_764)))
        .unwrap();

    // Same TMDb id, different money: the create path never overwrites.
    let again = store
        .upsert(&tmdb(tmdb_detail(27205, "Inception (re-release)", 1, 2)))
        .unwrap();
    assert_eq!(again, UpsertOutcome::Unchanged { movie_id: first.movie_id() });

    let movie = store.get_movie(first.movie_id()).unwrap().unwrap();
    assert_eq!(movie.title, "Inception");
    assert_eq!(movie.revenue, Some(dec!(825532764)));
    assert_eq!(count(store.conn(), "ratings"), 1);
}

#[test]
fn secondary_namespace_matches_existing_movie() {
    let (_db, mut store) = setup_store();
    let first = store
        .upsert(&tmdb(tmdb_detail(27205, "Inception", 160_000_000, 825_532_764)))
        .unwrap();

    let omdb = normalize(
        ProviderTag::Omdb,
        &movie_data_ingestor::models::raw::RawItem::new(
            ProviderTag::Omdb,
            json!({
                "imdbID": "tt0027205",
                "Title": "Inception",
                "Released": "16 Jul 2010",
                "Response": "True"
            }),
        ),
    )
    .unwrap();

    assert_eq!(store.find_match(&omdb).unwrap(), Some(first.movie_id()));
    assert!(!store.upsert(&omdb).unwrap().created());
    assert_eq!(store.movie_count().unwrap(), 1);
}

#[test]
fn detail_update_sets_money_and_recomputes_roi() {
    let (_db, mut store) = setup_store();
    let movie_id = store
        .upsert(&tmdb(tmdb_listing_item(550, "Fight Club", "1999-10-15")))
        .unwrap()
        .movie_id();
    assert_eq!(store.get_movie(movie_id).unwrap().unwrap().roi_percent, None);

    let outcome = store
        .apply_detail(movie_id, &tmdb(tmdb_detail(550, "Fight Club", 20_000_000, 80_000_000)))
        .unwrap();
    assert_eq!(
        outcome,
        DetailOutcome::Updated {
            movie_id,
            roi_percent: Some(dec!(300.00))
        }
    );

    let movie = store.get_movie(movie_id).unwrap().unwrap();
    assert_eq!(movie.roi_percent.map(|r| r.to_string()), Some("300.00".to_string()));
    assert_eq!(movie.performance_tier(), PerformanceTier::Excellent);
    // Release date was already known and is not replaced.
    assert_eq!(movie.release_date.map(|d| d.to_string()), Some("1999-10-15".to_string()));
    assert_eq!(movie.external_ids.len(), 2);
    // One rating per source, updated in place.
    assert_eq!(movie.ratings.len(), 1);
    assert_eq!(movie.rating(RatingSource::Tmdb).and_then(|r| r.vote_count), Some(35000));

    let again = store
        .apply_detail(movie_id, &tmdb(tmdb_detail(550, "Fight Club", 20_000_000, 80_000_000)))
        .unwrap();
    assert_eq!(again, DetailOutcome::Unchanged { movie_id });
}

#[test]
fn descriptive_fields_only_fill_gaps() {
    let (_db, mut store) = setup_store();
    let mut listing = tmdb_listing_item(27205, "Inception", "2010-07-15");
    listing["original_title"] = json!("Inception");
    listing["overview"] = json!("A thief who steals secrets from dreams.");
    let movie_id = store.upsert(&tmdb(listing)).unwrap().movie_id();

    let omdb = normalize(
        ProviderTag::Omdb,
        &movie_data_ingestor::models::raw::RawItem::new(
            ProviderTag::Omdb,
            json!({
                "imdbID": "tt0027205",
                "Title": "Inception",
                "Rated": "PG-13",
                "Plot": "Cobb plants an idea.",
                "Response": "True"
            }),
        ),
    )
    .unwrap();
    assert!(matches!(store.apply_detail(movie_id, &omdb).unwrap(), DetailOutcome::Updated { .. }));

    let movie = store.get_movie(movie_id).unwrap().unwrap();
    assert_eq!(movie.content_rating.as_deref(), Some("PG-13"));
    assert_eq!(movie.overview.as_deref(), Some("A thief who steals secrets from dreams."));
    assert_eq!(movie.original_title.as_deref(), Some("Inception"));

    assert_eq!(store.apply_detail(movie_id, &omdb).unwrap(), DetailOutcome::Unchanged { movie_id });
}

#[test]
fn detail_for_unknown_movie_fails() {
    let (_db, mut store) = setup_store();
    let err = store
        .apply_detail(999, &tmdb(tmdb_detail(1, "Nope", 1, 1)))
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownMovie { movie_id: 999 }));
}

#[test]
fn seeded_genres_resolve_listing_ids() {
    let (_db, mut store) = setup_store();
    let catalog = vec![
        CatalogGenre {
            id: 28,
            name: "Action".into(),
        },
        CatalogGenre {
            id: 878,
            name: "Science Fiction".into(),
        },
    ];
    assert_eq!(store.seed_genres(&catalog).unwrap(), 2);
    assert_eq!(store.seed_genres(&catalog).unwrap(), 0);

    let movie_id = store
        .upsert(&tmdb(tmdb_listing_item(603, "The Matrix", "1999-03-31")))
        .unwrap()
        .movie_id();
    let movie = store.get_movie(movie_id).unwrap().unwrap();
    let names: Vec<&str> = movie.genres.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, ["Action", "Science Fiction"]);
}

#[test]
fn studios_are_shared_case_insensitively() {
    let (_db, mut store) = setup_store();
    let mut other = tmdb_detail(2, "Pacific Rim", 190_000_000, 411_000_000);
    other["production_companies"] =
        json!([{"name": "legendary  PICTURES", "origin_country": "US"}]);

    store.upsert(&tmdb(tmdb_detail(1, "Inception", 160_000_000, 825_532_764))).unwrap();
    store.upsert(&tmdb(other)).unwrap();

    assert_eq!(count(store.conn(), "studios"), 1);
}

#[test]
fn delete_removes_dependents_in_one_go() {
    let (_db, mut store) = setup_store();
    let keep = store
        .upsert(&tmdb(tmdb_detail(1, "Keep", 10, 20)))
        .unwrap()
        .movie_id();
    let gone = store
        .upsert(&tmdb(tmdb_detail(2, "Gone", 10, 20)))
        .unwrap()
        .movie_id();

    assert!(store.delete_movie(gone).unwrap());
    assert!(!store.delete_movie(gone).unwrap());

    assert!(store.get_movie(gone).unwrap().is_none());
    assert!(store.get_movie(keep).unwrap().is_some());
    let conn = store.conn();
    assert_eq!(count(conn, "ratings"), 1);
    assert_eq!(count(conn, "movie_external_ids"), 2);
    assert_eq!(count(conn, "movie_genres"), 2);
    // Lookups stay behind for other movies.
    assert_eq!(count(conn, "studios"), 1);
    fk_check_empty(conn);

    // The external id is free again.
    assert!(store.upsert(&tmdb(tmdb_detail(2, "Gone", 10, 20))).unwrap().created());
}
