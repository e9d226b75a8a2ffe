mod common;
use common::{FakeSource, page, setup_store, tmdb_detail, tmdb_listing_item};

use movie_data_ingestor::models::movie::ExternalIdKind;
use movie_sync::pipeline::{Pipeline, RunParams, SkipReason, refresh_details};
use rust_decimal_macros::dec;

#[tokio::test]
async fn refresh_applies_details_to_stored_movies() {
    let (_db, mut store) = setup_store();
    let fake = FakeSource::new();
    fake.push_listing(
        1,
        page(
            1,
            1,
            vec![
                tmdb_listing_item(550, "Fight Club", "1999-10-15"),
                tmdb_listing_item(77, "Missing", "2000-01-01"),
                tmdb_listing_item(401, "Locked", "2000-01-01"),
            ],
        ),
    );
    fake.with_detail("550", tmdb_detail(550, "Fight Club", 20_000_000, 80_000_000));
    let governor = fake.governor();

    let run = Pipeline::new(&mut store, fake.governor())
        .run(&RunParams::new(1).unwrap())
        .await;
    assert_eq!(run.created, 3);

    let report = refresh_details(&mut store, &governor, None).await.unwrap();
    assert_eq!(report.refreshed, 1);
    assert_eq!(report.unchanged, 0);
    assert_eq!(report.aborted, None);
    let reasons: Vec<SkipReason> = report.skipped.iter().map(|(_, r, _)| *r).collect();
    assert_eq!(reasons, [SkipReason::NotFound, SkipReason::DetailFetch]);

    let movie_id = store.find_by_external_id(ExternalIdKind::Tmdb, "550").unwrap().unwrap();
    let movie = store.get_movie(movie_id).unwrap().unwrap();
    assert_eq!(movie.roi_percent, Some(dec!(300.00)));
    assert!(movie.external_ids.contains_key(&ExternalIdKind::Imdb));

    let again = refresh_details(&mut store, &governor, Some(1)).await.unwrap();
    assert_eq!((again.refreshed, again.unchanged), (0, 1));
}

#[tokio::test(start_paused = true)]
async fn refresh_stops_when_rate_limits_persist() {
    let (_db, mut store) = setup_store();
    let fake = FakeSource::new();
    fake.push_listing(
        1,
        page(
            1,
            1,
            vec![
                tmdb_listing_item(429, "Throttled", "2015-05-01"),
                tmdb_listing_item(550, "Fight Club", "1999-10-15"),
            ],
        ),
    );
    fake.with_detail("550", tmdb_detail(550, "Fight Club", 20_000_000, 80_000_000));
    Pipeline::new(&mut store, fake.governor())
        .run(&RunParams::new(1).unwrap())
        .await;

    let report = refresh_details(&mut store, &fake.governor(), None).await.unwrap();
    assert_eq!(report.refreshed, 0);
    assert!(report.aborted.as_deref().is_some_and(|r| r.contains("rate limiting")));
    // The throttled movie comes first; nothing after it is visited.
    let details: Vec<_> = fake.calls().into_iter().filter(|c| c.starts_with("detail:")).collect();
    assert_eq!(details, ["detail:429", "detail:429"]);
}
