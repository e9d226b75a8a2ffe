mod common;
use common::{assert_sqlite_pragmas, fk_check_empty, setup_db};

use diesel::QueryableByName;
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{Integer, Text};
use movie_sync::db::{connection::connect_sqlite, migrate};
use std::thread::sleep;
use std::time::Duration;

#[derive(QueryableByName)]
struct TblCnt {
    #[diesel(sql_type = Integer)]
    cnt: i32,
}
#[derive(QueryableByName)]
struct TimeStr {
    #[diesel(sql_type = Text)]
    t: String,
}

fn insert_external_id(
    conn: &mut SqliteConnection,
    movie_id: i32,
    provider: &str,
    external_id: &str,
) -> QueryResult<usize> {
    sql_query("INSERT INTO movie_external_ids (movie_id, provider, external_id) VALUES (?, ?, ?);")
        .bind::<Integer, _>(movie_id)
        .bind::<Text, _>(provider)
        .bind::<Text, _>(external_id)
        .execute(conn)
}

#[test]
fn migrations_apply_and_pragmas_are_set() {
    let (db, mut conn) = setup_db();
    assert_sqlite_pragmas(&mut conn);

    let tbls: TblCnt = sql_query(
        "SELECT COUNT(*) AS cnt
            FROM sqlite_master
            WHERE type='table'
            AND name IN (
                'movies','movie_external_ids','studios','genres','movie_genres','ratings'
            );",
    )
    .get_result(&mut conn)
    .unwrap();
    assert_eq!(tbls.cnt, 6, "expected six tables to be present");

    // A second connection gets the same PRAGMAs; re-running migrations is a no-op.
    let mut second = connect_sqlite(&db.path).expect("connect second");
    assert_sqlite_pragmas(&mut second);
    migrate::run_sqlite(&db.path).expect("second migration run");
}

#[test]
fn updated_at_moves_on_update() {
    let (_db, mut conn) = setup_db();

    sql_query("INSERT INTO movies (title, release_date) VALUES ('Inception', '2010-07-15');")
        .execute(&mut conn)
        .unwrap();
    let before: TimeStr = sql_query("SELECT updated_at AS t FROM movies LIMIT 1;")
        .get_result(&mut conn)
        .unwrap();

    sleep(Duration::from_millis(20));
    sql_query("UPDATE movies SET runtime_minutes = 148;")
        .execute(&mut conn)
        .unwrap();

    let after: TimeStr = sql_query("SELECT updated_at AS t FROM movies LIMIT 1;")
        .get_result(&mut conn)
        .unwrap();
    assert_ne!(before.t, after.t, "updated_at should change on UPDATE");
}

#[test]
fn roi_requires_budget_and_revenue() {
    let (_db, mut conn) = setup_db();

    let err = sql_query("INSERT INTO movies (title, budget, roi_percent) VALUES ('x', '100', '5');")
        .execute(&mut conn);
    assert!(err.is_err(), "ROI without revenue must be rejected");

    sql_query(
        "INSERT INTO movies (title, budget, revenue, roi_percent) VALUES ('x', '100', '105', '5');",
    )
    .execute(&mut conn)
    .unwrap();
}

#[test]
fn external_ids_are_unique_per_namespace() {
    let (_db, mut conn) = setup_db();
    sql_query("INSERT INTO movies (id, title) VALUES (1, 'a'), (2, 'b');")
        .execute(&mut conn)
        .unwrap();
    insert_external_id(&mut conn, 1, "tmdb", "27205").unwrap();

    let taken = insert_external_id(&mut conn, 2, "tmdb", "27205");
    assert!(taken.is_err(), "same id cannot belong to two movies");

    let second = insert_external_id(&mut conn, 1, "tmdb", "1");
    assert!(second.is_err(), "a movie has one id per namespace");

    let bad = insert_external_id(&mut conn, 2, "netflix", "9");
    assert!(bad.is_err());

    fk_check_empty(&mut conn);
}
