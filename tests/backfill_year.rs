
use eistedmigrate::ensure_current_year_registrations;
use rusqlite::Connection;
use test_support::{count, open_test_db, text};

/// Source data: edition 2024 with three competitions and five registrations.
/// Competition '99' lives in 2023, so 2024 registrations pointing at it have
/// no clone to follow.
fn seed_source_year(conn: &Connection) {
    conn.execute_batch(
        "INSERT INTO edition (year) VALUES (2023), (2024);
         INSERT INTO category (id, name) VALUES (1, 'Canto Individual');
         INSERT INTO competition (id, category_id, description, language, year, type, rank, preliminary)
         VALUES
            ('10', 1, 'Solo under 25', 'English', 2024, 'IND', 1, '0'),
            ('11', 1, 'Group dance', 'Welsh', 2024, 'GRU', 2, '0'),
            ('12', 1, 'Recitation', NULL, 2024, 'IND', 3, '1'),
            ('99', 1, 'Retired event', 'Spanish', 2023, 'IND', 1, '0');
         INSERT INTO participant (id, name, type) VALUES
            (1, 'Ana', 'IND'), (2, 'Côr Trelew', 'GRU');
         INSERT INTO registration (id, participant_id, competition_id, pseudonym, registered_at, year, dropped)
         VALUES
            (1, 1, '10', 'Seudo', '2024-06-10', 2024, 0),
            (2, 2, '11', NULL, '2024-07-01', 2024, 0),
            (3, 1, '11', NULL, 'soon', 2024, 1),
            (4, 2, '12', NULL, NULL, 2024, 0),
            (5, 1, '99', NULL, '2024-08-15', 2024, 0);",
    )
    .expect("seed source year");
}

#[test]
fn backfill_clones_the_latest_prior_year() {
    let conn = open_test_db("eisted-backfill");
    seed_source_year(&conn);

    let report = ensure_current_year_registrations(&conn, 2025).expect("backfill");

    assert_eq!(report.source_year, Some(2024));
    assert_eq!(report.competitions_cloned, 3);
    assert_eq!(report.registrations_cloned, 4);
    assert_eq!(report.registrations_skipped, 1);

    // Cloned competitions carry the derived id and the new year.
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM competition WHERE year = 2025"),
        3
    );
    assert_eq!(
        text(&conn, "SELECT description FROM competition WHERE id = '2025-10'").as_deref(),
        Some("Solo under 25")
    );
    assert_eq!(
        text(&conn, "SELECT language FROM competition WHERE id = '2025-11'").as_deref(),
        Some("Welsh")
    );
    // The retired 2023 competition is not cloned.
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM competition WHERE id = '2025-99'"),
        0
    );

    // Dates keep month and day; malformed and missing dates get mid-January.
    assert_eq!(
        text(
            &conn,
            "SELECT registered_at FROM registration WHERE year = 2025 AND competition_id = '2025-10'"
        )
        .as_deref(),
        Some("2025-06-10")
    );
    assert_eq!(
        count(
            &conn,
            "SELECT COUNT(*) FROM registration WHERE year = 2025 AND registered_at = '2025-01-15'"
        ),
        2
    );
    // The dropped flag rides along.
    assert_eq!(
        count(
            &conn,
            "SELECT COUNT(*) FROM registration WHERE year = 2025 AND dropped = 1"
        ),
        1
    );
}

#[test]
fn backfill_twice_changes_nothing() {
    let conn = open_test_db("eisted-backfill-idem");
    seed_source_year(&conn);

    ensure_current_year_registrations(&conn, 2025).expect("first run");
    let second = ensure_current_year_registrations(&conn, 2025).expect("second run");

    assert_eq!(second.competitions_cloned, 0);
    assert_eq!(second.registrations_cloned, 0);
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM registration WHERE year = 2025"),
        4
    );
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM competition WHERE year = 2025"),
        3
    );
}

#[test]
fn backfill_is_a_no_op_when_the_year_already_has_registrations() {
    let conn = open_test_db("eisted-backfill-guard");
    seed_source_year(&conn);
    conn.execute_batch(
        "INSERT INTO edition (year) VALUES (2025);
         INSERT INTO competition (id, category_id, description, year, type) VALUES ('50', 1, 'Fresh', 2025, 'IND');
         INSERT INTO registration (participant_id, competition_id, registered_at, year) VALUES (1, '50', '2025-02-01', 2025);",
    )
    .expect("organic current-year data");

    let report = ensure_current_year_registrations(&conn, 2025).expect("backfill");

    assert_eq!(report.competitions_cloned, 0);
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM competition WHERE year = 2025"),
        1
    );
}

#[test]
fn backfill_without_prior_data_creates_a_bare_edition() {
    let conn = open_test_db("eisted-backfill-empty");

    let report = ensure_current_year_registrations(&conn, 2025).expect("backfill");

    assert_eq!(report.source_year, None);
    assert_eq!(report.competitions_cloned, 0);
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM edition WHERE year = 2025"),
        1
    );
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM registration"), 0);
}

#[test]
fn backfill_warns_when_the_source_year_has_no_competitions() {
    let conn = open_test_db("eisted-backfill-no-comps");
    conn.execute_batch(
        "INSERT INTO edition (year) VALUES (2023), (2024);
         INSERT INTO category (id, name) VALUES (1, 'Canto Individual');
         INSERT INTO competition (id, category_id, description, year, type) VALUES ('10', 1, 'Solo', 2024, 'IND');
         INSERT INTO participant (id, name, type) VALUES (1, 'Ana', 'IND');
         INSERT INTO registration (participant_id, competition_id, registered_at, year) VALUES (1, '10', '2023-03-01', 2023);",
    )
    .expect("seed");

    // Registrations select 2023 as the source year, but 2023 has no
    // competitions of its own: nothing is cloned.
    let report = ensure_current_year_registrations(&conn, 2025).expect("backfill");

    assert_eq!(report.source_year, Some(2023));
    assert_eq!(report.competitions_cloned, 0);
    assert_eq!(report.registrations_cloned, 0);
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM registration WHERE year = 2025"),
        0
    );
}
