//! Voting events and records: open, cast, tally, end, cleanup.

use sqlx::PgPool;

use roster::errors::AppError;
use roster::models::meeting::MeetingType;
use roster::models::role::Role;
use roster::models::voting;

mod common;
use common::{insert_meeting, insert_user, seed_roles};

#[sqlx::test]
async fn test_vote_lifecycle(pool: PgPool) {
    let pool = &pool;
    seed_roles(pool).await;

    let chair = insert_user(pool, "chair", Role::Eboard).await;
    let p = insert_user(pool, "pat", Role::Member).await;
    let q = insert_user(pool, "quinn", Role::Member).await;
    let meeting_id = insert_meeting(pool, "Full Body", "2030-02-01", "18:00", MeetingType::FullBody).await;

    let event_id = voting::create_event(pool, meeting_id, "Approve budget", "YES_NO", chair)
        .await
        .expect("open");

    voting::cast(pool, event_id, p, "YES", p).await.expect("pat votes");
    voting::cast(pool, event_id, q, "NO", q).await.expect("quinn votes");
    voting::cast(pool, event_id, chair, "YES", chair).await.expect("chair votes");

    let counts = voting::tally(pool, event_id).await.expect("tally");
    assert_eq!(counts.len(), 2);
    assert_eq!((counts[0].result.as_str(), counts[0].count), ("YES", 2));
    assert_eq!((counts[1].result.as_str(), counts[1].count), ("NO", 1));

    let records = voting::find_records(pool, event_id).await.expect("records");
    assert_eq!(records.len(), 3);
    assert!(records.iter().any(|r| r.user_name == "pat"));

    voting::end_event(pool, event_id, chair).await.expect("end");
    let ended = voting::find_event_by_id(pool, event_id).await.expect("q").expect("event");
    assert!(!ended.is_open());
    assert_eq!(ended.updated_by, Some(chair));
}

#[sqlx::test]
async fn test_one_vote_per_user(pool: PgPool) {
    let pool = &pool;
    seed_roles(pool).await;

    let chair = insert_user(pool, "chair", Role::Eboard).await;
    let meeting_id = insert_meeting(pool, "M", "2030-02-01", "18:00", MeetingType::Regular).await;
    let event_id = voting::create_event(pool, meeting_id, "Q", "APPROVAL", chair).await.expect("open");

    voting::cast(pool, event_id, chair, "A", chair).await.expect("first");
    let again = voting::cast(pool, event_id, chair, "B", chair).await;
    assert!(matches!(
        again,
        Err(AppError::Conflict(ref msg)) if msg == "user has already voted in this event"
    ));
}

#[sqlx::test]
async fn test_ended_event_rejects_votes_and_second_end(pool: PgPool) {
    let pool = &pool;
    seed_roles(pool).await;

    let chair = insert_user(pool, "chair", Role::Eboard).await;
    let meeting_id = insert_meeting(pool, "M", "2030-02-01", "18:00", MeetingType::Regular).await;
    let event_id = voting::create_event(pool, meeting_id, "Q", "ROLL_CALL", chair).await.expect("open");
    voting::end_event(pool, event_id, chair).await.expect("end");

    assert!(matches!(
        voting::cast(pool, event_id, chair, "PRESENT", chair).await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        voting::end_event(pool, event_id, chair).await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        voting::end_event(pool, 31_337, chair).await,
        Err(AppError::NotFound(_))
    ));
}

#[sqlx::test]
async fn test_listing_hides_ended_events_by_default(pool: PgPool) {
    let pool = &pool;
    seed_roles(pool).await;

    let chair = insert_user(pool, "chair", Role::Eboard).await;
    let meeting_id = insert_meeting(pool, "M", "2030-02-01", "18:00", MeetingType::Regular).await;
    let open = voting::create_event(pool, meeting_id, "Open", "YES_NO", chair).await.expect("a");
    let closed = voting::create_event(pool, meeting_id, "Closed", "YES_NO", chair).await.expect("b");
    voting::end_event(pool, closed, chair).await.expect("end");

    let active = voting::find_events_for_meeting(pool, meeting_id, false).await.expect("list");
    assert_eq!(active.iter().map(|e| e.id).collect::<Vec<_>>(), vec![open]);

    let all = voting::find_events_for_meeting(pool, meeting_id, true).await.expect("list all");
    assert_eq!(all.len(), 2);
}

#[sqlx::test]
async fn test_event_for_unknown_meeting_and_cleanup(pool: PgPool) {
    let pool = &pool;
    seed_roles(pool).await;

    let chair = insert_user(pool, "chair", Role::Eboard).await;
    assert!(matches!(
        voting::create_event(pool, 8_888, "Q", "YES_NO", chair).await,
        Err(AppError::NotFound(_))
    ));

    let meeting_id = insert_meeting(pool, "M", "2030-02-01", "18:00", MeetingType::Regular).await;
    let event_id = voting::create_event(pool, meeting_id, "Q", "YES_NO", chair).await.expect("open");
    voting::cast(pool, event_id, chair, "YES", chair).await.expect("vote");

    assert_eq!(voting::delete_records(pool, event_id).await.expect("cleanup"), 1);
    assert!(voting::tally(pool, event_id).await.expect("tally").is_empty());
}

#[sqlx::test]
async fn test_vote_waiting_on_an_ending_event_is_rejected(pool: PgPool) {
    seed_roles(&pool).await;

    let chair = insert_user(&pool, "chair", Role::Eboard).await;
    let meeting_id = insert_meeting(&pool, "M", "2030-02-01", "18:00", MeetingType::Regular).await;
    let event_id = voting::create_event(&pool, meeting_id, "Q", "YES_NO", chair).await.expect("open");

    // Hold the event row mid-close while the vote arrives.
    let mut tx = pool.begin().await.expect("begin");
    sqlx::query("UPDATE voting_events SET deleted_at = clock_timestamp() WHERE id = $1")
        .bind(event_id)
        .execute(&mut *tx)
        .await
        .expect("close in transaction");

    let voter_pool = pool.clone();
    let vote = tokio::spawn(async move {
        voting::cast(&voter_pool, event_id, chair, "YES", chair).await
    });
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    tx.commit().await.expect("commit");

    let outcome = vote.await.expect("join");
    assert!(matches!(outcome, Err(AppError::Conflict(_))), "got {outcome:?}");
    assert!(voting::find_records(&pool, event_id).await.expect("records").is_empty());
}

#[sqlx::test]
async fn test_concurrent_cast_and_end_agree(pool: PgPool) {
    seed_roles(&pool).await;

    let chair = insert_user(&pool, "chair", Role::Eboard).await;
    let meeting_id = insert_meeting(&pool, "M", "2030-02-01", "18:00", MeetingType::Regular).await;

    for round in 0..25 {
        let event_id = voting::create_event(&pool, meeting_id, &format!("Q{round}"), "YES_NO", chair)
            .await
            .expect("open");

        let (p1, p2) = (pool.clone(), pool.clone());
        let vote = tokio::spawn(async move { voting::cast(&p1, event_id, chair, "YES", chair).await });
        let end = tokio::spawn(async move { voting::end_event(&p2, event_id, chair).await });
        let vote = vote.await.expect("join vote");
        end.await.expect("join end").expect("end");

        let records = voting::find_records(&pool, event_id).await.expect("records");
        match vote {
            Ok(_) => assert_eq!(records.len(), 1, "round {round}"),
            Err(AppError::Conflict(_)) => assert!(records.is_empty(), "round {round}"),
            Err(other) => panic!("round {round}: unexpected {other:?}"),
        }
    }
}
