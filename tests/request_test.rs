//! Absence request lifecycle: lateness at creation, one request per attendance
//! row, edits, and resolution through the linked attendance status.

use chrono::{DateTime, Duration, FixedOffset, Offset, Utc};

use sqlx::PgPool;

use roster::errors::AppError;
use roster::models::attendance::{self, AttendanceStatus};
use roster::models::meeting::MeetingType;
use roster::models::request::{self, AttendanceMode, Decision, RequestFields, RequestFilter, TimeAdjustment};
use roster::models::role::Role;

mod common;
use common::{attendance_id, insert_meeting, insert_user, seed_roles};

fn utc() -> FixedOffset {
    Utc.fix()
}

fn fields(reason: &str) -> RequestFields {
    RequestFields {
        reason: reason.to_string(),
        attendance_mode: AttendanceMode::Online,
        time_adjustment: None,
    }
}

fn schedule_at(start: DateTime<Utc>) -> (String, String) {
    (start.format("%Y-%m-%d").to_string(), start.format("%H:%M:%S").to_string())
}

#[sqlx::test]
async fn test_request_six_hours_out_is_late(pool: PgPool) {
    let pool = &pool;
    seed_roles(pool).await;

    let now = Utc::now();
    let (date, start) = schedule_at(now + Duration::hours(6));
    let user_id = insert_user(pool, "hana", Role::Member).await;
    let meeting_id = insert_meeting(pool, "Soon", &date, &start, MeetingType::Regular).await;
    let att = attendance_id(pool, user_id, meeting_id).await;

    let id = request::create(pool, att, &fields("train delayed"), utc(), now)
        .await
        .expect("create");
    let created = request::find_by_id(pool, id).await.expect("query").expect("row");
    assert!(created.is_late);
    assert_eq!(created.status, AttendanceStatus::Pending);
    assert_eq!(created.user_id, user_id);
}

#[sqlx::test]
async fn test_request_two_days_out_is_not_late(pool: PgPool) {
    let pool = &pool;
    seed_roles(pool).await;

    let now = Utc::now();
    let (date, start) = schedule_at(now + Duration::hours(48));
    let user_id = insert_user(pool, "ivan", Role::Member).await;
    let meeting_id = insert_meeting(pool, "Later", &date, &start, MeetingType::FullBody).await;
    let att = attendance_id(pool, user_id, meeting_id).await;

    let id = request::create(pool, att, &fields("exam"), utc(), now).await.expect("create");
    let created = request::find_by_id(pool, id).await.expect("query").expect("row");
    assert!(!created.is_late);
}

#[sqlx::test]
async fn test_second_request_for_same_attendance_conflicts(pool: PgPool) {
    let pool = &pool;
    seed_roles(pool).await;

    let user_id = insert_user(pool, "jo", Role::Member).await;
    let meeting_id = insert_meeting(pool, "M", "2030-01-01", "19:00", MeetingType::Regular).await;
    let att = attendance_id(pool, user_id, meeting_id).await;

    request::create(pool, att, &fields("first"), utc(), Utc::now()).await.expect("first");
    let second = request::create(pool, att, &fields("second"), utc(), Utc::now()).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
}

#[sqlx::test]
async fn test_request_for_missing_attendance_is_not_found(pool: PgPool) {
    seed_roles(&pool).await;
    let result = request::create(&pool, 987_654, &fields("ghost"), utc(), Utc::now()).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[sqlx::test]
async fn test_corrupt_meeting_schedule_is_parse_error(pool: PgPool) {
    let pool = &pool;
    seed_roles(pool).await;

    let user_id = insert_user(pool, "kim", Role::Member).await;
    let meeting_id = insert_meeting(pool, "Bad", "someday", "19:00", MeetingType::Regular).await;
    let att = attendance_id(pool, user_id, meeting_id).await;

    let result = request::create(pool, att, &fields("?"), utc(), Utc::now()).await;
    assert!(matches!(result, Err(AppError::Parse(_))));
}

#[sqlx::test]
async fn test_update_keeps_lateness(pool: PgPool) {
    let pool = &pool;
    seed_roles(pool).await;

    let now = Utc::now();
    let (date, start) = schedule_at(now + Duration::hours(2));
    let user_id = insert_user(pool, "lee", Role::Member).await;
    let meeting_id = insert_meeting(pool, "Soon", &date, &start, MeetingType::Regular).await;
    let att = attendance_id(pool, user_id, meeting_id).await;
    let id = request::create(pool, att, &fields("doctor"), utc(), now).await.expect("create");

    let edited = RequestFields {
        reason: "doctor, leaving at 8".to_string(),
        attendance_mode: AttendanceMode::InPerson,
        time_adjustment: Some(TimeAdjustment::LeavingEarly),
    };
    request::update(pool, id, &edited).await.expect("update");

    let row = request::find_by_id(pool, id).await.expect("query").expect("row");
    assert_eq!(row.reason, "doctor, leaving at 8");
    assert_eq!(row.attendance_mode, AttendanceMode::InPerson);
    assert_eq!(row.time_adjustment, Some(TimeAdjustment::LeavingEarly));
    assert!(row.is_late);
}

#[sqlx::test]
async fn test_decisions_write_attendance_status(pool: PgPool) {
    let pool = &pool;
    seed_roles(pool).await;

    let user_id = insert_user(pool, "max", Role::Member).await;
    let m1 = insert_meeting(pool, "M1", "2030-01-01", "19:00", MeetingType::Regular).await;
    let m2 = insert_meeting(pool, "M2", "2030-01-08", "19:00", MeetingType::Regular).await;
    let a1 = attendance_id(pool, user_id, m1).await;
    let a2 = attendance_id(pool, user_id, m2).await;
    let r1 = request::create(pool, a1, &fields("a"), utc(), Utc::now()).await.expect("r1");
    let r2 = request::create(pool, a2, &fields("b"), utc(), Utc::now()).await.expect("r2");

    request::decide(pool, r1, Decision::Approve).await.expect("approve");
    request::decide(pool, r2, Decision::Reject).await.expect("reject");

    let s1 = attendance::find_by_id(pool, a1).await.expect("q").expect("row").status;
    let s2 = attendance::find_by_id(pool, a2).await.expect("q").expect("row").status;
    assert_eq!(s1, AttendanceStatus::ExcusedAbsence);
    assert_eq!(s2, AttendanceStatus::UnexcusedAbsence);

    assert!(matches!(
        request::decide(pool, 555_555, Decision::Approve).await,
        Err(AppError::NotFound(_))
    ));
}

#[sqlx::test]
async fn test_list_filters_by_user_and_delete_withdraws(pool: PgPool) {
    let pool = &pool;
    seed_roles(pool).await;

    let nia = insert_user(pool, "nia", Role::Member).await;
    let omar = insert_user(pool, "omar", Role::Member).await;
    let meeting_id = insert_meeting(pool, "M", "2030-01-01", "19:00", MeetingType::Regular).await;
    let a_nia = attendance_id(pool, nia, meeting_id).await;
    let a_omar = attendance_id(pool, omar, meeting_id).await;
    let r_nia = request::create(pool, a_nia, &fields("n"), utc(), Utc::now()).await.expect("n");
    request::create(pool, a_omar, &fields("o"), utc(), Utc::now()).await.expect("o");

    let mine = request::find_all(pool, RequestFilter { user_id: Some(nia), meeting_id: None })
        .await
        .expect("list");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, r_nia);

    request::delete(pool, r_nia).await.expect("delete");
    assert!(request::find_by_id(pool, r_nia).await.expect("q").is_none());
    let row = attendance::find_by_id(pool, a_nia).await.expect("q").expect("row");
    assert!(!row.has_request);
}
