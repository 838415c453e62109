use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use minigolf_core::admission::{self, SessionCapacity};
use minigolf_core::booking::{Booking, BookingConfirmation, BookingStatus, NewBooking};
use minigolf_core::course::{CourseSummary, TrackSummary};
use minigolf_core::repository::BookingRepository;
use minigolf_core::session::{Session, SessionSummary};
use minigolf_core::{CoreError, CoreResult};
use minigolf_shared::Masked;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::catalog_repo::{SessionRow, SESSION_COLUMNS};
use crate::database::{db_err, parse_column};

pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const BOOKING_COLUMNS: &str = "b.id, b.session_id, b.customer_name, b.customer_email, b.customer_phone, b.notes, b.number_of_people, b.total_price_cents, b.status, b.created_at, b.updated_at";

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    session_id: Uuid,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    notes: Option<String>,
    number_of_people: i32,
    total_price_cents: i64,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = CoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        Ok(Booking {
            id: row.id,
            session_id: row.session_id,
            customer_name: row.customer_name,
            customer_email: Masked(row.customer_email),
            customer_phone: Masked(row.customer_phone),
            notes: row.notes,
            number_of_people: row.number_of_people,
            total_price: row.total_price_cents,
            status: parse_column("status", &row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Track and course columns joined onto a session or booking row.
#[derive(sqlx::FromRow)]
struct PlacementRow {
    track_id: Uuid,
    track_name: String,
    holes: i32,
    difficulty: String,
    course_id: Uuid,
    course_name: String,
    course_slug: String,
    course_city: String,
}

const PLACEMENT_COLUMNS: &str = "t.id AS track_id, t.name AS track_name, t.holes, t.difficulty, c.id AS course_id, c.name AS course_name, c.slug AS course_slug, c.city AS course_city";

impl PlacementRow {
    fn summaries(&self) -> CoreResult<(TrackSummary, CourseSummary)> {
        Ok((
            TrackSummary {
                id: self.track_id,
                name: self.track_name.clone(),
                holes: self.holes,
                difficulty: parse_column("difficulty", &self.difficulty)?,
            },
            CourseSummary {
                id: self.course_id,
                name: self.course_name.clone(),
                slug: self.course_slug.clone(),
                city: self.course_city.clone(),
            },
        ))
    }
}

#[derive(sqlx::FromRow)]
struct SessionContextRow {
    #[sqlx(flatten)]
    session: SessionRow,
    #[sqlx(flatten)]
    placement: PlacementRow,
}

#[derive(sqlx::FromRow)]
struct BookingDetailRow {
    #[sqlx(flatten)]
    booking: BookingRow,
    session_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    price_per_person_cents: i64,
    #[sqlx(flatten)]
    placement: PlacementRow,
}

impl TryFrom<BookingDetailRow> for BookingConfirmation {
    type Error = CoreError;

    fn try_from(row: BookingDetailRow) -> Result<Self, Self::Error> {
        let (track, course) = row.placement.summaries()?;
        let session = SessionSummary {
            id: row.booking.session_id,
            date: row.session_date,
            start_time: row.start_time,
            end_time: row.end_time,
            price_per_person: row.price_per_person_cents,
        };
        Ok(BookingConfirmation {
            booking: row.booking.try_into()?,
            session,
            track,
            course,
        })
    }
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn admit_booking(&self, booking: &NewBooking, today: NaiveDate) -> CoreResult<BookingConfirmation> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Concurrent admissions for this session queue up behind this lock
        // until we commit or roll back.
        let context: SessionContextRow = sqlx::query_as(&format!(
            r#"
            SELECT {}, {}
            FROM sessions s
            JOIN tracks t ON t.id = s.track_id
            JOIN golf_courses c ON c.id = t.course_id
            WHERE s.id = $1
            FOR UPDATE OF s
            "#,
            SESSION_COLUMNS, PLACEMENT_COLUMNS
        ))
        .bind(booking.session_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?
        .ok_or_else(|| CoreError::NotFound(format!("Session {}", booking.session_id)))?;

        let booked_slots: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(number_of_people), 0)::BIGINT FROM bookings WHERE session_id = $1 AND status <> 'Cancelled'",
        )
        .bind(booking.session_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        let (track, course) = context.placement.summaries()?;
        let session: Session = context.session.into();

        // Early returns drop `tx`, which rolls back and releases the lock.
        let quote = admission::admit(
            &SessionCapacity::of(&session, booked_slots),
            booking.number_of_people,
            today,
        )?;
        let admitted = booking.admitted(&quote);

        let row: BookingRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO bookings AS b (id, session_id, customer_name, customer_email, customer_phone, notes, number_of_people, total_price_cents, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            BOOKING_COLUMNS
        ))
        .bind(admitted.id)
        .bind(admitted.session_id)
        .bind(&admitted.customer_name)
        .bind(admitted.customer_email.expose())
        .bind(admitted.customer_phone.expose())
        .bind(admitted.notes.as_deref())
        .bind(admitted.number_of_people)
        .bind(admitted.total_price)
        .bind(admitted.status.as_str())
        .bind(admitted.created_at)
        .bind(admitted.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        debug!(
            "Session {} now holds {} of {} slots",
            session.id,
            booked_slots + i64::from(booking.number_of_people),
            session.available_slots
        );

        Ok(BookingConfirmation {
            booking: row.try_into()?,
            session: SessionSummary::from(&session),
            track,
            course,
        })
    }

    async fn list_bookings(&self, status: Option<BookingStatus>) -> CoreResult<Vec<BookingConfirmation>> {
        let rows: Vec<BookingDetailRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}, s.session_date, s.start_time, s.end_time, s.price_per_person_cents, {}
            FROM bookings b
            JOIN sessions s ON s.id = b.session_id
            JOIN tracks t ON t.id = s.track_id
            JOIN golf_courses c ON c.id = t.course_id
            WHERE ($1::TEXT IS NULL OR b.status = $1)
            ORDER BY b.created_at DESC
            "#,
            BOOKING_COLUMNS, PLACEMENT_COLUMNS
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(BookingConfirmation::try_from).collect()
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> CoreResult<(BookingStatus, Booking)> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let current: Option<(String,)> = sqlx::query_as("SELECT status FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;

        let (current,) = current.ok_or_else(|| CoreError::NotFound(format!("Booking {}", id)))?;
        let previous: BookingStatus = parse_column("status", &current)?;
        let next = previous.transition(status)?;

        let row: BookingRow = sqlx::query_as(&format!(
            "UPDATE bookings AS b SET status = $2, updated_at = NOW() WHERE b.id = $1 RETURNING {}",
            BOOKING_COLUMNS
        ))
        .bind(id)
        .bind(next.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok((previous, row.try_into()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::DatabaseConfig;
    use crate::catalog_repo::PgCatalogRepository;
    use crate::database::DbClient;
    use chrono::Duration;
    use minigolf_core::course::{Difficulty, NewCourse, NewTrack};
    use minigolf_core::repository::CatalogRepository;
    use minigolf_core::session::{NewSession, SessionUpdate};
    use std::sync::Arc;

    // Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.
    async fn pool() -> PgPool {
        let config = DatabaseConfig {
            url: std::env::var("DATABASE_URL").unwrap(),
            max_connections: 5,
            acquire_timeout_seconds: 5,
            run_migrations: true,
        };
        let db = DbClient::new(&config).await.unwrap();
        db.migrate().await.unwrap();
        db.pool
    }

    async fn session_with_capacity(pool: &PgPool, slots: i32) -> Session {
        let catalog = PgCatalogRepository::new(pool.clone());
        let course = catalog
            .create_course(
                &NewCourse {
                    name: Some(format!("Lock Test {}", Uuid::new_v4())),
                    city: Some("Salem".to_string()),
                    ..Default::default()
                }
                .validate()
                .unwrap(),
            )
            .await
            .unwrap();
        let track = catalog
            .create_track(
                course.id,
                &NewTrack {
                    name: "Lighthouse 18".to_string(),
                    description: None,
                    holes: 18,
                    difficulty: Difficulty::Hard,
                    duration: 50,
                    is_active: true,
                },
            )
            .await
            .unwrap();
        catalog
            .create_session(
                track.id,
                &NewSession {
                    date: Utc::now().date_naive() + Duration::days(1),
                    start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
                    available_slots: slots,
                    price_per_person: 1100,
                    is_available: true,
                },
            )
            .await
            .unwrap()
    }

    fn party(session_id: Uuid, people: i32) -> NewBooking {
        NewBooking {
            session_id,
            number_of_people: people,
            customer_name: "Sam Ortiz".to_string(),
            customer_email: "sam@example.com".to_string(),
            customer_phone: "617-555-0199".to_string(),
            notes: None,
        }
    }

    #[tokio::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn test_concurrent_full_capacity_admissions_admit_one() {
        let pool = pool().await;
        let session = session_with_capacity(&pool, 6).await;
        let repo = Arc::new(PgBookingRepository::new(pool));
        let today = Utc::now().date_naive();

        let (a, b) = (repo.clone(), repo.clone());
        let (party_a, party_b) = (party(session.id, 6), party(session.id, 6));
        let (first, second) = tokio::join!(
            a.admit_booking(&party_a, today),
            b.admit_booking(&party_b, today),
        );

        let outcomes = [first, second];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(CoreError::CapacityExceeded { requested: 6, remaining: 0 }))));
    }

    #[tokio::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn test_cancelled_booking_frees_its_slots() {
        let pool = pool().await;
        let session = session_with_capacity(&pool, 4).await;
        let repo = PgBookingRepository::new(pool);
        let today = Utc::now().date_naive();

        let held = repo.admit_booking(&party(session.id, 4), today).await.unwrap();
        assert!(matches!(
            repo.admit_booking(&party(session.id, 1), today).await,
            Err(CoreError::CapacityExceeded { .. })
        ));

        let (previous, cancelled) = repo
            .update_booking_status(held.booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(previous, BookingStatus::Confirmed);
        assert_eq!(cancelled.status, BookingStatus::Cancelled);

        repo.admit_booking(&party(session.id, 4), today).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn test_past_session_is_refused_under_lock() {
        let pool = pool().await;
        let session = session_with_capacity(&pool, 8).await;
        let repo = PgBookingRepository::new(pool);
        let day_after = session.date + Duration::days(1);

        let err = repo.admit_booking(&party(session.id, 2), day_after).await.unwrap_err();
        assert!(matches!(err, CoreError::Unavailable));
    }

    #[tokio::test]
    #[ignore = "needs Postgres at DATABASE_URL"]
    async fn test_capacity_cannot_shrink_below_bookings() {
        let pool = pool().await;
        let session = session_with_capacity(&pool, 8).await;
        let repo = PgBookingRepository::new(pool.clone());
        let catalog = PgCatalogRepository::new(pool);

        repo.admit_booking(&party(session.id, 5), Utc::now().date_naive())
            .await
            .unwrap();

        let shrink = SessionUpdate {
            available_slots: Some(4),
            ..Default::default()
        };
        let err = catalog.update_session(session.id, &shrink).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));

        let fits = SessionUpdate {
            available_slots: Some(5),
            ..Default::default()
        };
        assert_eq!(catalog.update_session(session.id, &fits).await.unwrap().available_slots, 5);
    }
}
