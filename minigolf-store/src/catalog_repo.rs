use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use minigolf_catalog::SlotLedger;
use minigolf_core::course::{
    CourseDetail, CourseImage, CourseListing, GolfCourse, NewCourse, NewTrack, Track,
    DETAIL_SESSION_PREVIEW,
};
use minigolf_core::repository::CatalogRepository;
use minigolf_core::session::{NewSession, OpenSession, Session, SessionUpdate};
use minigolf_core::{CoreError, CoreResult};
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::database::{db_err, parse_column};

pub struct PgCatalogRepository {
    pool: PgPool,
}

impl PgCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COURSE_COLUMNS: &str = "id, name, slug, description, address, city, state, zip_code, phone, email, website, google_maps_url, latitude, longitude, features, amenities, is_active, created_at, updated_at";

const IMAGE_COLUMNS: &str = "id, course_id, url, caption, is_primary, display_order";

const TRACK_COLUMNS: &str = "id, course_id, name, description, holes, difficulty, duration_minutes, is_active";

pub(crate) const SESSION_COLUMNS: &str = "s.id, s.track_id, s.session_date, s.start_time, s.end_time, s.available_slots, s.price_per_person_cents, s.is_available, s.is_cancelled, s.created_at, s.updated_at";

/// Slot-holding party sizes summed per session.
pub(crate) const BOOKED_SLOTS_SQL: &str = "COALESCE((SELECT SUM(b.number_of_people) FROM bookings b WHERE b.session_id = s.id AND b.status <> 'Cancelled'), 0)::BIGINT";

#[derive(sqlx::FromRow)]
struct CourseRow {
    id: Uuid,
    name: String,
    slug: String,
    description: String,
    address: String,
    city: String,
    state: String,
    zip_code: String,
    phone: Option<String>,
    email: Option<String>,
    website: Option<String>,
    google_maps_url: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    features: Vec<String>,
    amenities: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CourseRow> for GolfCourse {
    fn from(row: CourseRow) -> Self {
        GolfCourse {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            address: row.address,
            city: row.city,
            state: row.state,
            zip_code: row.zip_code,
            phone: row.phone,
            email: row.email,
            website: row.website,
            google_maps_url: row.google_maps_url,
            latitude: row.latitude,
            longitude: row.longitude,
            features: row.features,
            amenities: row.amenities,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ImageRow {
    id: Uuid,
    course_id: Uuid,
    url: String,
    caption: Option<String>,
    is_primary: bool,
    display_order: i32,
}

impl From<ImageRow> for CourseImage {
    fn from(row: ImageRow) -> Self {
        CourseImage {
            id: row.id,
            course_id: row.course_id,
            url: row.url,
            caption: row.caption,
            is_primary: row.is_primary,
            order: row.display_order,
        }
    }
}

#[derive(sqlx::FromRow)]
struct TrackRow {
    id: Uuid,
    course_id: Uuid,
    name: String,
    description: Option<String>,
    holes: i32,
    difficulty: String,
    duration_minutes: i32,
    is_active: bool,
}

impl TryFrom<TrackRow> for Track {
    type Error = CoreError;

    fn try_from(row: TrackRow) -> Result<Self, Self::Error> {
        Ok(Track {
            id: row.id,
            course_id: row.course_id,
            name: row.name,
            description: row.description,
            holes: row.holes,
            difficulty: parse_column("difficulty", &row.difficulty)?,
            duration: row.duration_minutes,
            is_active: row.is_active,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct SessionRow {
    pub id: Uuid,
    pub track_id: Uuid,
    pub session_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub available_slots: i32,
    pub price_per_person_cents: i64,
    pub is_available: bool,
    pub is_cancelled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: row.id,
            track_id: row.track_id,
            date: row.session_date,
            start_time: row.start_time,
            end_time: row.end_time,
            available_slots: row.available_slots,
            price_per_person: row.price_per_person_cents,
            is_available: row.is_available,
            is_cancelled: row.is_cancelled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OpenSessionRow {
    #[sqlx(flatten)]
    session: SessionRow,
    booked: i64,
}

impl From<OpenSessionRow> for OpenSession {
    fn from(row: OpenSessionRow) -> Self {
        let ledger = SlotLedger::new(row.session.available_slots, row.booked);
        OpenSession::new(row.session.into(), &ledger)
    }
}

fn tracks_from_rows(rows: Vec<TrackRow>) -> CoreResult<Vec<Track>> {
    rows.into_iter().map(Track::try_from).collect()
}

#[async_trait]
impl CatalogRepository for PgCatalogRepository {
    async fn list_courses(&self, today: NaiveDate) -> CoreResult<Vec<CourseListing>> {
        let courses: Vec<CourseRow> = sqlx::query_as(&format!(
            "SELECT {} FROM golf_courses WHERE is_active ORDER BY name",
            COURSE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let ids: Vec<Uuid> = courses.iter().map(|c| c.id).collect();

        let images: Vec<ImageRow> = sqlx::query_as(&format!(
            "SELECT DISTINCT ON (course_id) {} FROM course_images WHERE course_id = ANY($1) ORDER BY course_id, display_order",
            IMAGE_COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let tracks: Vec<TrackRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tracks WHERE course_id = ANY($1) AND is_active ORDER BY holes, name",
            TRACK_COLUMNS
        ))
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let counts: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT t.course_id, COUNT(s.id)
            FROM sessions s
            JOIN tracks t ON t.id = s.track_id
            WHERE t.course_id = ANY($1)
              AND t.is_active
              AND s.is_available
              AND NOT s.is_cancelled
              AND s.session_date >= $2
            GROUP BY t.course_id
            "#,
        )
        .bind(&ids)
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let mut images_by_course: HashMap<Uuid, CourseImage> = images
            .into_iter()
            .map(|row| (row.course_id, CourseImage::from(row)))
            .collect();
        let mut tracks_by_course: HashMap<Uuid, Vec<Track>> = HashMap::new();
        for track in tracks_from_rows(tracks)? {
            tracks_by_course.entry(track.course_id).or_default().push(track);
        }
        let counts: HashMap<Uuid, i64> = counts.into_iter().collect();

        Ok(courses
            .into_iter()
            .map(|row| {
                let id = row.id;
                CourseListing {
                    course: row.into(),
                    primary_image: images_by_course.remove(&id),
                    tracks: tracks_by_course.remove(&id).unwrap_or_default(),
                    upcoming_sessions: counts.get(&id).copied().unwrap_or(0),
                }
            })
            .collect())
    }

    async fn get_course_by_slug(&self, slug: &str, today: NaiveDate) -> CoreResult<Option<CourseDetail>> {
        let course: Option<CourseRow> = sqlx::query_as(&format!(
            "SELECT {} FROM golf_courses WHERE slug = $1 AND is_active",
            COURSE_COLUMNS
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        let Some(course) = course else {
            return Ok(None);
        };

        let images: Vec<ImageRow> = sqlx::query_as(&format!(
            "SELECT {} FROM course_images WHERE course_id = $1 ORDER BY display_order",
            IMAGE_COLUMNS
        ))
        .bind(course.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let tracks: Vec<TrackRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tracks WHERE course_id = $1 AND is_active ORDER BY holes, name",
            TRACK_COLUMNS
        ))
        .bind(course.id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let sessions: Vec<OpenSessionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}, {} AS booked
            FROM sessions s
            JOIN tracks t ON t.id = s.track_id
            WHERE t.course_id = $1
              AND t.is_active
              AND s.is_available
              AND NOT s.is_cancelled
              AND s.session_date >= $2
            ORDER BY s.session_date, s.start_time
            LIMIT $3
            "#,
            SESSION_COLUMNS, BOOKED_SLOTS_SQL
        ))
        .bind(course.id)
        .bind(today)
        .bind(DETAIL_SESSION_PREVIEW as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(Some(CourseDetail {
            course: course.into(),
            images: images.into_iter().map(CourseImage::from).collect(),
            tracks: tracks_from_rows(tracks)?,
            upcoming_sessions: sessions.into_iter().map(OpenSession::from).collect(),
        }))
    }

    async fn list_tracks(&self, course_id: Uuid) -> CoreResult<Vec<Track>> {
        let rows: Vec<TrackRow> = sqlx::query_as(&format!(
            "SELECT {} FROM tracks WHERE course_id = $1 AND is_active ORDER BY holes, name",
            TRACK_COLUMNS
        ))
        .bind(course_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        tracks_from_rows(rows)
    }

    async fn list_open_sessions(&self, track_id: Uuid, today: NaiveDate) -> CoreResult<Vec<OpenSession>> {
        let rows: Vec<OpenSessionRow> = sqlx::query_as(&format!(
            r#"
            SELECT {}, {} AS booked
            FROM sessions s
            WHERE s.track_id = $1
              AND s.is_available
              AND NOT s.is_cancelled
              AND s.session_date >= $2
            ORDER BY s.session_date, s.start_time
            "#,
            SESSION_COLUMNS, BOOKED_SLOTS_SQL
        ))
        .bind(track_id)
        .bind(today)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(OpenSession::from).collect())
    }

    async fn create_course(&self, course: &NewCourse) -> CoreResult<GolfCourse> {
        let course_id = Uuid::new_v4();
        let name = course.name.as_deref().unwrap_or_default();
        let slug = course.slug.as_deref().unwrap_or_default();

        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row: CourseRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO golf_courses (id, name, slug, description, address, city, state, zip_code, phone, email, website, google_maps_url, latitude, longitude, features, amenities, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {}
            "#,
            COURSE_COLUMNS
        ))
        .bind(course_id)
        .bind(name)
        .bind(slug)
        .bind(course.description.as_deref().unwrap_or_default())
        .bind(course.address.as_deref().unwrap_or_default())
        .bind(course.city.as_deref().unwrap_or_default())
        .bind(course.state.as_deref().unwrap_or_default())
        .bind(course.zip_code.as_deref().unwrap_or_default())
        .bind(course.phone.as_deref())
        .bind(course.email.as_deref())
        .bind(course.website.as_deref())
        .bind(course.google_maps_url.as_deref())
        .bind(course.latitude)
        .bind(course.longitude)
        .bind(&course.features)
        .bind(&course.amenities)
        .bind(course.is_active.unwrap_or(true))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                CoreError::Conflict(format!("A course with slug '{}' already exists", slug))
            }
            other => db_err(other),
        })?;

        for image in &course.images {
            sqlx::query(
                r#"
                INSERT INTO course_images (id, course_id, url, caption, is_primary, display_order)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(course_id)
            .bind(&image.url)
            .bind(image.caption.as_deref())
            .bind(image.is_primary)
            .bind(image.order)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        }

        tx.commit().await.map_err(db_err)?;

        info!("Course created: {} ({})", name, course_id);
        Ok(row.into())
    }

    async fn create_track(&self, course_id: Uuid, track: &NewTrack) -> CoreResult<Track> {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM golf_courses WHERE id = $1")
            .bind(course_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        if exists.is_none() {
            return Err(CoreError::NotFound(format!("Course {}", course_id)));
        }

        let row: TrackRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO tracks (id, course_id, name, description, holes, difficulty, duration_minutes, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            TRACK_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(course_id)
        .bind(&track.name)
        .bind(track.description.as_deref())
        .bind(track.holes)
        .bind(track.difficulty.as_str())
        .bind(track.duration)
        .bind(track.is_active)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        row.try_into()
    }

    async fn create_session(&self, track_id: Uuid, session: &NewSession) -> CoreResult<Session> {
        let exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM tracks WHERE id = $1")
            .bind(track_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        if exists.is_none() {
            return Err(CoreError::NotFound(format!("Track {}", track_id)));
        }

        let row: SessionRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO sessions AS s (id, track_id, session_date, start_time, end_time, available_slots, price_per_person_cents, is_available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            SESSION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(track_id)
        .bind(session.date)
        .bind(session.start_time)
        .bind(session.end_time)
        .bind(session.available_slots)
        .bind(session.price_per_person)
        .bind(session.is_available)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.into())
    }

    async fn update_session(&self, id: Uuid, update: &SessionUpdate) -> CoreResult<Session> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let row: Option<SessionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM sessions s WHERE s.id = $1 FOR UPDATE",
            SESSION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let mut session: Session = row
            .ok_or_else(|| CoreError::NotFound(format!("Session {}", id)))?
            .into();

        let booked: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(number_of_people), 0)::BIGINT FROM bookings WHERE session_id = $1 AND status <> 'Cancelled'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        let ledger = SlotLedger::new(session.available_slots, booked);
        update.apply(&mut session, &ledger)?;

        let row: SessionRow = sqlx::query_as(&format!(
            r#"
            UPDATE sessions AS s
            SET available_slots = $2, price_per_person_cents = $3, is_available = $4, is_cancelled = $5, updated_at = NOW()
            WHERE s.id = $1
            RETURNING {}
            "#,
            SESSION_COLUMNS
        ))
        .bind(id)
        .bind(session.available_slots)
        .bind(session.price_per_person)
        .bind(session.is_available)
        .bind(session.is_cancelled)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;

        Ok(row.into())
    }
}
