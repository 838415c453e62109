//! Process-local store used by `store.backend = "memory"` and by the HTTP
//! tests. All state sits behind one async mutex, so every repository call is
//! atomic with respect to every other.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use minigolf_catalog::SlotLedger;
use minigolf_core::admission::{self, SessionCapacity};
use minigolf_core::booking::{Booking, BookingConfirmation, BookingStatus, NewBooking};
use minigolf_core::contact::{ContactStatus, ContactSubmission};
use minigolf_core::course::{
    CourseDetail, CourseImage, CourseListing, CourseSummary, GolfCourse, NewCourse, NewTrack,
    Track, TrackSummary, DETAIL_SESSION_PREVIEW,
};
use minigolf_core::repository::{BookingRepository, CatalogRepository, ContactRepository};
use minigolf_core::session::{NewSession, OpenSession, Session, SessionSummary, SessionUpdate};
use minigolf_core::{CoreError, CoreResult};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Default)]
struct State {
    courses: Vec<GolfCourse>,
    images: Vec<CourseImage>,
    tracks: Vec<Track>,
    sessions: Vec<Session>,
    /// Insertion order.
    bookings: Vec<Booking>,
    contacts: Vec<ContactSubmission>,
}

impl State {
    fn booked_slots(&self, session_id: Uuid) -> i64 {
        self.bookings
            .iter()
            .filter(|b| b.session_id == session_id && b.status.holds_slots())
            .map(|b| i64::from(b.number_of_people))
            .sum()
    }

    fn ledger(&self, session: &Session) -> SlotLedger {
        SlotLedger::new(session.available_slots, self.booked_slots(session.id))
    }

    fn active_tracks(&self, course_id: Uuid) -> Vec<Track> {
        let mut tracks: Vec<Track> = self
            .tracks
            .iter()
            .filter(|t| t.course_id == course_id && t.is_active)
            .cloned()
            .collect();
        tracks.sort_by(|a, b| a.holes.cmp(&b.holes).then_with(|| a.name.cmp(&b.name)));
        tracks
    }

    fn images(&self, course_id: Uuid) -> Vec<CourseImage> {
        let mut images: Vec<CourseImage> = self
            .images
            .iter()
            .filter(|i| i.course_id == course_id)
            .cloned()
            .collect();
        images.sort_by_key(|i| i.order);
        images
    }

    /// Open sessions across the given tracks, soonest first.
    fn open_sessions(&self, track_ids: &[Uuid], today: NaiveDate) -> Vec<OpenSession> {
        let mut sessions: Vec<&Session> = self
            .sessions
            .iter()
            .filter(|s| track_ids.contains(&s.track_id) && s.is_open_on(today))
            .collect();
        sessions.sort_by_key(|s| s.sort_key());
        sessions
            .into_iter()
            .map(|s| OpenSession::new(s.clone(), &self.ledger(s)))
            .collect()
    }

    fn confirmation(&self, booking: &Booking) -> CoreResult<BookingConfirmation> {
        let session = self
            .sessions
            .iter()
            .find(|s| s.id == booking.session_id)
            .ok_or_else(|| CoreError::NotFound(format!("Session {}", booking.session_id)))?;
        let track = self
            .tracks
            .iter()
            .find(|t| t.id == session.track_id)
            .ok_or_else(|| CoreError::NotFound(format!("Track {}", session.track_id)))?;
        let course = self
            .courses
            .iter()
            .find(|c| c.id == track.course_id)
            .ok_or_else(|| CoreError::NotFound(format!("Course {}", track.course_id)))?;

        Ok(BookingConfirmation {
            booking: booking.clone(),
            session: SessionSummary::from(session),
            track: TrackSummary::from(track),
            course: CourseSummary::from(course),
        })
    }
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogRepository for InMemoryStore {
    async fn list_courses(&self, today: NaiveDate) -> CoreResult<Vec<CourseListing>> {
        let state = self.state.lock().await;

        let mut courses: Vec<&GolfCourse> = state.courses.iter().filter(|c| c.is_active).collect();
        courses.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(courses
            .into_iter()
            .map(|course| {
                let tracks = state.active_tracks(course.id);
                let track_ids: Vec<Uuid> = tracks.iter().map(|t| t.id).collect();
                CourseListing {
                    course: course.clone(),
                    primary_image: state.images(course.id).into_iter().next(),
                    upcoming_sessions: state.open_sessions(&track_ids, today).len() as i64,
                    tracks,
                }
            })
            .collect())
    }

    async fn get_course_by_slug(&self, slug: &str, today: NaiveDate) -> CoreResult<Option<CourseDetail>> {
        let state = self.state.lock().await;

        let Some(course) = state.courses.iter().find(|c| c.slug == slug && c.is_active) else {
            return Ok(None);
        };

        let tracks = state.active_tracks(course.id);
        let track_ids: Vec<Uuid> = tracks.iter().map(|t| t.id).collect();
        let mut sessions = state.open_sessions(&track_ids, today);
        sessions.truncate(DETAIL_SESSION_PREVIEW);

        Ok(Some(CourseDetail {
            course: course.clone(),
            images: state.images(course.id),
            tracks,
            upcoming_sessions: sessions,
        }))
    }

    async fn list_tracks(&self, course_id: Uuid) -> CoreResult<Vec<Track>> {
        Ok(self.state.lock().await.active_tracks(course_id))
    }

    async fn list_open_sessions(&self, track_id: Uuid, today: NaiveDate) -> CoreResult<Vec<OpenSession>> {
        Ok(self.state.lock().await.open_sessions(&[track_id], today))
    }

    async fn create_course(&self, course: &NewCourse) -> CoreResult<GolfCourse> {
        let mut state = self.state.lock().await;

        let slug = course.slug.clone().unwrap_or_default();
        if state.courses.iter().any(|c| c.slug == slug) {
            return Err(CoreError::Conflict(format!("A course with slug '{}' already exists", slug)));
        }

        let now = Utc::now();
        let created = GolfCourse {
            id: Uuid::new_v4(),
            name: course.name.clone().unwrap_or_default(),
            slug,
            description: course.description.clone().unwrap_or_default(),
            address: course.address.clone().unwrap_or_default(),
            city: course.city.clone().unwrap_or_default(),
            state: course.state.clone().unwrap_or_default(),
            zip_code: course.zip_code.clone().unwrap_or_default(),
            phone: course.phone.clone(),
            email: course.email.clone(),
            website: course.website.clone(),
            google_maps_url: course.google_maps_url.clone(),
            latitude: course.latitude,
            longitude: course.longitude,
            features: course.features.clone(),
            amenities: course.amenities.clone(),
            is_active: course.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        for image in &course.images {
            state.images.push(CourseImage {
                id: Uuid::new_v4(),
                course_id: created.id,
                url: image.url.clone(),
                caption: image.caption.clone(),
                is_primary: image.is_primary,
                order: image.order,
            });
        }
        state.courses.push(created.clone());

        info!("Course created: {} ({})", created.name, created.id);
        Ok(created)
    }

    async fn create_track(&self, course_id: Uuid, track: &NewTrack) -> CoreResult<Track> {
        let mut state = self.state.lock().await;

        if !state.courses.iter().any(|c| c.id == course_id) {
            return Err(CoreError::NotFound(format!("Course {}", course_id)));
        }

        let created = Track {
            id: Uuid::new_v4(),
            course_id,
            name: track.name.clone(),
            description: track.description.clone(),
            holes: track.holes,
            difficulty: track.difficulty,
            duration: track.duration,
            is_active: track.is_active,
        };
        state.tracks.push(created.clone());
        Ok(created)
    }

    async fn create_session(&self, track_id: Uuid, session: &NewSession) -> CoreResult<Session> {
        let mut state = self.state.lock().await;

        if !state.tracks.iter().any(|t| t.id == track_id) {
            return Err(CoreError::NotFound(format!("Track {}", track_id)));
        }

        let now = Utc::now();
        let created = Session {
            id: Uuid::new_v4(),
            track_id,
            date: session.date,
            start_time: session.start_time,
            end_time: session.end_time,
            available_slots: session.available_slots,
            price_per_person: session.price_per_person,
            is_available: session.is_available,
            is_cancelled: false,
            created_at: now,
            updated_at: now,
        };
        state.sessions.push(created.clone());
        Ok(created)
    }

    async fn update_session(&self, id: Uuid, update: &SessionUpdate) -> CoreResult<Session> {
        let mut state = self.state.lock().await;

        let ledger = {
            let session = state
                .sessions
                .iter()
                .find(|s| s.id == id)
                .ok_or_else(|| CoreError::NotFound(format!("Session {}", id)))?;
            state.ledger(session)
        };

        let session = state
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("Session {}", id)))?;
        update.apply(session, &ledger)?;
        Ok(session.clone())
    }
}

#[async_trait]
impl BookingRepository for InMemoryStore {
    async fn admit_booking(&self, booking: &NewBooking, today: NaiveDate) -> CoreResult<BookingConfirmation> {
        // Held until the booking is pushed.
        let mut state = self.state.lock().await;

        let session = state
            .sessions
            .iter()
            .find(|s| s.id == booking.session_id)
            .ok_or_else(|| CoreError::NotFound(format!("Session {}", booking.session_id)))?;

        let booked_slots = state.booked_slots(session.id);
        let quote = admission::admit(
            &SessionCapacity::of(session, booked_slots),
            booking.number_of_people,
            today,
        )?;

        let admitted = booking.admitted(&quote);
        let confirmation = state.confirmation(&admitted)?;
        state.bookings.push(admitted);

        debug!(
            "Session {} now holds {} slots",
            booking.session_id,
            booked_slots + i64::from(booking.number_of_people)
        );
        Ok(confirmation)
    }

    async fn list_bookings(&self, status: Option<BookingStatus>) -> CoreResult<Vec<BookingConfirmation>> {
        let state = self.state.lock().await;
        state
            .bookings
            .iter()
            .rev()
            .filter(|b| status.is_none_or(|s| b.status == s))
            .map(|b| state.confirmation(b))
            .collect()
    }

    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> CoreResult<(BookingStatus, Booking)> {
        let mut state = self.state.lock().await;

        let booking = state
            .bookings
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", id)))?;

        let previous = booking.status;
        booking.status = previous.transition(status)?;
        booking.updated_at = Utc::now();
        Ok((previous, booking.clone()))
    }
}

#[async_trait]
impl ContactRepository for InMemoryStore {
    async fn create_submission(&self, submission: &ContactSubmission) -> CoreResult<ContactSubmission> {
        self.state.lock().await.contacts.push(submission.clone());
        Ok(submission.clone())
    }

    async fn list_submissions(&self, status: Option<ContactStatus>) -> CoreResult<Vec<ContactSubmission>> {
        let state = self.state.lock().await;
        Ok(state
            .contacts
            .iter()
            .rev()
            .filter(|c| status.is_none_or(|s| c.status == s))
            .cloned()
            .collect())
    }

    async fn update_submission_status(&self, id: Uuid, status: ContactStatus) -> CoreResult<ContactSubmission> {
        let mut state = self.state.lock().await;
        let submission = state
            .contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("Contact submission {}", id)))?;
        submission.status = status;
        Ok(submission.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveTime};
    use minigolf_core::course::Difficulty;

    struct Fixture {
        store: InMemoryStore,
        course: GolfCourse,
        track: Track,
        today: NaiveDate,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let course = store
            .create_course(
                &NewCourse {
                    name: Some("Pirate's Cove".to_string()),
                    city: Some("Cape Cod".to_string()),
                    ..Default::default()
                }
                .validate()
                .unwrap(),
            )
            .await
            .unwrap();
        let track = store
            .create_track(
                course.id,
                &NewTrack {
                    name: "Captain's Course".to_string(),
                    description: None,
                    holes: 18,
                    difficulty: Difficulty::Medium,
                    duration: 45,
                    is_active: true,
                },
            )
            .await
            .unwrap();
        Fixture {
            store,
            course,
            track,
            today: Utc::now().date_naive(),
        }
    }

    async fn add_session(f: &Fixture, date: NaiveDate, hour: u32, slots: i32) -> Session {
        f.store
            .create_session(
                f.track.id,
                &NewSession {
                    date,
                    start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
                    end_time: NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
                    available_slots: slots,
                    price_per_person: 1250,
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
            customer_name: "Alex Rivera".to_string(),
            customer_email: "alex@example.com".to_string(),
            customer_phone: "555-0100".to_string(),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_admission_respects_capacity() {
        let f = fixture().await;
        let session = add_session(&f, f.today, 10, 6).await;

        let first = f.store.admit_booking(&party(session.id, 4), f.today).await.unwrap();
        assert_eq!(first.booking.total_price, 5000);
        assert_eq!(first.course.id, f.course.id);

        let err = f.store.admit_booking(&party(session.id, 3), f.today).await.unwrap_err();
        assert!(matches!(err, CoreError::CapacityExceeded { requested: 3, remaining: 2 }));

        f.store.admit_booking(&party(session.id, 2), f.today).await.unwrap();
        assert_eq!(f.store.list_bookings(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cancelling_releases_slots() {
        let f = fixture().await;
        let session = add_session(&f, f.today, 10, 4).await;

        let booking = f.store.admit_booking(&party(session.id, 4), f.today).await.unwrap();
        assert!(f.store.admit_booking(&party(session.id, 1), f.today).await.is_err());

        let (previous, _) = f
            .store
            .update_booking_status(booking.booking.id, BookingStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(previous, BookingStatus::Confirmed);

        f.store.admit_booking(&party(session.id, 4), f.today).await.unwrap();
    }

    #[tokio::test]
    async fn test_past_session_cannot_be_booked() {
        let f = fixture().await;
        let yesterday = add_session(&f, f.today - Duration::days(1), 10, 8).await;

        let err = f.store.admit_booking(&party(yesterday.id, 2), f.today).await.unwrap_err();
        assert!(matches!(err, CoreError::Unavailable));
        assert!(f.store.list_bookings(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let f = fixture().await;
        let err = f.store.admit_booking(&party(Uuid::new_v4(), 1), f.today).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_concurrent_admissions_never_overbook() {
        let f = fixture().await;
        let session = add_session(&f, f.today, 10, 10).await;

        let mut handles = Vec::new();
        for _ in 0..25 {
            let store = f.store.clone();
            let booking = party(session.id, 1);
            let today = f.today;
            handles.push(tokio::spawn(async move { store.admit_booking(&booking, today).await }));
        }

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                admitted += 1;
            }
        }

        assert_eq!(admitted, 10);
        let open = f.store.list_open_sessions(f.track.id, f.today).await.unwrap();
        assert_eq!(open[0].remaining_slots, 0);
    }

    #[tokio::test]
    async fn test_open_sessions_are_filtered_and_ordered() {
        let f = fixture().await;
        let tomorrow = f.today + Duration::days(1);
        let late = add_session(&f, tomorrow, 15, 8).await;
        let early = add_session(&f, tomorrow, 9, 8).await;
        add_session(&f, f.today - Duration::days(1), 9, 8).await;
        let cancelled = add_session(&f, tomorrow, 12, 8).await;
        f.store
            .update_session(
                cancelled.id,
                &SessionUpdate {
                    is_cancelled: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let open = f.store.list_open_sessions(f.track.id, f.today).await.unwrap();
        let ids: Vec<Uuid> = open.iter().map(|s| s.session.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);

        let listing = f.store.list_courses(f.today).await.unwrap();
        assert_eq!(listing[0].upcoming_sessions, 2);
    }

    #[tokio::test]
    async fn test_capacity_cannot_drop_below_booked() {
        let f = fixture().await;
        let session = add_session(&f, f.today, 10, 8).await;
        f.store.admit_booking(&party(session.id, 5), f.today).await.unwrap();

        let shrink = SessionUpdate {
            available_slots: Some(4),
            ..Default::default()
        };
        let err = f.store.update_session(session.id, &shrink).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_duplicate_slug_conflicts() {
        let f = fixture().await;
        let again = NewCourse {
            name: Some("Pirate's Cove".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        let err = f.store.create_course(&again).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }
}
