use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::booking::{Booking, BookingConfirmation, BookingStatus, NewBooking};
use crate::contact::{ContactStatus, ContactSubmission};
use crate::course::{CourseDetail, CourseListing, GolfCourse, NewCourse, NewTrack, Track};
use crate::session::{NewSession, OpenSession, Session, SessionUpdate};
use crate::CoreResult;

/// Courses, tracks and sessions.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Active courses by name, with their first image, active tracks and the
    /// number of sessions still open on or after `today`.
    async fn list_courses(&self, today: NaiveDate) -> CoreResult<Vec<CourseListing>>;

    async fn get_course_by_slug(&self, slug: &str, today: NaiveDate) -> CoreResult<Option<CourseDetail>>;

    /// Active tracks of a course, fewest holes first.
    async fn list_tracks(&self, course_id: Uuid) -> CoreResult<Vec<Track>>;

    /// Sessions of a track that are available, not cancelled and dated on or
    /// after `today`, ordered by date then start time.
    async fn list_open_sessions(&self, track_id: Uuid, today: NaiveDate) -> CoreResult<Vec<OpenSession>>;

    async fn create_course(&self, course: &NewCourse) -> CoreResult<GolfCourse>;

    async fn create_track(&self, course_id: Uuid, track: &NewTrack) -> CoreResult<Track>;

    async fn create_session(&self, track_id: Uuid, session: &NewSession) -> CoreResult<Session>;

    /// Must hold the session lock while checking a capacity change against
    /// current bookings.
    async fn update_session(&self, id: Uuid, update: &SessionUpdate) -> CoreResult<Session>;
}

/// The session store as seen by the admission check.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Load and lock the session, sum its slot-holding bookings, run
    /// [`crate::admission::admit`] against `today` and insert the booking as
    /// one atomic step. Concurrent calls for the same session must serialize.
    async fn admit_booking(&self, booking: &NewBooking, today: NaiveDate) -> CoreResult<BookingConfirmation>;

    /// Newest first.
    async fn list_bookings(&self, status: Option<BookingStatus>) -> CoreResult<Vec<BookingConfirmation>>;

    /// Returns the previous status alongside the updated booking.
    async fn update_booking_status(
        &self,
        id: Uuid,
        status: BookingStatus,
    ) -> CoreResult<(BookingStatus, Booking)>;
}

#[async_trait]
pub trait ContactRepository: Send + Sync {
    async fn create_submission(&self, submission: &ContactSubmission) -> CoreResult<ContactSubmission>;

    /// Newest first.
    async fn list_submissions(&self, status: Option<ContactStatus>) -> CoreResult<Vec<ContactSubmission>>;

    async fn update_submission_status(&self, id: Uuid, status: ContactStatus) -> CoreResult<ContactSubmission>;
}
