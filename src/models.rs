use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::pricing::{BookingQuote, CommissionSplit};

// ============================================================================
// ENUMS
// ============================================================================

/// Application role of a user (Postgres enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Customer,
    Provider,
    Admin,
}

/// Admin-controlled provider verification status (Postgres enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "verification_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Pending,
    Approved,
    Rejected,
}

/// Booking lifecycle status (Postgres enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    Refunded,
}

/// Notification category (Postgres enum)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    BookingCreated,
    BookingStatus,
    Payment,
    Review,
    Verification,
    System,
}

/// Which side of a booking a listing is requested for
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    #[default]
    Customer,
    Provider,
}

// ============================================================================
// BOOKING LIFECYCLE
// ============================================================================

impl BookingStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// An open booking can take its one payment; paying a pending booking
    /// also confirms it.
    pub fn accepts_payment(self) -> bool {
        !self.is_terminal()
    }

    /// Next step along pending -> confirmed -> in_progress -> completed.
    pub fn next(self) -> Option<BookingStatus> {
        match self {
            BookingStatus::Pending => Some(BookingStatus::Confirmed),
            BookingStatus::Confirmed => Some(BookingStatus::InProgress),
            BookingStatus::InProgress => Some(BookingStatus::Completed),
            BookingStatus::Completed | BookingStatus::Cancelled => None,
        }
    }

    pub fn can_transition_to(self, target: BookingStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        target == BookingStatus::Cancelled || self.next() == Some(target)
    }

    pub fn ensure_transition(self, target: BookingStatus) -> Result<(), String> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(format!(
                "Cannot move booking from {} to {}",
                self.as_str(),
                target.as_str()
            ))
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }
}

/// The capacity in which a user acts on a booking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingActor {
    Customer,
    Provider,
    Admin,
}

impl BookingActor {
    pub fn resolve(user: &User, booking: &Booking, provider_user_id: Uuid) -> Option<Self> {
        if user.role == UserRole::Admin {
            Some(BookingActor::Admin)
        } else if user.id == provider_user_id {
            Some(BookingActor::Provider)
        } else if user.id == booking.customer_id {
            Some(BookingActor::Customer)
        } else {
            None
        }
    }

    /// Statuses this actor is allowed to request. Legality of the move itself
    /// is checked separately against the current status.
    pub fn may_request(self, target: BookingStatus) -> bool {
        match self {
            BookingActor::Admin => true,
            BookingActor::Provider => matches!(
                target,
                BookingStatus::Confirmed
                    | BookingStatus::InProgress
                    | BookingStatus::Completed
                    | BookingStatus::Cancelled
            ),
            BookingActor::Customer => target == BookingStatus::Cancelled,
        }
    }
}

// ============================================================================
// USERS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// PROVIDERS
// ============================================================================

/// Provider business profile, full view (owner and admin only)
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Provider {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub experience_years: i32,
    pub verification_status: VerificationStatus,
    pub verification_notes: Option<String>,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub rating_average: f64,
    pub rating_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProvider {
    pub id: Uuid,
    pub user_id: Uuid,
    pub business_name: String,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub experience_years: i32,
}

/// Provider as seen by other users. Contact details are withheld until the
/// provider has been approved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProvider {
    pub id: Uuid,
    pub business_name: String,
    pub description: Option<String>,
    pub city: Option<String>,
    pub experience_years: i32,
    pub verification_status: VerificationStatus,
    pub rating_average: f64,
    pub rating_count: i32,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl From<Provider> for PublicProvider {
    fn from(provider: Provider) -> Self {
        let approved = provider.verification_status == VerificationStatus::Approved;
        Self {
            id: provider.id,
            business_name: provider.business_name,
            description: provider.description,
            city: provider.city,
            experience_years: provider.experience_years,
            verification_status: provider.verification_status,
            rating_average: provider.rating_average,
            rating_count: provider.rating_count,
            phone: provider.phone.filter(|_| approved),
            email: provider.email.filter(|_| approved),
            address: provider.address.filter(|_| approved),
        }
    }
}

// ============================================================================
// CATALOG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ServiceCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Provider-owned offering. `hourly_rate` is in minor currency units.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Service {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub hourly_rate: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub category_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub hourly_rate: i64,
}

// ============================================================================
// BOOKINGS, PAYMENTS, REVIEWS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_hours: i32,
    pub hourly_rate: i64,
    pub total_amount: i64,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub address: Option<String>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub service_id: Uuid,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_hours: i32,
    pub hourly_rate: i64,
    pub total_amount: i64,
    pub notes: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub amount: i64,
    pub commission: i64,
    pub provider_amount: i64,
    pub payment_method: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub split: CommissionSplit,
    pub payment_method: String,
}

/// Payment together with the booking it confirmed
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub booking: Booking,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Review {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub customer_id: Uuid,
    pub provider_id: Uuid,
    pub rating: i32,
    pub comment: Option<String>,
}

// ============================================================================
// NOTIFICATIONS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub data: Value,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub data: Value,
}

impl NewNotification {
    pub fn new(
        user_id: Uuid,
        notification_type: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        data: Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            notification_type,
            title: title.into(),
            message: message.into(),
            data,
        }
    }

    pub fn booking_created(provider_user_id: Uuid, booking: &NewBooking, service_title: &str) -> Self {
        Self::new(
            provider_user_id,
            NotificationType::BookingCreated,
            "New booking request",
            format!(
                "New booking for {} on {} from {} to {}",
                service_title, booking.booking_date, booking.start_time, booking.end_time
            ),
            serde_json::json!({ "booking_id": booking.id }),
        )
    }

    pub fn booking_status_changed(recipient: Uuid, booking_id: Uuid, status: BookingStatus) -> Self {
        Self::new(
            recipient,
            NotificationType::BookingStatus,
            "Booking updated",
            format!("Your booking is now {}", status.as_str()),
            serde_json::json!({ "booking_id": booking_id, "status": status }),
        )
    }

    pub fn payment_received(provider_user_id: Uuid, booking_id: Uuid, split: &CommissionSplit) -> Self {
        Self::new(
            provider_user_id,
            NotificationType::Payment,
            "Payment received",
            format!(
                "A booking was paid. Your share is {} after a platform fee of {}",
                split.provider_amount, split.commission
            ),
            serde_json::json!({
                "booking_id": booking_id,
                "amount": split.amount,
                "provider_amount": split.provider_amount,
            }),
        )
    }

    pub fn review_received(provider_user_id: Uuid, booking_id: Uuid, rating: i32) -> Self {
        Self::new(
            provider_user_id,
            NotificationType::Review,
            "New review",
            format!("You received a {rating}-star review"),
            serde_json::json!({ "booking_id": booking_id, "rating": rating }),
        )
    }

    pub fn verification_decided(
        provider_user_id: Uuid,
        status: VerificationStatus,
        notes: Option<&str>,
    ) -> Self {
        let message = match (status, notes) {
            (VerificationStatus::Approved, _) => "Your provider profile has been approved".to_string(),
            (_, Some(notes)) => format!("Your provider profile was not approved: {notes}"),
            (_, None) => "Your provider profile was not approved".to_string(),
        };
        Self::new(
            provider_user_id,
            NotificationType::Verification,
            "Verification update",
            message,
            serde_json::json!({ "status": status }),
        )
    }
}

// ============================================================================
// STATS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BookingStatusCount {
    pub status: BookingStatus,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleCount {
    pub role: UserRole,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderStats {
    pub bookings: Vec<BookingStatusCount>,
    pub total_earnings: i64,
    pub rating_average: f64,
    pub rating_count: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStats {
    pub users: Vec<RoleCount>,
    pub pending_providers: i64,
    pub bookings: Vec<BookingStatusCount>,
    pub total_commission: i64,
}

// ============================================================================
// REQUEST/RESPONSE DTOs
// ============================================================================

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}

/// Role a user may pick for themselves
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelfAssignableRole {
    Customer,
    Provider,
}

impl From<SelfAssignableRole> for UserRole {
    fn from(role: SelfAssignableRole) -> Self {
        match role {
            SelfAssignableRole::Customer => UserRole::Customer,
            SelfAssignableRole::Provider => UserRole::Provider,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterProfileRequest {
    #[validate(length(min = 2, max = 120))]
    pub full_name: String,
    #[validate(length(min = 6, max = 32))]
    pub phone: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    pub role: SelfAssignableRole,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, max = 120))]
    pub full_name: String,
    #[validate(length(min = 6, max = 32))]
    pub phone: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
}

/// Create or update the caller's provider profile
#[derive(Debug, Deserialize, Validate)]
pub struct ProviderProfileRequest {
    #[validate(length(min = 2, max = 120))]
    pub business_name: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(length(min = 6, max = 32))]
    pub phone: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 5, max = 500))]
    pub address: Option<String>,
    #[validate(length(min = 2, max = 120))]
    pub city: Option<String>,
    #[validate(range(min = 0, max = 80))]
    pub experience_years: Option<i32>,
}

impl ProviderProfileRequest {
    pub fn into_new_provider(self, user_id: Uuid) -> NewProvider {
        NewProvider {
            id: Uuid::new_v4(),
            user_id,
            business_name: self.business_name,
            description: self.description,
            phone: self.phone,
            email: self.email,
            address: self.address,
            city: self.city,
            experience_years: self.experience_years.unwrap_or(0),
        }
    }

    pub fn apply_to_existing(self, existing: &mut Provider) {
        existing.business_name = self.business_name;
        existing.description = self.description;
        existing.phone = self.phone;
        existing.email = self.email;
        existing.address = self.address;
        existing.city = self.city;
        existing.experience_years = self.experience_years.unwrap_or(existing.experience_years);
        existing.updated_at = Utc::now();
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateServiceRequest {
    pub category_id: Uuid,
    #[validate(length(min = 3, max = 120))]
    pub title: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub hourly_rate: i64,
}

impl CreateServiceRequest {
    pub fn into_new_service(self, provider_id: Uuid) -> NewService {
        NewService {
            id: Uuid::new_v4(),
            provider_id,
            category_id: self.category_id,
            title: self.title,
            description: self.description,
            hourly_rate: self.hourly_rate,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateServiceRequest {
    pub category_id: Uuid,
    #[validate(length(min = 3, max = 120))]
    pub title: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub hourly_rate: i64,
    pub is_active: bool,
}

impl UpdateServiceRequest {
    pub fn apply_to_existing(self, existing: &mut Service) {
        existing.category_id = self.category_id;
        existing.title = self.title;
        existing.description = self.description;
        existing.hourly_rate = self.hourly_rate;
        existing.is_active = self.is_active;
        existing.updated_at = Utc::now();
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 2, max = 80))]
    pub name: String,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    #[validate(length(max = 120))]
    pub icon: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub service_id: Uuid,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub service_id: Uuid,
    pub booking_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(length(min = 5, max = 500))]
    pub address: Option<String>,
}

fn check_booking_window(
    booking_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    today: NaiveDate,
) -> Result<(), String> {
    if end_time <= start_time {
        return Err("End time must be after start time".into());
    }

    if booking_date < today {
        return Err("Booking date cannot be in the past".into());
    }

    Ok(())
}

impl QuoteRequest {
    pub fn validate_business_rules(&self, today: NaiveDate) -> Result<(), String> {
        check_booking_window(self.booking_date, self.start_time, self.end_time, today)
    }
}

impl CreateBookingRequest {
    pub fn validate_business_rules(&self, today: NaiveDate) -> Result<(), String> {
        check_booking_window(self.booking_date, self.start_time, self.end_time, today)
    }

    pub fn into_new_booking(self, customer_id: Uuid, service: &Service, quote: &BookingQuote) -> NewBooking {
        NewBooking {
            id: Uuid::new_v4(),
            customer_id,
            provider_id: service.provider_id,
            service_id: service.id,
            booking_date: self.booking_date,
            start_time: self.start_time,
            end_time: self.end_time,
            duration_hours: quote.duration_hours,
            hourly_rate: quote.hourly_rate,
            total_amount: quote.total_amount,
            notes: self.notes,
            address: self.address,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBookingStatusRequest {
    pub status: BookingStatus,
    #[validate(length(min = 3, max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CancelBookingRequest {
    #[validate(length(min = 3, max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PaymentRequest {
    #[validate(length(min = 2, max = 40))]
    pub payment_method: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(length(max = 2000))]
    pub comment: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendNotificationRequest {
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
    pub data: Option<Value>,
}

impl SendNotificationRequest {
    pub fn into_new_notification(self) -> NewNotification {
        NewNotification::new(
            self.user_id,
            self.notification_type,
            self.title,
            self.message,
            self.data.unwrap_or(Value::Object(Default::default())),
        )
    }
}

/// Admin decision on a provider profile
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyProviderRequest {
    pub status: VerificationStatus,
    #[validate(length(min = 3, max = 2000))]
    pub notes: Option<String>,
}

impl VerifyProviderRequest {
    pub fn validate_business_rules(&self) -> Result<(), String> {
        match self.status {
            VerificationStatus::Pending => Err("Verification decision must be approved or rejected".into()),
            VerificationStatus::Rejected if self.notes.is_none() => {
                Err("Notes are required when rejecting a provider".into())
            }
            _ => Ok(()),
        }
    }
}
