//! Value objects shared by the domain entities.
//!
//! Constructors check their invariants (positive ids, lower-cased valid
//! emails, non-blank names, whole-cent money) so the rest of the crate can
//! take them at face value.
use std::{ops::Deref, str::FromStr};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use thiserror::Error;
use uuid::Uuid;
use validator::ValidateEmail;

/// Why a value object could not be built.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeConstraintError {
    /// Ids start at 1.
    #[error("id must be greater than zero")]
    NonPositiveId,
    #[error("invalid email address")]
    InvalidEmail,
    /// Blank after trimming.
    #[error("value cannot be empty")]
    EmptyString,
    #[error("invalid value: {0}")]
    InvalidValue(String),
    /// Money amount was negative where only non-negative amounts are allowed.
    #[error("amount cannot be negative")]
    NegativeAmount,
    #[error("invalid uuid value")]
    InvalidUuid,
}

fn normalize_email<S: Into<String>>(email: S) -> Result<String, TypeConstraintError> {
    let normalized = email.into().trim().to_lowercase();
    if normalized.validate_email() {
        Ok(normalized)
    } else {
        Err(TypeConstraintError::InvalidEmail)
    }
}

/// Declares a positive `i32` row id newtype.
macro_rules! id_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            pub fn new(value: i32) -> Result<Self, TypeConstraintError> {
                if value > 0 {
                    Ok(Self(value))
                } else {
                    Err(TypeConstraintError::NonPositiveId)
                }
            }

            pub const fn get(self) -> i32 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<i32> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: i32) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

id_newtype!(TenantId, "Unique identifier for a tenant organization.");
id_newtype!(UserId, "Unique identifier for a staff user.");
id_newtype!(ClientId, "Unique identifier for a customer.");
id_newtype!(LeadId, "Unique identifier for a sales lead.");
id_newtype!(ItemId, "Unique identifier for a catalog item.");
id_newtype!(BundleId, "Unique identifier for a catalog bundle.");
id_newtype!(EstimateId, "Unique identifier for an estimate.");
id_newtype!(InvoiceId, "Unique identifier for an invoice.");
id_newtype!(PurchaseOrderId, "Unique identifier for a purchase order.");
id_newtype!(JobId, "Unique identifier for a job.");
id_newtype!(LineItemId, "Unique identifier for a document line item.");
id_newtype!(LineGroupId, "Unique identifier for a document line group.");
id_newtype!(NotificationId, "Unique identifier for a notification.");
id_newtype!(PaymentId, "Unique identifier for a payment.");
id_newtype!(ActivityId, "Unique identifier for an activity feed entry.");
id_newtype!(IssueId, "Unique identifier for a customer issue.");
id_newtype!(IssueNoteId, "Unique identifier for a note on an issue.");
id_newtype!(TaskId, "Unique identifier for a staff task.");
id_newtype!(SubtaskId, "Unique identifier for a checklist entry of a task.");

/// Macro to generate closed enums persisted as upper-case text codes.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, serde::Serialize, serde::Deserialize, PartialEq, Eq, Hash,
        )]
        pub enum $name {
            $(
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Code stored in the database and exposed over the API.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::domain::types::TypeConstraintError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($code => Ok($name::$variant),)+
                    other => Err($crate::domain::types::TypeConstraintError::InvalidValue(
                        format!("unknown {} `{}`", stringify!($name), other),
                    )),
                }
            }
        }

        impl TryFrom<&str> for $name {
            type Error = $crate::domain::types::TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::domain::types::TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

pub(crate) use string_enum;

/// Lower-cased and validated email address.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn new<S: Into<String>>(email: S) -> Result<Self, TypeConstraintError> {
        let normalized = normalize_email(email)?;
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Display for EmailAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = TypeConstraintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EmailAddress {
    type Error = TypeConstraintError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Trimmed string with at least one character.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
        let trimmed = value.into().trim().to_string();
        if trimmed.is_empty() {
            return Err(TypeConstraintError::EmptyString);
        }
        Ok(Self(trimmed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

macro_rules! non_empty_string_newtype {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: Into<String>>(value: S) -> Result<Self, TypeConstraintError> {
                let inner = NonEmptyString::new(value)?;
                Ok(Self(inner.into_inner()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Deref for $name {
            type Target = str;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = TypeConstraintError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

non_empty_string_newtype!(
    ClientName,
    "Display name of a client."
);

non_empty_string_newtype!(
    PersonName,
    "A first or last name."
);

non_empty_string_newtype!(
    ItemName,
    "Name of a catalog item."
);

non_empty_string_newtype!(
    BundleName,
    "Name of a catalog bundle."
);

non_empty_string_newtype!(
    VendorName,
    "Supplier named on a purchase order."
);

/// Free-form text that is stripped of markup and whitespace.
///
/// Returns `None` when nothing remains after sanitizing.
pub fn sanitize_text(value: &str) -> Option<String> {
    let cleaned = ammonia::clean(value);
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Trims an optional string and drops it when empty.
pub fn trim_optional(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Reduces a phone number to its digits for duplicate matching.
///
/// Eleven digit North American numbers lose their leading country code so
/// that `+1 (555) 123-4567` and `555.123.4567` compare equal.
pub fn normalize_phone_digits(value: &str) -> Option<String> {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    if digits.len() == 11 && digits.starts_with('1') {
        return Some(digits[1..].to_string());
    }
    Some(digits)
}

/// Money amount expressed in integer cents.
#[derive(
    Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(transparent)]
pub struct Cents(i64);

impl Cents {
    pub const ZERO: Cents = Cents(0);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Rejects negative amounts.
    pub fn non_negative(value: i64) -> Result<Self, TypeConstraintError> {
        if value < 0 {
            Err(TypeConstraintError::NegativeAmount)
        } else {
            Ok(Self(value))
        }
    }

    /// Converts a decimal currency amount (e.g. `12.34`) to cents, rounding
    /// half away from zero.
    pub fn from_decimal(value: f64) -> Self {
        Self((value * 100.0).round() as i64)
    }

    /// Decimal representation used in CSV exports.
    pub fn to_decimal(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// Multiplies by a fractional factor, rounding to the nearest cent.
    pub fn scale(self, factor: f64) -> Self {
        Self((self.0 as f64 * factor).round() as i64)
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.to_decimal())
    }
}

impl From<Cents> for i64 {
    fn from(value: Cents) -> Self {
        value.0
    }
}

impl std::ops::Add for Cents {
    type Output = Cents;

    fn add(self, rhs: Self) -> Self::Output {
        Cents(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Cents {
    type Output = Cents;

    fn sub(self, rhs: Self) -> Self::Output {
        Cents(self.0 - rhs.0)
    }
}

impl std::iter::Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Cents::ZERO, |acc, c| acc + c)
    }
}

/// Random identifier exposed in public payment links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicId(Uuid);

impl PublicId {
    /// Random v4 id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reads the 16-byte BLOB stored in SQLite.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeConstraintError> {
        Ok(Self(
            Uuid::from_slice(bytes).map_err(|_| TypeConstraintError::InvalidUuid)?,
        ))
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }
}

impl Display for PublicId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PublicId {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(
            Uuid::parse_str(s.trim()).map_err(|_| TypeConstraintError::InvalidUuid)?,
        ))
    }
}

impl Default for PublicId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_reject_non_positive_values() {
        assert_eq!(ClientId::new(0), Err(TypeConstraintError::NonPositiveId));
        assert_eq!(JobId::new(-4), Err(TypeConstraintError::NonPositiveId));
        assert_eq!(TenantId::new(7).map(TenantId::get), Ok(7));
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let email = EmailAddress::new("  Jane.Doe@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "jane.doe@example.com");
        assert!(EmailAddress::new("not-an-email").is_err());
    }

    #[test]
    fn names_reject_blank_input() {
        assert_eq!(
            ClientName::new("   "),
            Err(TypeConstraintError::EmptyString)
        );
        assert_eq!(ItemName::new(" Trim board ").unwrap().as_str(), "Trim board");
    }

    #[test]
    fn phone_digits_drop_north_american_country_code() {
        assert_eq!(
            normalize_phone_digits("+1 (555) 123-4567").as_deref(),
            Some("5551234567")
        );
        assert_eq!(
            normalize_phone_digits("555.123.4567").as_deref(),
            Some("5551234567")
        );
        assert_eq!(
            normalize_phone_digits("44 20 7946 0958").as_deref(),
            Some("442079460958")
        );
        assert_eq!(normalize_phone_digits("ext."), None);
    }

    #[test]
    fn sanitize_text_strips_markup() {
        assert_eq!(
            sanitize_text("  <script>alert(1)</script>Hello ").as_deref(),
            Some("Hello")
        );
        assert_eq!(sanitize_text("   "), None);
    }

    #[test]
    fn cents_convert_from_decimal_amounts() {
        assert_eq!(Cents::from_decimal(12.34).get(), 1234);
        assert_eq!(Cents::from_decimal(7.5).get(), 750);
        assert_eq!(Cents::from_decimal(0.1 + 0.2).get(), 30);
        assert_eq!(Cents::new(1999).to_string(), "19.99");
        assert_eq!(Cents::new(1000).scale(0.0825).get(), 83);
        assert!(Cents::non_negative(-1).is_err());
    }

    #[test]
    fn public_id_round_trips_through_bytes() {
        let id = PublicId::new();
        let restored = PublicId::from_bytes(id.as_bytes()).unwrap();
        assert_eq!(id, restored);
        assert_eq!(
            PublicId::from_str("nope"),
            Err(TypeConstraintError::InvalidUuid)
        );
    }
}
