//! Contact details a shopper can leave to hear about price drops.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`Email`] or a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    /// The input string is empty (after trimming).
    #[error("contact cannot be empty")]
    Empty,
    /// The email is longer than allowed.
    #[error("email must be at most {max} characters")]
    EmailTooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The email is not `local@domain`.
    #[error("email must look like name@domain")]
    MalformedEmail,
    /// The phone number contains something other than digits and separators.
    #[error("phone may only contain digits, spaces, dashes and a leading +")]
    InvalidPhoneCharacter,
    /// The phone number has too few or too many digits.
    #[error("phone must have between {min} and {max} digits")]
    PhoneLength {
        /// Minimum digit count.
        min: usize,
        /// Maximum digit count.
        max: usize,
    },
}

/// An email address.
///
/// Stored trimmed and lowercased so the same shopper typed twice produces
/// the same lead recipient.
///
/// ```
/// use tienda_core::Email;
///
/// assert_eq!(Email::parse(" Ana@Example.com ").unwrap().as_str(), "ana@example.com");
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("@domain.com").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email` from user input.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError`] when the input is empty, too long, or not of
    /// the form `local@domain` with exactly one `@`.
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(ContactError::EmailTooLong {
                max: Self::MAX_LENGTH,
            });
        }

        match s.split_once('@') {
            Some((local, domain))
                if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
            {
                Ok(Self(s.to_lowercase()))
            }
            _ => Err(ContactError::MalformedEmail),
        }
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = ContactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A phone number, normalized to digits with an optional leading `+`.
///
/// ```
/// use tienda_core::Phone;
///
/// assert_eq!(Phone::parse("+54 9 11-5555-0000").unwrap().as_str(), "+5491155550000");
/// assert!(Phone::parse("call me").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Phone(String);

impl Phone {
    /// Minimum number of digits accepted.
    pub const MIN_DIGITS: usize = 6;
    /// Maximum number of digits accepted (E.164).
    pub const MAX_DIGITS: usize = 15;

    /// Parse a `Phone` from user input, dropping spaces, dashes, dots and
    /// parentheses.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError`] when the input is empty, contains other
    /// characters, or has a digit count outside
    /// [`MIN_DIGITS`](Self::MIN_DIGITS)..=[`MAX_DIGITS`](Self::MAX_DIGITS).
    pub fn parse(s: &str) -> Result<Self, ContactError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ContactError::Empty);
        }

        let (plus, rest) = s.strip_prefix('+').map_or(("", s), |rest| ("+", rest));
        let mut digits = String::with_capacity(rest.len() + 1);
        digits.push_str(plus);
        for c in rest.chars() {
            match c {
                '0'..='9' => digits.push(c),
                ' ' | '-' | '.' | '(' | ')' => {}
                _ => return Err(ContactError::InvalidPhoneCharacter),
            }
        }

        let count = digits.len() - plus.len();
        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&count) {
            return Err(ContactError::PhoneLength {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(digits))
    }

    /// Returns the normalized number.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Digits only, as used in `wa.me` links.
    #[must_use]
    pub fn digits(&self) -> &str {
        self.0.trim_start_matches('+')
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Phone {
    type Err = ContactError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(Email::parse("user@example.com").is_ok());
        assert!(Email::parse("user.name+tag@example.com.ar").is_ok());
        assert!(Email::parse("a@b.c").is_ok());
    }

    #[test]
    fn test_email_normalized() {
        let email = Email::parse("  Compras@Tienda.COM ").unwrap();
        assert_eq!(email.as_str(), "compras@tienda.com");
    }

    #[test]
    fn test_email_invalid() {
        assert_eq!(Email::parse("   "), Err(ContactError::Empty));
        assert_eq!(Email::parse("user@"), Err(ContactError::MalformedEmail));
        assert_eq!(Email::parse("a@b@c"), Err(ContactError::MalformedEmail));
        let long = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            Email::parse(&long),
            Err(ContactError::EmailTooLong { .. })
        ));
    }

    #[test]
    fn test_phone_normalized() {
        let phone = Phone::parse("(011) 4555-1234").unwrap();
        assert_eq!(phone.as_str(), "01145551234");
        assert_eq!(phone.digits(), "01145551234");

        let intl = Phone::parse("+54 9 11 5555 0000").unwrap();
        assert_eq!(intl.as_str(), "+5491155550000");
        assert_eq!(intl.digits(), "5491155550000");
    }

    #[test]
    fn test_phone_invalid() {
        assert_eq!(
            Phone::parse("11-abc-22"),
            Err(ContactError::InvalidPhoneCharacter)
        );
        assert!(matches!(
            Phone::parse("123"),
            Err(ContactError::PhoneLength { .. })
        ));
        assert!(matches!(
            Phone::parse("+"),
            Err(ContactError::PhoneLength { .. })
        ));
    }
}
