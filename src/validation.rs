//! Input validation for form submissions.
//!
//! Pure, synchronous functions, one per mutating operation. Each takes the
//! raw untrusted field mapping from the request (fields possibly missing or
//! empty) and either returns a normalized payload — trimmed, email
//! lowercased, free-text fields HTML-escaped — or a `ValidationFailure`
//! carrying every violation for the submission. Nothing here touches the
//! store; uniqueness is the repository's job.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

lazy_static! {
    /// Username charset: letters, digits, underscore.
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9_]+$").unwrap();

    /// Pragmatic email shape check: one `@`, a dot in the domain, no spaces.
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub const PRICE_CEILING: f64 = 10_000_000.0;

/// Ordered, human-readable violations for one submission. Validators never
/// fail fast: every broken field is reported together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub messages: Vec<String>,
}

impl ValidationFailure {
    /// Messages joined the way the form pages display them.
    pub fn message(&self) -> String {
        self.messages.join(". ")
    }
}

/// Raw field mapping as it arrives from a form body.
pub type RawFields = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationData {
    pub name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginData {
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingData {
    pub home: String,
    pub country: String,
    pub city: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpdateData {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    /// `None` when the password field was left empty: keep the stored hash.
    pub password: Option<String>,
}

fn field<'a>(fields: &'a RawFields, name: &str) -> &'a str {
    fields.get(name).map(String::as_str).unwrap_or("")
}

/// Escape HTML-significant characters in free-text input before it is
/// persisted or echoed back into a form.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn check_name(name: &str, errors: &mut Vec<String>) {
    if name.is_empty() {
        errors.push("Name is required".to_string());
    } else if name.chars().count() < 2 || name.chars().count() > 50 {
        errors.push("Name must be between 2 and 50 characters".to_string());
    }
}

fn check_username(username: &str, errors: &mut Vec<String>) {
    if username.is_empty() {
        errors.push("Username is required".to_string());
    } else if username.chars().count() < 3 || username.chars().count() > 30 {
        errors.push("Username must be between 3 and 30 characters".to_string());
    } else if !USERNAME_REGEX.is_match(username) {
        errors.push("Username can only contain letters, numbers, and underscores".to_string());
    }
}

fn check_email(email: &str, errors: &mut Vec<String>) {
    if email.is_empty() {
        errors.push("Email is required".to_string());
    } else if !EMAIL_REGEX.is_match(email) {
        errors.push("Please provide a valid email address".to_string());
    }
}

fn check_password(password: &str, errors: &mut Vec<String>) {
    if password.is_empty() {
        errors.push("Password is required".to_string());
    } else if password.chars().count() < 6 {
        errors.push("Password must be at least 6 characters long".to_string());
    } else if password.chars().count() > 128 {
        errors.push("Password must not exceed 128 characters".to_string());
    }
}

/// Validate and normalize a registration submission.
pub fn validate_registration(fields: &RawFields) -> Result<RegistrationData, ValidationFailure> {
    let name = field(fields, "name").trim().to_string();
    let username = field(fields, "username").trim().to_string();
    let email = field(fields, "email").trim().to_lowercase();
    let password = field(fields, "password").to_string();

    let mut errors = Vec::new();
    check_name(&name, &mut errors);
    check_username(&username, &mut errors);
    check_email(&email, &mut errors);
    check_password(&password, &mut errors);

    if !errors.is_empty() {
        return Err(ValidationFailure { messages: errors });
    }

    Ok(RegistrationData {
        name: escape_html(&name),
        username: escape_html(&username),
        email,
        password,
    })
}

/// Validate a login submission. The identifier is trimmed but otherwise
/// untouched; case handling for emails happens at lookup time.
pub fn validate_login(fields: &RawFields) -> Result<LoginData, ValidationFailure> {
    let identifier = field(fields, "emailOrUsername").trim().to_string();
    let password = field(fields, "password").to_string();

    let mut errors = Vec::new();
    if identifier.is_empty() {
        errors.push("Email or username is required".to_string());
    }
    if password.is_empty() {
        errors.push("Password is required".to_string());
    }

    if !errors.is_empty() {
        return Err(ValidationFailure { messages: errors });
    }

    Ok(LoginData {
        identifier,
        password,
    })
}

/// Validate and normalize a listing submission. A price that fails to parse
/// is a single violation, never a crash; the bounds are inclusive.
pub fn validate_listing(fields: &RawFields) -> Result<ListingData, ValidationFailure> {
    let home = field(fields, "home").trim().to_string();
    let country = field(fields, "country").trim().to_string();
    let city = field(fields, "city").trim().to_string();
    let raw_price = field(fields, "price").trim();

    let mut errors = Vec::new();

    if home.is_empty() {
        errors.push("Property name is required".to_string());
    } else if home.chars().count() < 3 || home.chars().count() > 100 {
        errors.push("Property name must be between 3 and 100 characters".to_string());
    }

    if country.is_empty() {
        errors.push("Country is required".to_string());
    } else if country.chars().count() < 2 || country.chars().count() > 50 {
        errors.push("Country name must be between 2 and 50 characters".to_string());
    }

    if city.is_empty() {
        errors.push("City is required".to_string());
    } else if city.chars().count() < 2 || city.chars().count() > 50 {
        errors.push("City name must be between 2 and 50 characters".to_string());
    }

    let price = match raw_price.parse::<f64>() {
        Ok(p) if p.is_finite() => {
            if p < 0.0 {
                errors.push("Price cannot be negative".to_string());
                None
            } else if p > PRICE_CEILING {
                errors.push("Price seems too high. Please check your input".to_string());
                None
            } else {
                Some(p)
            }
        }
        _ => {
            errors.push("Price must be a valid number".to_string());
            None
        }
    };

    if !errors.is_empty() {
        return Err(ValidationFailure { messages: errors });
    }

    Ok(ListingData {
        home: escape_html(&home),
        country: escape_html(&country),
        city: escape_html(&city),
        // Checked above; errors would have returned already.
        price: price.unwrap_or(0.0),
    })
}

/// Validate an account update from the host panel. Same rules as
/// registration, except the password is optional: an empty field keeps the
/// current hash.
pub fn validate_account_update(fields: &RawFields) -> Result<AccountUpdateData, ValidationFailure> {
    let raw_id = field(fields, "id").trim();
    let name = field(fields, "name").trim().to_string();
    let username = field(fields, "username").trim().to_string();
    let email = field(fields, "email").trim().to_lowercase();
    let password = field(fields, "password").to_string();

    let mut errors = Vec::new();

    let id = match Uuid::parse_str(raw_id) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.push("A valid account id is required".to_string());
            None
        }
    };

    check_name(&name, &mut errors);
    check_username(&username, &mut errors);
    check_email(&email, &mut errors);
    if !password.is_empty() {
        check_password(&password, &mut errors);
    }

    if !errors.is_empty() {
        return Err(ValidationFailure { messages: errors });
    }

    Ok(AccountUpdateData {
        id: id.unwrap_or_else(Uuid::nil),
        name: escape_html(&name),
        username: escape_html(&username),
        email,
        password: if password.is_empty() {
            None
        } else {
            Some(password)
        },
    })
}
