use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult, Violations};

pub const MIN_LOAN_AMOUNT: f64 = 1000.0;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Declares a closed set of values stored as text columns.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    _ => Err(()),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum!(Role {
    Admin => "admin",
    Farmer => "farmer",
});

wire_enum!(ProductCategory {
    Seeds => "Seeds",
    Fertilizers => "Fertilizers",
    Pesticides => "Pesticides",
});

wire_enum!(OrderStatus {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Cancelled => "cancelled",
});

wire_enum!(LoanStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
    Paid => "paid",
});

wire_enum!(Severity {
    Low => "low",
    Medium => "medium",
    High => "high",
});

impl LoanStatus {
    /// Statuses an admin may move a loan to.
    pub const DECISIONS: &'static [LoanStatus] = &[LoanStatus::Approved, LoanStatus::Rejected];
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is a valid regex")
    })
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email)
}

/// Rounds a money amount to whole cents.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

fn default_role() -> String {
    Role::Farmer.as_str().to_string()
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> ApiResult<()> {
        let mut v = Violations::new();
        v.check(!self.username.trim().is_empty(), "username", "must not be empty")
            .check(is_valid_email(&self.email), "email", "must be a valid email address")
            .check(
                self.password.chars().count() >= MIN_PASSWORD_LEN,
                "password",
                "must be at least 6 characters",
            )
            .check(
                self.role == Role::Farmer.as_str(),
                "role",
                "only farmer accounts can register",
            );
        v.finish()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

impl LoginRequest {
    pub fn validate(&self) -> ApiResult<Role> {
        let role = self.role.parse::<Role>();
        let mut v = Violations::new();
        v.check(!self.username.is_empty(), "username", "must not be empty")
            .check(!self.password.is_empty(), "password", "must not be empty")
            .check(role.is_ok(), "role", "must be admin or farmer");
        v.finish()?;
        role.map_err(|_| ApiError::invalid_field("role", "must be admin or farmer"))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub token: String,
    pub user: crate::db::models::PublicUser,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CreateLoanRequest {
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub interest_rate: f64,
    #[serde(default)]
    pub term_months: i32,
    #[serde(default, rename = "type")]
    pub loan_type: String,
}

impl CreateLoanRequest {
    pub fn validate(&self) -> ApiResult<()> {
        let mut v = Violations::new();
        v.check(
            self.amount.is_finite() && self.amount >= MIN_LOAN_AMOUNT,
            "amount",
            "must be at least 1000",
        )
        .check(
            self.interest_rate.is_finite() && self.interest_rate >= 0.0,
            "interest_rate",
            "must not be negative",
        )
        .check(self.term_months >= 1, "term_months", "must be at least 1")
        .check(!self.loan_type.trim().is_empty(), "type", "must not be empty");
        v.finish()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: String,
}

impl StatusUpdateRequest {
    /// Parses the requested status, accepting only the values in `allowed`.
    pub fn parse_within<S>(&self, allowed: &[S]) -> ApiResult<S>
    where
        S: FromStr + Copy + PartialEq + fmt::Display,
    {
        match self.status.parse::<S>() {
            Ok(status) if allowed.contains(&status) => Ok(status),
            _ => {
                let names: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
                Err(ApiError::invalid_field(
                    "status",
                    &format!("must be one of: {}", names.join(", ")),
                ))
            }
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CreateProductRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub stock: i32,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

impl CreateProductRequest {
    pub fn validate(&self) -> ApiResult<()> {
        let mut v = Violations::new();
        v.check(!self.name.trim().is_empty(), "name", "must not be empty")
            .check(
                self.category.parse::<ProductCategory>().is_ok(),
                "category",
                "must be one of: Seeds, Fertilizers, Pesticides",
            )
            .check(
                self.price.is_finite() && self.price >= 0.0,
                "price",
                "must not be negative",
            )
            .check(self.stock >= 0, "stock", "must not be negative");
        v.finish()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<i32>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

impl UpdateProductRequest {
    pub fn validate(&self) -> ApiResult<()> {
        let mut v = Violations::new();
        if let Some(name) = &self.name {
            v.check(!name.trim().is_empty(), "name", "must not be empty");
        }
        if let Some(category) = &self.category {
            v.check(
                category.parse::<ProductCategory>().is_ok(),
                "category",
                "must be one of: Seeds, Fertilizers, Pesticides",
            );
        }
        if let Some(price) = self.price {
            v.check(price.is_finite() && price >= 0.0, "price", "must not be negative");
        }
        if let Some(stock) = self.stock {
            v.check(stock >= 0, "stock", "must not be negative");
        }
        v.finish()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProductQuery {
    pub category: Option<String>,
    pub search: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct OrderLine {
    pub product_id: i32,
    pub quantity: i32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub items: Vec<OrderLine>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> ApiResult<()> {
        let mut v = Violations::new();
        v.check(!self.items.is_empty(), "items", "must contain at least one item");
        for (i, line) in self.items.iter().enumerate() {
            if line.quantity < 1 {
                v.push(format!("items[{i}].quantity"), "must be at least 1");
            }
        }
        v.finish()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PlacedOrder {
    pub id: i32,
    pub total_amount: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct WeatherQuery {
    pub active: Option<bool>,
    pub severity: Option<String>,
}

impl WeatherQuery {
    pub fn severity(&self) -> ApiResult<Option<Severity>> {
        match &self.severity {
            None => Ok(None),
            Some(raw) => raw
                .parse::<Severity>()
                .map(Some)
                .map_err(|_| ApiError::invalid_field("severity", "must be low, medium or high")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> RegisterRequest {
        RegisterRequest {
            username: "alice".into(),
            email: "alice@x.com".into(),
            password: "pass123".into(),
            role: "farmer".into(),
        }
    }

    fn failed_fields(result: ApiResult<()>) -> Vec<String> {
        match result {
            Err(ApiError::Validation(fields)) => fields.into_iter().map(|f| f.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn farmer_registration_is_valid() {
        assert!(alice().validate().is_ok());
    }

    #[test]
    fn registering_any_other_role_is_rejected() {
        for role in ["admin", "Farmer", "", "superuser"] {
            let req = RegisterRequest {
                role: role.into(),
                ..alice()
            };
            assert_eq!(failed_fields(req.validate()), vec!["role"], "role {role:?}");
        }
    }

    #[test]
    fn registration_reports_every_bad_field() {
        let req = RegisterRequest {
            username: "  ".into(),
            email: "not-an-email".into(),
            password: "12345".into(),
            role: "farmer".into(),
        };
        assert_eq!(
            failed_fields(req.validate()),
            vec!["username", "email", "password"]
        );
    }

    #[test]
    fn missing_role_defaults_to_farmer() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"username":"bob","email":"bob@x.com","password":"secret1"}"#,
        )
        .unwrap();
        assert_eq!(req.role, "farmer");
    }

    #[test]
    fn login_requires_a_known_role() {
        let req = LoginRequest {
            username: "alice".into(),
            password: "pass123".into(),
            role: "root".into(),
        };
        assert!(matches!(req.validate(), Err(ApiError::Validation(_))));
        let req = LoginRequest {
            role: "admin".into(),
            ..req
        };
        assert_eq!(req.validate(), Ok(Role::Admin));
    }

    #[test]
    fn loan_amount_boundary() {
        let mut req = CreateLoanRequest {
            amount: 500.0,
            interest_rate: 5.0,
            term_months: 12,
            loan_type: "equipment".into(),
        };
        assert_eq!(failed_fields(req.validate()), vec!["amount"]);
        req.amount = MIN_LOAN_AMOUNT;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn loan_terms_are_checked_together() {
        let req = CreateLoanRequest {
            amount: 2000.0,
            interest_rate: -1.0,
            term_months: 0,
            loan_type: String::new(),
        };
        assert_eq!(
            failed_fields(req.validate()),
            vec!["interest_rate", "term_months", "type"]
        );
    }

    #[test]
    fn loan_type_uses_the_type_key_on_the_wire() {
        let req: CreateLoanRequest = serde_json::from_str(
            r#"{"amount":2000,"interest_rate":5,"term_months":12,"type":"equipment"}"#,
        )
        .unwrap();
        assert_eq!(req.loan_type, "equipment");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn loan_decisions_exclude_pending_and_paid() {
        let pick = |s: &str| {
            StatusUpdateRequest { status: s.into() }.parse_within(LoanStatus::DECISIONS)
        };
        assert_eq!(pick("approved"), Ok(LoanStatus::Approved));
        assert_eq!(pick("rejected"), Ok(LoanStatus::Rejected));
        assert!(pick("paid").is_err());
        assert!(pick("pending").is_err());
        assert!(pick("APPROVED").is_err());
    }

    #[test]
    fn order_statuses_accept_the_full_set() {
        for status in OrderStatus::ALL {
            let req = StatusUpdateRequest {
                status: status.to_string(),
            };
            assert_eq!(req.parse_within(OrderStatus::ALL), Ok(*status));
        }
    }

    #[test]
    fn product_category_is_case_sensitive() {
        assert_eq!("Seeds".parse::<ProductCategory>(), Ok(ProductCategory::Seeds));
        assert!("seeds".parse::<ProductCategory>().is_err());
    }

    #[test]
    fn product_validation() {
        let req = CreateProductRequest {
            name: "Neem Oil".into(),
            category: "Tools".into(),
            price: -1.0,
            stock: -2,
            ..Default::default()
        };
        assert_eq!(
            failed_fields(req.validate()),
            vec!["category", "price", "stock"]
        );
        let patch = UpdateProductRequest {
            stock: Some(3),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn orders_need_positive_quantities() {
        let empty = CreateOrderRequest::default();
        assert_eq!(failed_fields(empty.validate()), vec!["items"]);
        let req = CreateOrderRequest {
            items: vec![
                OrderLine {
                    product_id: 1,
                    quantity: 2,
                },
                OrderLine {
                    product_id: 2,
                    quantity: 0,
                },
            ],
        };
        assert_eq!(failed_fields(req.validate()), vec!["items[1].quantity"]);
    }

    #[test]
    fn weather_severity_filter() {
        let q = WeatherQuery {
            active: None,
            severity: Some("high".into()),
        };
        assert_eq!(q.severity(), Ok(Some(Severity::High)));
        let q = WeatherQuery {
            active: None,
            severity: Some("extreme".into()),
        };
        assert!(q.severity().is_err());
    }

    #[test]
    fn cents_rounding() {
        assert_eq!(round_cents(3.0 * 199.99), 599.97);
        assert_eq!(round_cents(0.1 + 0.2), 0.3);
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("admin@agromanage.com"));
        assert!(!is_valid_email("admin@localhost"));
        assert!(!is_valid_email("a b@x.com"));
    }
}
