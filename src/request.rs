use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::{AppError, AppResult, FieldErrors};

/// Largest quantity a single order line may ask for.
pub const MAX_LINE_QUANTITY: u32 = 10_000;

/// Body of `POST /orders`.
#[derive(Debug, Serialize, Deserialize, Validate, Clone, Default)]
pub struct PlaceOrderRequest {
    #[validate(
        required(message = "The customer name field is required."),
        length(min = 1, message = "The customer name field is required.")
    )]
    pub customer_name: Option<String>,
    #[validate(
        required(message = "The customer email field is required."),
        email(message = "The customer email must be a valid email address.")
    )]
    pub customer_email: Option<String>,
    #[validate(
        required(message = "The products field is required."),
        length(min = 1, message = "The products field is required."),
        nested
    )]
    pub products: Option<Vec<LineRequest>>,
}

#[derive(Debug, Serialize, Deserialize, Validate, Clone, Default)]
pub struct LineRequest {
    #[validate(required(message = "The product id field is required."))]
    pub product_id: Option<u64>,
    /// Lines without a positive quantity are skipped when the order is built.
    #[validate(range(max = 10000, message = "The quantity may not be greater than 10000."))]
    pub quantity: Option<i64>,
}

/// A validated order request.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrder {
    pub customer_name: String,
    pub customer_email: String,
    pub lines: Vec<RequestedLine>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestedLine {
    pub product_id: u64,
    /// `None` when the request had no positive quantity; the line is then ignored.
    pub quantity: Option<u32>,
}

impl PlaceOrderRequest {
    /// Validates the request shape and converts it into a `PlaceOrder`.
    ///
    /// Customer fields are trimmed first, so blank values count as missing.
    ///
    /// # Returns
    /// * `AppResult<PlaceOrder>` - The order to place, or `Validation` with
    ///   messages keyed by field path
    pub fn into_order(mut self) -> AppResult<PlaceOrder> {
        self.customer_name = self.customer_name.map(|name| name.trim().to_string());
        self.customer_email = self.customer_email.map(|email| email.trim().to_string());

        if let Err(errors) = self.validate() {
            return Err(AppError::Validation(field_errors(&errors)));
        }

        // Presence of every field was checked above.
        let (Some(customer_name), Some(customer_email), Some(products)) =
            (self.customer_name, self.customer_email, self.products)
        else {
            return Err(AppError::invalid("body", "Incomplete order request."));
        };

        let mut lines = Vec::with_capacity(products.len());
        for (index, line) in products.into_iter().enumerate() {
            let Some(product_id) = line.product_id else {
                continue;
            };
            let quantity = match line.quantity.filter(|quantity| *quantity >= 1) {
                Some(quantity) => Some(
                    u32::try_from(quantity)
                        .ok()
                        .filter(|quantity| *quantity <= MAX_LINE_QUANTITY)
                        .ok_or_else(|| {
                            AppError::invalid(
                                format!("products.{}.quantity", index),
                                "The quantity may not be greater than 10000.",
                            )
                        })?,
                ),
                None => None,
            };
            lines.push(RequestedLine {
                product_id,
                quantity,
            });
        }

        Ok(PlaceOrder {
            customer_name,
            customer_email,
            lines,
        })
    }
}

/// Flattens validator output into dotted field paths, e.g. `products.1.product_id`.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    let mut out = FieldErrors::new();
    collect_errors(errors, None, &mut out);
    out
}

fn collect_errors(errors: &ValidationErrors, prefix: Option<&str>, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let path = match prefix {
            Some(prefix) => format!("{}.{}", prefix, field),
            None => field.to_string(),
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                let messages = out.entry(path.clone()).or_default();
                for error in field_errors {
                    messages.push(match &error.message {
                        Some(message) => message.to_string(),
                        None => format!("The {} field is invalid.", path),
                    });
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_errors(nested, Some(&path), out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_errors(nested, Some(&format!("{}.{}", path, index)), out);
                }
            }
        }
    }
}
