//! Contact endpoint, signed over a JSON body.

use crate::{
    handlers::values::principal_name,
    models::{Contact, ContactResponse},
};
use actix_web::{Error, HttpRequest, Result, web};
use paperclip::actix::api_v2_operation;
use std::sync::atomic::{AtomicI64, Ordering};

/// Hands out contact identifiers
#[derive(Debug)]
pub struct ContactBook {
    next_id: AtomicI64,
}

impl Default for ContactBook {
    fn default() -> Self {
        Self {
            next_id: AtomicI64::new(1),
        }
    }
}

impl ContactBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a fresh `ContactID`, ignoring any the client sent
    pub fn create(&self, mut contact: Contact) -> Contact {
        contact.contact_id = Some(self.next_id.fetch_add(1, Ordering::Relaxed));
        contact
    }
}

/// Create a contact
#[api_v2_operation(
    summary = "Create Contact",
    description = "Creates a contact from a JSON body. Every non-null field except `ContactID` is signed.",
    tags("Contacts"),
    responses(
        (status = 200, description = "Contact created", body = ContactResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_contact(
    req: HttpRequest,
    payload: web::Json<Contact>,
) -> Result<web::Json<ContactResponse>, Error> {
    let book = req
        .app_data::<web::Data<ContactBook>>()
        .ok_or_else(|| actix_web::error::ErrorServiceUnavailable("Contact book not available"))?;

    let contact = book.create(payload.into_inner());
    let principal = principal_name(&req);
    tracing::info!(contact_id = ?contact.contact_id, %principal, "contact created");

    Ok(web::Json(ContactResponse { contact, principal }))
}
