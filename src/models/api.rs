//! API request and response models for the signed endpoints.

use crate::services::canonical::SignableBody;
use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

/// Response model for the health check endpoint
#[derive(Clone, Serialize, Deserialize, Apiv2Schema)]
pub struct HealthResponse {
    pub status: String,
}

/// A city keyed by its ICAO airport code.
///
/// Posted as a form (`IcaoCode=ZPWS&CityShortName=...`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "PascalCase")]
pub struct City {
    pub icao_code: String,
    pub city_short_name: String,
}

/// Query parameters for the city lookup endpoint
#[derive(Clone, Debug, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "PascalCase")]
pub struct CityQuery {
    pub icao_code: Option<String>,
}

/// Response model for city operations
#[derive(Clone, Debug, Serialize, Deserialize, Apiv2Schema)]
pub struct CityResponse {
    pub accepted: bool,
    pub cities: Vec<City>,
    /// Username the request was authenticated as
    pub principal: String,
}

/// Contact record submitted as a JSON body.
///
/// `ContactID` is the identity field; it is assigned by the server and never
/// part of the signed message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "PascalCase")]
pub struct Contact {
    #[serde(rename = "ContactID", default)]
    pub contact_id: Option<i64>,
    #[serde(default)]
    pub name_style: bool,
    pub title: Option<String>,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub suffix: Option<String>,
    pub email_address: Option<String>,
    #[serde(default)]
    pub email_promotion: i32,
    pub phone: Option<String>,
}

impl SignableBody for Contact {
    const IDENTITY_FIELDS: &'static [&'static str] = &["ContactID"];
}

/// Response model for contact creation
#[derive(Clone, Debug, Serialize, Deserialize, Apiv2Schema)]
pub struct ContactResponse {
    pub contact: Contact,
    pub principal: String,
}
