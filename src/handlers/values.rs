//! City endpoints, signed with query-string and form parameters.

use crate::models::{City, CityQuery, CityResponse, Principal};
use actix_web::{Error, HttpMessage, HttpRequest, Result, web};
use paperclip::actix::api_v2_operation;
use std::sync::Mutex;

/// In-memory list of cities posted by clients
#[derive(Debug, Default)]
pub struct CityDirectory {
    cities: Mutex<Vec<City>>,
}

impl CityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the city with the same ICAO code
    pub fn upsert(&self, city: City) {
        let mut cities = match self.cities.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cities.retain(|c| !c.icao_code.eq_ignore_ascii_case(&city.icao_code));
        cities.push(city);
    }

    pub fn find(&self, icao_code: Option<&str>) -> Vec<City> {
        let cities = match self.cities.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        cities
            .iter()
            .filter(|c| icao_code.is_none_or(|code| c.icao_code.eq_ignore_ascii_case(code)))
            .cloned()
            .collect()
    }
}

/// Username of the authenticated caller, as set by the authentication middleware
pub(crate) fn principal_name(req: &HttpRequest) -> String {
    req.extensions()
        .get::<Principal>()
        .map(|p| p.username.clone())
        .unwrap_or_default()
}

fn directory(req: &HttpRequest) -> Result<web::Data<CityDirectory>, Error> {
    req.app_data::<web::Data<CityDirectory>>()
        .cloned()
        .ok_or_else(|| actix_web::error::ErrorServiceUnavailable("City directory not available"))
}

/// List cities, optionally filtered by ICAO code
#[api_v2_operation(
    summary = "List Cities",
    description = "Returns known cities. Sign the query string parameters.",
    tags("Values"),
    responses(
        (status = 200, description = "Matching cities", body = CityResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_cities(
    req: HttpRequest,
    query: web::Query<CityQuery>,
) -> Result<web::Json<CityResponse>, Error> {
    let cities = directory(&req)?.find(query.icao_code.as_deref());

    Ok(web::Json(CityResponse {
        accepted: true,
        cities,
        principal: principal_name(&req),
    }))
}

/// Post a city as a form
#[api_v2_operation(
    summary = "Post City",
    description = "Stores a city posted as `application/x-www-form-urlencoded`. Sign the form fields.",
    tags("Values"),
    responses(
        (status = 200, description = "City stored", body = CityResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn post_city(
    req: HttpRequest,
    form: web::Form<City>,
) -> Result<web::Json<CityResponse>, Error> {
    let city = form.into_inner();
    let principal = principal_name(&req);
    tracing::info!(icao_code = %city.icao_code, %principal, "city posted");

    directory(&req)?.upsert(city.clone());

    Ok(web::Json(CityResponse {
        accepted: true,
        cities: vec![city],
        principal,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(code: &str, name: &str) -> City {
        City {
            icao_code: code.to_string(),
            city_short_name: name.to_string(),
        }
    }

    #[test]
    fn test_upsert_replaces_same_code() {
        let directory = CityDirectory::new();
        directory.upsert(city("ZPWS", "Wenshan"));
        directory.upsert(city("zpws", "文山"));
        directory.upsert(city("ZUUU", "Chengdu"));

        assert_eq!(directory.find(None).len(), 2);
        assert_eq!(directory.find(Some("ZPWS")), vec![city("zpws", "文山")]);
        assert!(directory.find(Some("KJFK")).is_empty());
    }
}
