//! Declared JSON body schemas for signed endpoints.
//!
//! A JSON body only contributes to the canonical message when its endpoint
//! registered the body type here. Unregistered bodies contribute nothing.

use crate::services::canonical::{ParameterEntry, SignableBody};
use actix_web::http::Method;
use serde::de::DeserializeOwned;
use std::{collections::HashMap, sync::Arc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("body does not match declared schema: {0}")]
    Decode(#[from] serde_json::Error),
}

type BodyDecoder = Arc<dyn Fn(&[u8]) -> Result<Vec<ParameterEntry>, SchemaError> + Send + Sync>;

/// `(method, lowercased path)` to body decoder
#[derive(Clone, Default)]
pub struct BodySchemaRegistry {
    schemas: HashMap<(Method, String), BodyDecoder>,
}

impl BodySchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare that `method path` carries a JSON body of type `T`.
    pub fn register<T>(mut self, method: Method, path: &str) -> Self
    where
        T: SignableBody + DeserializeOwned + 'static,
    {
        let decoder: BodyDecoder = Arc::new(|body: &[u8]| {
            let value: T = serde_json::from_slice(body)?;
            Ok(value.signable_fields())
        });
        self.schemas.insert((method, path.to_lowercase()), decoder);
        self
    }

    /// Decode `body` with the schema declared for the endpoint, if any.
    pub fn decode(
        &self,
        method: &Method,
        path: &str,
        body: &[u8],
    ) -> Option<Result<Vec<ParameterEntry>, SchemaError>> {
        self.schemas
            .get(&(method.clone(), path.to_lowercase()))
            .map(|decoder| decoder(body))
    }
}
