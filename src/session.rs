//! MCP session management.
//!
//! Owns the catalog client handle and the cached custom-metadata type
//! directory. The client's lifecycle belongs to the hosting process; tools
//! receive the session by reference and hold no state of their own.

use std::sync::{Arc, RwLock};

use crate::client::CatalogClient;
use crate::error::Result;
use crate::typedefs::TypeDirectory;

/// Session state shared across tool invocations.
///
/// The type directory is read-mostly advisory metadata: lazily populated on
/// first use and refreshable on demand. Redundant concurrent refreshes are
/// harmless (last write wins).
pub struct CatalogSession {
    client: CatalogClient,
    type_directory: RwLock<Option<Arc<TypeDirectory>>>,
}

impl CatalogSession {
    /// Create a session around an authenticated client.
    pub fn new(client: CatalogClient) -> Self {
        Self {
            client,
            type_directory: RwLock::new(None),
        }
    }

    /// The catalog client.
    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    /// The custom-metadata type directory, fetching it on first use.
    ///
    /// A failed fetch is logged and yields an empty directory without being
    /// cached, so dotted attribute names degrade to not-found for this
    /// invocation and the next invocation retries.
    pub fn type_directory(&self) -> Arc<TypeDirectory> {
        if let Some(directory) = self.type_directory.read().expect("directory lock").as_ref() {
            return Arc::clone(directory);
        }

        match self.fetch_type_directory() {
            Ok(directory) => {
                let directory = Arc::new(directory);
                *self.type_directory.write().expect("directory lock") =
                    Some(Arc::clone(&directory));
                directory
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch custom-metadata typedefs");
                Arc::new(TypeDirectory::empty())
            }
        }
    }

    /// Force-refresh the type directory from the catalog.
    pub fn refresh_type_directory(&self) -> Result<Arc<TypeDirectory>> {
        let directory = Arc::new(self.fetch_type_directory()?);
        *self.type_directory.write().expect("directory lock") = Some(Arc::clone(&directory));
        Ok(directory)
    }

    fn fetch_type_directory(&self) -> Result<TypeDirectory> {
        let business_metadata = self.client.typedefs("BUSINESS_METADATA")?;
        let enums = self.client.typedefs("ENUM")?;
        Ok(TypeDirectory::from_typedefs(&business_metadata, &enums))
    }
}
