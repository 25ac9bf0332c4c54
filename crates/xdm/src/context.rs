//! Evaluation settings that values consult but never store: the implicit
//! timezone used to order date/time values and the collations used for
//! string comparison.

use crate::collation::{Collation, CollationRegistry};
use crate::consts::CODEPOINT_URI;
use crate::error::Error;
use crate::temporal::TzOffset;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct XdmContext {
    implicit_timezone: TzOffset,
    default_collation: Arc<dyn Collation>,
    collations: Arc<CollationRegistry>,
}

impl Default for XdmContext {
    fn default() -> Self {
        let collations = Arc::new(CollationRegistry::default());
        let default_collation: Arc<dyn Collation> =
            Arc::new(crate::collation::CodepointCollation);
        Self {
            implicit_timezone: TzOffset::local(),
            default_collation,
            collations,
        }
    }
}

impl XdmContext {
    pub fn builder() -> XdmContextBuilder {
        XdmContextBuilder::new()
    }

    pub fn implicit_timezone(&self) -> TzOffset {
        self.implicit_timezone
    }

    pub fn default_collation(&self) -> &dyn Collation {
        self.default_collation.as_ref()
    }

    /// Resolves `uri`, or the default collation when `None`.
    pub fn collation(&self, uri: Option<&str>) -> Result<Arc<dyn Collation>, Error> {
        match uri {
            Some(u) => self.collations.resolve(u),
            None => Ok(self.default_collation.clone()),
        }
    }

    pub fn collations(&self) -> &CollationRegistry {
        &self.collations
    }
}

/// Builder for [`XdmContext`].
///
/// Defaults: implicit timezone is the host's local offset at build time,
/// default collation is the Unicode codepoint collation.
pub struct XdmContextBuilder {
    implicit_timezone: Option<i32>,
    default_collation: String,
    collations: CollationRegistry,
}

impl Default for XdmContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl XdmContextBuilder {
    pub fn new() -> Self {
        Self {
            implicit_timezone: None,
            default_collation: CODEPOINT_URI.to_string(),
            collations: CollationRegistry::default(),
        }
    }

    /// Offset east of UTC in minutes.
    pub fn with_implicit_timezone(mut self, offset_minutes: i32) -> Self {
        self.implicit_timezone = Some(offset_minutes);
        self
    }

    pub fn with_default_collation(mut self, uri: impl Into<String>) -> Self {
        self.default_collation = uri.into();
        self
    }

    /// Register an additional collation under its own URI.
    pub fn with_collation(mut self, collation: Arc<dyn Collation>) -> Self {
        self.collations.insert(collation);
        self
    }

    /// Fails with `FODT0003` for an offset beyond ±14:00 and `FOCH0002`
    /// for an unregistered default collation.
    pub fn try_build(self) -> Result<XdmContext, Error> {
        let implicit_timezone = match self.implicit_timezone {
            Some(m) => TzOffset::new(m)?,
            None => TzOffset::local(),
        };
        let default_collation = self.collations.resolve(&self.default_collation)?;
        tracing::debug!(
            implicit_timezone = %implicit_timezone,
            collation = default_collation.uri(),
            "xdm context built"
        );
        Ok(XdmContext {
            implicit_timezone,
            default_collation,
            collations: Arc::new(self.collations),
        })
    }
}
