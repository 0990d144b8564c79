//! Errors that fail an admission request.
//!
//! Merge conflicts are deliberately absent: they are reported through
//! [`crate::merge::Conflicts`] and never fail a request.

use kube::core::admission::SerializePatchError;
use thiserror::Error;

use crate::admission::LookupError;
use crate::selector::SelectorError;

/// AdmissionError is a fatal error while handling one admission request.
#[derive(Debug, Error)]
pub enum AdmissionError {
    /// The request carries no object to admit.
    #[error("admission request carries no object")]
    MissingObject,

    /// The request object is not a decodable pod.
    #[error("decoding pod: {0}")]
    Decode(#[source] serde_json::Error),

    /// The presets in scope could not be listed.
    #[error("retrieving list of PodPresets: {0}")]
    Lookup(#[from] LookupError),

    /// A stored preset carries a selector that cannot be evaluated.
    #[error("label selector conversion failed for preset {preset}: {source}")]
    Selector {
        preset: String,
        #[source]
        source: SelectorError,
    },

    /// The mutated pod could not be encoded.
    #[error("encoding pod: {0}")]
    Encode(#[source] serde_json::Error),

    /// The JSON patch could not be attached to the response.
    #[error("encoding patch: {0}")]
    Patch(#[from] SerializePatchError),
}

impl AdmissionError {
    /// Returns the HTTP status reported to the API server.
    ///
    /// Only a malformed request is the submitter's fault; everything else
    /// points at the injector or its stored presets.
    pub fn status_code(&self) -> u16 {
        match self {
            AdmissionError::MissingObject | AdmissionError::Decode(_) => 400,
            AdmissionError::Lookup(_)
            | AdmissionError::Selector { .. }
            | AdmissionError::Encode(_)
            | AdmissionError::Patch(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let decode = serde_json::from_str::<u8>("x").unwrap_err();
        assert_eq!(AdmissionError::Decode(decode).status_code(), 400);
        assert_eq!(AdmissionError::MissingObject.status_code(), 400);

        let lookup = LookupError::new("shop", "connection refused");
        assert_eq!(AdmissionError::from(lookup).status_code(), 500);

        let selector = AdmissionError::Selector {
            preset: "p".to_string(),
            source: SelectorError::InvalidKey {
                key: String::new(),
                reason: "name part must be non-empty",
            },
        };
        assert_eq!(selector.status_code(), 500);
        assert!(selector.to_string().contains("preset p"));
    }
}
