use thiserror::Error;
use zam_core::ParseError;
use zam_store::StoreError;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("not found: {url}")]
    NotFound { url: String },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Connection failures and timeouts.
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("could not parse malformed TSV line: {0:?}")]
    MalformedLine(String),

    /// Upstream document is well-formed but lacks an expected field.
    #[error("unexpected upstream data: {0}")]
    Invalid(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("organe {0} not found in data")]
    OrganeNotFound(String),

    #[error("a fetch is already running for lecture {0}")]
    AlreadyRunning(i64),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    /// Errors the AN detail endpoint produces for missing, abandoned or
    /// unreachable amendements. They are all treated as "not found".
    pub fn is_not_found(&self) -> bool {
        match self {
            FetchError::NotFound { .. } | FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => *status == 404 || *status == 500,
            _ => false,
        }
    }
}

/// A user-initiated batch operation that cannot be applied.
///
/// The messages are shown to users as-is.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Tous les amendements doivent être sur votre table pour pouvoir les associer.")]
    NotOnUserTable,

    #[error(
        "Tous les amendements doivent avoir les mêmes réponses et commentaires avant de pouvoir être associés."
    )]
    DifferentResponses,

    #[error("Tous les amendements doivent être relatifs au même article pour pouvoir être associés.")]
    DifferentArticles,

    #[error("Tous les amendements doivent être relatifs à la même mission pour pouvoir être associés.")]
    DifferentMissions,

    #[error("Aucun amendement à associer.")]
    Empty,

    #[error("Il faut au moins deux amendements pour former un lot.")]
    TooFew,

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_class() {
        let url = "http://example.com/x.xml".to_string();
        assert!(FetchError::NotFound { url: url.clone() }.is_not_found());
        assert!(FetchError::Status { url: url.clone(), status: 500 }.is_not_found());
        assert!(
            FetchError::Transport {
                url: url.clone(),
                message: "timed out".into()
            }
            .is_not_found()
        );
        assert!(!FetchError::Status { url, status: 403 }.is_not_found());
        assert!(!FetchError::MalformedLine("a\tb".into()).is_not_found());
    }

    #[test]
    fn batch_messages_are_user_facing() {
        assert_eq!(
            BatchError::DifferentArticles.to_string(),
            "Tous les amendements doivent être relatifs au même article pour pouvoir être associés."
        );
    }
}
