use folio_core::FolioError;

/// Declarative assertions on store state
#[derive(Debug, Clone)]
pub enum Assertion {
    // Single documents
    DocumentPath { alias: String, path: String },
    DocumentExists { alias: String },
    DocumentMissing { alias: String },
    BodyEquals { alias: String, body: String },
    TagsEqual { alias: String, tags: Vec<String> },
    CurrentHashIs { alias: String, hash: String },
    HashesDiffer { a: String, b: String },

    // Raw store content
    RawContains { store_path: String, text: String },
    RawLacks { store_path: String, text: String },
    BlobMissing { store_path: String },

    // Listing
    ListingOrder(Vec<String>),
    ListingLen(usize),
    ListedAsMalformed { path: String },
    DraftCount(usize),

    // Index
    TagsExactly(Vec<String>),
    AuthorsExactly(Vec<String>),
    PathsForTag { tag: String, paths: Vec<String> },

    // Assets
    AssetNames(Vec<String>),
    LastUploadUrl(String),

    // In-memory store bookkeeping
    StoreCalls(u64),
}

/// Match against error kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorMatch {
    NotFound,
    AlreadyExists,
    Conflict,
    InvalidInput,
    Malformed,
    AccessDenied,
    Transient,
}

impl ErrorMatch {
    pub fn matches(&self, err: &FolioError) -> bool {
        matches!(
            (self, err),
            (ErrorMatch::NotFound, FolioError::NotFound(_))
                | (ErrorMatch::AlreadyExists, FolioError::AlreadyExists(_))
                | (ErrorMatch::Conflict, FolioError::Conflict { .. })
                | (ErrorMatch::InvalidInput, FolioError::InvalidInput(_))
                | (ErrorMatch::Malformed, FolioError::MalformedDocument { .. })
                | (ErrorMatch::AccessDenied, FolioError::AccessDenied(_))
                | (ErrorMatch::Transient, FolioError::Transient(_))
        )
    }
}
