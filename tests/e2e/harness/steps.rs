use super::assertions::{Assertion, ErrorMatch};
use folio_core::DocumentFields;
use std::time::Duration;

/// What a step is expected to produce.
#[derive(Debug, Clone, Default)]
pub enum Expect {
    #[default]
    Ok,
    Err(ErrorMatch),
}

/// A change applied on top of the last version of a document the scenario saw.
#[derive(Debug, Clone)]
pub enum Edit {
    AddTag(String),
    SetTags(Vec<String>),
    SetTitle(String),
    SetBody(String),
    SetAuthor(String),
    MarkDraft,
    Publish,
    Nothing,
}

impl Edit {
    pub fn apply(&self, fields: &mut DocumentFields) {
        match self {
            Edit::AddTag(tag) => fields.tags.push(tag.clone()),
            Edit::SetTags(tags) => fields.tags = tags.clone(),
            Edit::SetTitle(title) => fields.title = title.clone(),
            Edit::SetBody(body) => fields.body = body.clone(),
            Edit::SetAuthor(author) => fields.author = author.clone(),
            Edit::MarkDraft => fields.published = false,
            Edit::Publish => fields.published = true,
            Edit::Nothing => {}
        }
    }
}

/// Individual steps in a scenario
#[derive(Debug)]
pub enum ScenarioStep {
    // Document operations (aliases name documents, hash names name versions)
    Create {
        alias: String,
        fields: DocumentFields,
        expect: Expect,
    },
    Get {
        alias: String,
        save_hash_as: String,
        expect: Expect,
    },
    GetPath {
        path: String,
        expect: Expect,
    },
    Open {
        alias: String,
        path: String,
        save_hash_as: String,
        expect: Expect,
    },
    Update {
        alias: String,
        edit: Edit,
        with_hash: String,
        save_hash_as: String,
        expect: Expect,
    },
    Rename {
        alias: String,
        edit: Edit,
        with_hash: String,
        save_hash_as: String,
        expect: Expect,
    },
    Delete {
        alias: String,
        with_hash: String,
        expect: Expect,
    },

    // Someone else edits the blob directly in the store
    ExternalEdit {
        alias: String,
        content: Vec<u8>,
    },

    // Assets
    Upload {
        name: String,
        bytes: Vec<u8>,
        expect: Expect,
    },

    // Identity
    ActAs {
        identity: String,
    },

    // Time control
    Advance {
        duration: Duration,
    },

    // Failure simulation (in-memory store only)
    FailNextStoreCalls {
        count: u32,
    },

    // Verification
    Assert {
        assertion: Assertion,
    },
}

impl ScenarioStep {
    /// Sets the expected outcome, if this step has one.
    pub fn set_expect(&mut self, outcome: Expect) -> bool {
        match self {
            ScenarioStep::Create { expect, .. }
            | ScenarioStep::Get { expect, .. }
            | ScenarioStep::GetPath { expect, .. }
            | ScenarioStep::Open { expect, .. }
            | ScenarioStep::Update { expect, .. }
            | ScenarioStep::Rename { expect, .. }
            | ScenarioStep::Delete { expect, .. }
            | ScenarioStep::Upload { expect, .. } => {
                *expect = outcome;
                true
            }
            _ => false,
        }
    }
}
