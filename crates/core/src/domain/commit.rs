use serde::{Deserialize, Serialize};

/// A source commit reduced to what is needed to replay it in another repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Original author, formatted as `Name <email>`.
    pub author: String,
    pub message: String,
    /// Raw unified diff of the whole commit, unfiltered.
    pub diff: String,
}

impl Commit {
    pub fn new(
        author_name: &str,
        author_email: &str,
        message: impl Into<String>,
        diff: impl Into<String>,
    ) -> Self {
        Self {
            author: format!("{} <{}>", author_name, author_email),
            message: message.into(),
            diff: diff.into(),
        }
    }
}
