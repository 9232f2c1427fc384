use serde::Serialize;

use crate::snapshot::SnapshotNode;

/// A snapshot entry whose text contains the searched string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TextMatch {
    pub text: String,
    /// Top-level ancestor key.
    pub root_parent: Option<String>,
    /// Immediate parent key.
    pub current_parent: Option<String>,
}

impl TextMatch {
    pub fn root_token(&self) -> Option<String> {
        self.root_parent.as_deref().and_then(first_token)
    }

    pub fn scope_token(&self) -> Option<String> {
        self.current_parent.as_deref().and_then(first_token)
    }
}

fn first_token(value: &str) -> Option<String> {
    value.split(' ').next().map(str::to_string)
}

/// Case-insensitive substring search over every key and string leaf.
pub fn find_elements_by_text(snapshot: &SnapshotNode, text: &str) -> Vec<TextMatch> {
    let search = text.to_lowercase();
    let mut matches = Vec::new();
    snapshot.walk(&mut |candidate, root, current| {
        if candidate.to_lowercase().contains(&search) {
            matches.push(TextMatch {
                text: candidate.to_string(),
                root_parent: root.map(str::to_string),
                current_parent: current.map(str::to_string),
            });
        }
    });
    matches
}
