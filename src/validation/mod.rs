//! Lint for state tree definitions.
//!
//! Uses Stillwater's `Validation` type to report every issue in one pass
//! instead of stopping at the first.
//!
//! # Example
//!
//! ```rust
//! use statepath::builder::simple_transition;
//! use statepath::core::{State, StateTree};
//! use statepath::validation::{validate, DefinitionIssue};
//! use stillwater::validation::Validation;
//!
//! let tree = StateTree::new(vec![
//!     State::new("a").transition(simple_transition("go", "b")),
//!     State::new("a"),
//! ]);
//!
//! match validate(&tree) {
//!     Validation::Failure(issues) => assert_eq!(issues.len(), 2),
//!     Validation::Success(_) => panic!("expected issues"),
//! }
//! ```

mod issues;

pub use issues::DefinitionIssue;

use crate::core::{StateId, StateTree};
use std::collections::HashSet;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

type Check = Validation<(), NonEmptyVec<DefinitionIssue>>;

fn ok() -> Check {
    Validation::success(())
}

fn issue(issue: DefinitionIssue) -> Check {
    Validation::fail(issue)
}

/// Check the whole tree, accumulating ALL issues.
pub fn validate(tree: &StateTree) -> Check {
    let mut checks: Vec<Check> = Vec::new();

    checks.extend(sibling_checks(tree, "", tree.roots()));

    for (id, node) in tree.iter() {
        let full_name = tree.full_name(id);
        checks.extend(sibling_checks(tree, &full_name, node.children()));

        for transition in node.state().transitions() {
            checks.push(if transition.event_types().iter().any(String::is_empty) {
                issue(DefinitionIssue::EmptyEventType {
                    state: full_name.clone(),
                })
            } else {
                ok()
            });

            checks.push(if tree.resolve(transition.target()).is_empty() {
                issue(DefinitionIssue::UnknownTarget {
                    state: full_name.clone(),
                    target: transition.target().to_string(),
                })
            } else {
                ok()
            });
        }
    }

    Validation::all_vec(checks).map(|_| ())
}

fn sibling_checks(tree: &StateTree, parent: &str, siblings: &[StateId]) -> Vec<Check> {
    let mut seen = HashSet::new();
    siblings
        .iter()
        .filter_map(|&id| tree.node(id))
        .map(|node| {
            let name = node.name();
            if name.is_empty() {
                issue(DefinitionIssue::EmptyName {
                    parent: parent.to_string(),
                })
            } else if name.contains('.') {
                issue(DefinitionIssue::DottedName {
                    name: name.to_string(),
                })
            } else if !seen.insert(name) {
                issue(DefinitionIssue::DuplicateSibling {
                    parent: parent.to_string(),
                    name: name.to_string(),
                })
            } else {
                ok()
            }
        })
        .collect()
}
