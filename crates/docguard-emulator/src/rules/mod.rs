//! Rule layer: declarative rule table + evaluator.
//!
//! The table maps `(collection, operation kind)` to a tagged [`Rule`]; the
//! evaluator looks the entry up and runs one dispatch routine over it. Deny is
//! a normal return value; only requests that make no sense (unknown
//! collection) come back as errors.

pub mod evaluator;
pub mod rule;
pub mod table;

pub use evaluator::{Decision, DocumentLookup, Evaluator, NoLookup};
pub use rule::Rule;
pub use table::{CollectionRules, RuleTable};
