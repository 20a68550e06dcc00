//! # resultschema
//!
//! Normalize the JSON documents a resource provider writes to stdout.
//!
//! A provider answers get, set and test with either a *simple* result (the
//! state of one instance) or a *full* result (name, type and metadata around
//! a simple result, or around an array of further full results for group
//! and adapter resources). The shape is decided by one probe: a `name`
//! property at the document root.
//!
//! ## Example
//!
//! ```
//! use resultschema::parse_test;
//!
//! let doc = parse_test(r#"{
//!     "name": "web", "type": "Microsoft.DSC/Group",
//!     "result": [
//!         {"name": "a", "type": "Test/Echo", "result":
//!             {"desiredState": {}, "actualState": {}, "inDesiredState": true, "differingProperties": []}},
//!         {"name": "b", "type": "Test/Echo", "result":
//!             {"desiredState": {"v": 1}, "actualState": {"v": 2}, "inDesiredState": false, "differingProperties": ["v"]}}
//!     ]
//! }"#.replace('\n', " ").as_str()).unwrap();
//!
//! assert!(!doc.in_desired_state());
//! assert_eq!(doc.differing_properties(), vec!["v"]);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod parse;
pub mod types;

pub use error::{Error, Result};
pub use parse::{decode_output, parse_document, parse_get, parse_result, parse_set, parse_test, parse_value};
pub use types::{
    FullPayload, FullResult, GetResult, GetSimpleResult, OperationKind, OperationResult,
    ResultDocument, SetResult, SetSimpleResult, SimpleShape, TestResult, TestSimpleResult,
};
