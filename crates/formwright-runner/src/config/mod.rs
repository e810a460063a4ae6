pub mod answers;
pub mod fields;
pub mod schema;
pub mod validate;

pub use answers::{AnswerMap, AnswerValue};
pub use fields::{
    BooleanChoices, FieldDescriptor, FieldKind, FormSchema, MatchMode, RepeatableGroup, Transition,
};
pub use schema::{BrowserConfig, Config, OnFailure, TargetUrl, Timeouts, Viewport};
pub use validate::{validate, SchemaError};
