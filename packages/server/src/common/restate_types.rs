//! Shared Restate request types

use serde::{Deserialize, Serialize};

use crate::impl_restate_json;

/// Body of parameterless handlers such as the job state query.
///
/// The ingress is always called with `{}` so the same payload works for
/// shared handlers on any workflow key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmptyRequest {}

impl_restate_json!(EmptyRequest);
