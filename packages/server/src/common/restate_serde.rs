//! JSON bridge for Restate handler payloads.
//!
//! Restate handlers (de)serialize through `restate_sdk::serde` rather than
//! `serde`. Every request, response and state value of the job workflow is
//! plain JSON, so the bridge is generated from the serde derives.

/// Implement the Restate payload traits for one or more serde types.
///
/// ```ignore
/// #[derive(serde::Serialize, serde::Deserialize)]
/// pub struct Ping {}
///
/// impl_restate_json!(Ping);
/// ```
#[macro_export]
macro_rules! impl_restate_json {
    ($($type:ty),+ $(,)?) => {
        $(
            impl restate_sdk::serde::Serialize for $type {
                type Error = serde_json::Error;

                fn serialize(&self) -> Result<bytes::Bytes, Self::Error> {
                    serde_json::to_vec(self).map(bytes::Bytes::from)
                }
            }

            impl restate_sdk::serde::Deserialize for $type {
                type Error = serde_json::Error;

                fn deserialize(bytes: &mut bytes::Bytes) -> Result<Self, Self::Error> {
                    serde_json::from_slice(bytes)
                }
            }

            impl restate_sdk::serde::WithContentType for $type {
                fn content_type() -> &'static str {
                    "application/json"
                }
            }
        )+
    };
}
