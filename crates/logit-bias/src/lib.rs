//! Token logit-bias maps and request settings for OpenAI-compatible chat
//! completions.
//!
//! A [`BiasMap`] collects `token id → bias` entries in `[-100, 100]`,
//! [`RequestSettings`] carries it next to the usual sampling parameters, and
//! [`LM`] sends both with a [`Chat`] history to a completion provider.
//!
//! ```
//! use logit_bias::{Chat, Message, RequestSettings};
//!
//! let mut settings = RequestSettings::builder().max_tokens(256).temperature(0.7).build();
//! settings.set_logit_bias(3820, -100).unwrap();
//! settings.set_logit_bias(15991, -100).unwrap();
//!
//! let chat = Chat::new(vec![Message::user("Hi, can you help me with sports?")]);
//! let body = serde_json::to_value(settings.to_request(&chat)).unwrap();
//! assert_eq!(body["logit_bias"], serde_json::json!({"3820": -100, "15991": -100}));
//! ```

pub mod core;
pub mod providers;
pub mod utils;

pub use self::core::*;
pub use providers::*;
pub use utils::*;
