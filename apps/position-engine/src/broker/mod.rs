//! Broker retry policy and HTTP status classes, shared by the retrying
//! gateway decorator and the broker adapters.

mod retry;

pub use retry::{Backoff, BrokerRetryPolicy, HttpStatusClass};
