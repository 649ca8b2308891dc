//! Topic address

use serde::{Deserialize, Serialize};
use std::fmt;

/// Destination identifier of the pub/sub topic
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicAddress(String);

impl TopicAddress {
    /// Build an SNS-style ARN from its parts
    pub fn new(region: &str, account_id: &str, topic_name: &str) -> Self {
        Self(format!("arn:aws:sns:{}:{}:{}", region, account_id, topic_name))
    }

    /// Use a fully-formed address as-is
    pub fn from_arn(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
