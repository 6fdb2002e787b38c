//! HTTP API の DTO

use serde::{Deserialize, Serialize};

use crate::domain::ConnectionId;

/// Response body of `GET /debug/connections`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionListDto {
    pub count: usize,
    pub connections: Vec<String>,
}

impl From<Vec<ConnectionId>> for ConnectionListDto {
    fn from(ids: Vec<ConnectionId>) -> Self {
        Self {
            count: ids.len(),
            connections: ids.iter().map(ToString::to_string).collect(),
        }
    }
}
