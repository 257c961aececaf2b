//! Listing of games available for download from a remote catalog.
//!
//! Only the contract exists; nothing in the launcher fetches from it yet.
#![allow(dead_code)]

use serde::Deserialize;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteGameSummary {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

pub trait RemoteCatalog {
    fn fetch_available(&self) -> Result<Vec<RemoteGameSummary>>;
}

pub struct HttpRemoteCatalog {
    endpoint: String,
}

impl HttpRemoteCatalog {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into() }
    }
}

impl RemoteCatalog for HttpRemoteCatalog {
    fn fetch_available(&self) -> Result<Vec<RemoteGameSummary>> {
        log::debug!("Remote catalog requested from {}, not implemented", self.endpoint);
        Err(Error::RemoteUnavailable { endpoint: self.endpoint.clone() })
    }
}
