//! This module holds the configuration for the server

use std::net::IpAddr;

use actix_toolbox::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

use crate::graph::PageLimits;

/// Configuration regarding the server
#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct ServerConfig {
    /// The address the server should bind to
    pub listen_address: IpAddr,
    /// The port the server should bind to
    pub listen_port: u16,
    /// Base64 encoded key used to sign session cookies, at least 64 bytes
    pub secret_key: String,
}

/// Configuration regarding the database
#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct DBConfig {
    /// Host of the postgres server
    pub host: String,
    /// Port of the postgres server
    pub port: u16,
    /// Name of the database
    pub name: String,
    /// User to connect with
    pub user: String,
    /// Password of the user
    pub password: String,
}

/// Configuration of the relationship listings
#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct RelationshipConfig {
    /// Page size used if a request doesn't specify one
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    /// Largest page size a request may specify
    #[serde(default = "max_page_size")]
    pub max_page_size: u64,
}

fn default_page_size() -> u64 {
    PageLimits::default().default_limit
}

fn max_page_size() -> u64 {
    PageLimits::default().max_limit
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: max_page_size(),
        }
    }
}

impl RelationshipConfig {
    /// Convert to the bounds the graph validates listings against.
    ///
    /// The default page size is clamped into `1..=max_page_size`.
    pub fn page_limits(&self) -> PageLimits {
        let max_limit = self.max_page_size.max(1);
        PageLimits {
            default_limit: self.default_page_size.clamp(1, max_limit),
            max_limit,
        }
    }
}

/// This struct can be parsed from the configuration file
#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    /// Configuration regarding the server
    pub server: ServerConfig,
    /// Configuration regarding the database
    pub database: DBConfig,
    /// Configuration of the relationship listings
    #[serde(default)]
    pub relationships: RelationshipConfig,
    /// The logging configuration
    pub logging: LoggingConfig,
}
