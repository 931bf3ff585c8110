//! Data warehouse access.
//!
//! The analytics tools only need one capability: run a SQL string and get a
//! [`Frame`] back. [`Warehouse`] is that seam; [`BigQueryClient`] is the
//! production implementation.

pub mod auth;
pub mod bigquery;

use async_trait::async_trait;

use crate::error::Result;
use crate::frame::Frame;

pub use auth::{Credentials, TokenSource};
pub use bigquery::BigQueryClient;

/// Something that can execute a SQL query.
#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn query(&self, sql: &str) -> Result<Frame>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    type Responder = Box<dyn Fn(&str) -> Result<Frame> + Send + Sync>;

    /// In-memory warehouse: answers via a closure and records every query.
    pub struct FakeWarehouse {
        responder: Responder,
        queries: Mutex<Vec<String>>,
    }

    impl FakeWarehouse {
        pub fn new<F>(responder: F) -> Self
        where
            F: Fn(&str) -> Result<Frame> + Send + Sync + 'static,
        {
            Self {
                responder: Box::new(responder),
                queries: Mutex::new(Vec::new()),
            }
        }

        pub fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Warehouse for FakeWarehouse {
        async fn query(&self, sql: &str) -> Result<Frame> {
            self.queries.lock().unwrap().push(sql.to_string());
            (self.responder)(sql)
        }
    }
}
