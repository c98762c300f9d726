mod response;
pub use response::{Response, Rows};

pub mod operation;
pub use operation::Operation;

use crate::async_trait;

use std::fmt::Debug;

/// A single physical connection to a relational store.
///
/// The engine issues one operation at a time and awaits each before issuing
/// the next, so implementations need not support concurrent use.
#[async_trait]
pub trait Connection: Debug + Send + 'static {
    /// Execute a database operation
    async fn exec(&mut self, op: Operation) -> crate::Result<Response>;
}

#[async_trait]
impl<C: Connection + ?Sized> Connection for Box<C> {
    async fn exec(&mut self, op: Operation) -> crate::Result<Response> {
        (**self).exec(op).await
    }
}
