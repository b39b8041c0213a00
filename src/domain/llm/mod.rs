//! Model invocation capability

mod invoker;

pub use invoker::ModelInvoker;

#[cfg(test)]
pub use invoker::mock::MockModelInvoker;
