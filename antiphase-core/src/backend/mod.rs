pub mod mediator;
pub mod simulated;
pub mod synthetic;

#[cfg(test)]
pub(crate) mod test_support;
