pub mod constants;
pub mod crud;
pub mod types;
pub mod validation;

#[cfg(test)]
pub mod test_helpers;
