use thiserror::Error;

/// Failures a single class transform can surface to the driver.
///
/// None of these are recovered internally; the driver reports the failure
/// for that class and carries on with the rest.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("class '{class}' already declares reserved member '{member}'")]
    ReservedMemberCollision { class: String, member: String },

    #[error("class '{class}' was already transformed (digest {digest})")]
    AlreadyTransformed { class: String, digest: String },

    #[error("class '{class}' was incorrectly formatted (reason: {reason})")]
    ClassFileFormat { class: String, reason: String },
}
