#[derive(Debug, thiserror::Error)]
pub enum FleetSimError {
    #[error("{0}")]
    Config(String),
}
