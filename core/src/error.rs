use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Cell is already occupied")]
    CellOccupied,
    #[error("Given cells cannot be edited")]
    GivenCell,
    #[error("No cell is selected")]
    NoSelection,
    #[error("Value is outside the allowed range")]
    InvalidValue,
    #[error("It is not this player's turn")]
    NotYourTurn,
    #[error("Node does not exist in the graph")]
    UnknownNode,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
}

pub type Result<T> = core::result::Result<T, GameError>;
