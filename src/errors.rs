use crate::contract::ContractError;
use crate::registry::RegistryError;
use crate::transaction::failure_message;
use axum::http::StatusCode;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }

    pub fn wallet_required() -> Self {
        Self::unauthorized("Please connect your wallet first!")
    }
}

pub fn contract_status(err: &ContractError) -> StatusCode {
    match err {
        ContractError::AlreadyCheckedIn => StatusCode::CONFLICT,
        ContractError::UserRejected
        | ContractError::InsufficientFee { .. }
        | ContractError::HabitLimitReached(_)
        | ContractError::InvalidHabit(_) => StatusCode::BAD_REQUEST,
        ContractError::HabitNotFound(_) => StatusCode::NOT_FOUND,
        ContractError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ContractError::Reverted(_) | ContractError::Transport(_) => StatusCode::BAD_GATEWAY,
    }
}

impl From<ContractError> for AppError {
    fn from(err: ContractError) -> Self {
        Self::new(contract_status(&err), failure_message(&err))
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::NotFound(_) => Self::not_found(err.to_string()),
            RegistryError::LastHabit => Self::bad_request(err.to_string()),
            RegistryError::Storage(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            RegistryError::Contract(err) => err.into(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
