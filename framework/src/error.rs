use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

pub type AppResult<T = HttpResponse> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthenticated,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_is_401() {
        let err = AppError::Unauthenticated;

        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "Authentication required");
    }
}
