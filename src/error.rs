use std::fmt;

#[derive(Debug)]
pub enum CardError {
    InvalidConfiguration(String),
    Asset(String),
    Io(std::io::Error),
}

impl fmt::Display for CardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardError::InvalidConfiguration(message) => {
                write!(f, "invalid configuration: {}", message)
            }
            CardError::Asset(message) => write!(f, "asset error: {}", message),
            CardError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for CardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CardError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CardError {
    fn from(value: std::io::Error) -> Self {
        CardError::Io(value)
    }
}
