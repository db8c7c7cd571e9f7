/// Structured information extracted from MongoDB driver errors.
///
/// Cosmos DB reports throttling and authorization problems as command errors
/// with well-known codes; pulling them out keeps per-collection log lines short.
#[derive(Debug, Default, Clone)]
pub struct ErrorInfo {
    pub(crate) error_type: Option<String>,
    pub(crate) code: Option<i32>,
    pub(crate) name: Option<String>,
    pub(crate) message: Option<String>,
}

impl ErrorInfo {
    /// One-line summary: `message (Name, code N)`.
    pub fn summary(&self) -> String {
        let message = self
            .message
            .as_deref()
            .or(self.error_type.as_deref())
            .unwrap_or("unknown error");
        match (&self.name, self.code) {
            (Some(name), Some(code)) => format!("{message} ({name}, code {code})"),
            (None, Some(code)) => format!("{message} (code {code})"),
            _ => message.to_string(),
        }
    }
}

/// Short message for a driver error, used wherever one is wrapped.
pub fn describe(error: &mongodb::error::Error) -> String {
    extract_error_info(error).summary()
}

/// Extract structured information from a MongoDB error using the driver API.
pub fn extract_error_info(error: &mongodb::error::Error) -> ErrorInfo {
    use mongodb::error::ErrorKind;

    let mut info = ErrorInfo::default();

    match error.kind.as_ref() {
        ErrorKind::Command(command_error) => {
            info.error_type = Some("mongo.command_error".to_string());
            info.code = Some(command_error.code);
            info.message = Some(command_error.message.clone());
            info.name = if command_error.code_name.is_empty() {
                get_error_name(command_error.code)
            } else {
                Some(command_error.code_name.clone())
            };
        }
        ErrorKind::Authentication { message, .. } => {
            info.error_type = Some("mongo.authentication_error".to_string());
            info.message = Some(message.clone());
        }
        ErrorKind::InvalidArgument { message, .. } => {
            info.error_type = Some("mongo.invalid_argument".to_string());
            info.message = Some(message.clone());
        }
        ErrorKind::ServerSelection { message, .. } => {
            info.error_type = Some("mongo.server_selection_error".to_string());
            info.message = Some(message.clone());
        }
        ErrorKind::Io(io_error) => {
            info.error_type = Some("mongo.io_error".to_string());
            info.message = Some(io_error.to_string());
        }
        _ => {
            info.message = Some(error.to_string());
        }
    }

    info
}

/// Human-readable name for codes commonly returned by Cosmos DB and MongoDB.
fn get_error_name(code: i32) -> Option<String> {
    let name = match code {
        13 => "Unauthorized",
        18 => "AuthenticationFailed",
        26 => "NamespaceNotFound",
        50 => "MaxTimeMSExpired",
        16500 => "RequestRateTooLarge",
        _ => return None,
    };

    Some(name.to_string())
}
