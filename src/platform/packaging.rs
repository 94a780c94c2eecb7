use serde::Serialize;

/// The four artifact flavors a run can produce instead of (or in addition
/// to) a live service.
#[derive(Debug, Serialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum PackagingMode {
    Docker,
    FunctionBlob,
    FunctionHttp,
    FunctionServiceBusQueue,
}

impl PackagingMode {
    /// Parses the `create_image` parameter value. The parameters schema
    /// constrains the field to these four spellings.
    pub fn parse(mode: &str) -> Option<Self> {
        match mode {
            "docker" => Some(Self::Docker),
            "function_blob" => Some(Self::FunctionBlob),
            "function_http" => Some(Self::FunctionHttp),
            "function_service_bus_queue" => Some(Self::FunctionServiceBusQueue),
            _ => None,
        }
    }

    /// Whether this mode produces a cloud-function package with bound triggers.
    pub fn is_function(&self) -> bool {
        !matches!(self, Self::Docker)
    }
}

/// Parameters of one packaging operation.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PackagingRequest {
    pub mode: PackagingMode,
    /// Input binding location for blob/queue triggered functions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_path: Option<String>,
    /// Output binding location for blob/queue triggered functions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,
}
