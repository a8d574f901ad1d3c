/// Basic error types.
#[derive(Debug)]
pub enum RpcError {
    /// TryFromSliceError from the std library.
    TryFromSlice(std::array::TryFromSliceError),
    /// Utf8/codepage decoding failure from the std library.
    TryFromUtf8(std::string::FromUtf8Error),
    /// IoError from the std library.
    StdIoError(std::io::Error),
    /// Header block length problems (every block must be 128 bytes).
    HeaderBlockLength { l: usize },
    /// File is too short to hold the header it claims to have.
    FileTooShort,
    /// File is too short for the data section its header describes.
    IncompleteDataSection { have: usize, need: usize },
    /// A mandatory header field is missing.
    MissingField { name: String },
    /// A header field could not be parsed as the type it is supposed to have.
    InvalidFieldValue { name: String, raw: String },
    /// Enum creation error (DATA_TYPE or similar).
    ParseEnum { f: String, code: String },
    /// Channel index out of bounds.
    ChannelNotFound { i: usize },
    /// Channel name was not found when aggregating events.
    ChannelNameNotFound { name: String },
    /// Data length does not match CHANNELS * FRAMES * PTS_PER_FRAME.
    BadDataVector { have: usize, need: usize },
    /// Rainflow reversal concatenation found a genuinely repeated endpoint.
    RepeatedEndpoint,
    /// Equivalent-signal construction was asked for zero blocks or non-positive
    /// minimum cycle count.
    InvalidEquivalentSignalParams { msg: String },
    /// A numeric value could not be converted to the requested representation.
    NumericConversion { msg: String },
}

impl From<std::array::TryFromSliceError> for RpcError {
    fn from(e: std::array::TryFromSliceError) -> Self {
        Self::TryFromSlice(e)
    }
}

impl From<std::io::Error> for RpcError {
    fn from(e: std::io::Error) -> Self {
        Self::StdIoError(e)
    }
}

impl From<std::string::FromUtf8Error> for RpcError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        Self::TryFromUtf8(e)
    }
}

impl std::fmt::Display for RpcError {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use self::RpcError::*;
        match self {
            TryFromSlice(x) => write!(fmt, "{}", x),
            TryFromUtf8(x) => write!(fmt, "{}", x),
            StdIoError(x) => write!(fmt, "{}", x),
            HeaderBlockLength { l } => write!(fmt, "Header block length should be 128 but is {}", l),
            FileTooShort => write!(fmt, "File is too short to be an RPC-III file"),
            IncompleteDataSection { have, need } => write!(
                fmt,
                "Data section is too short (is {}-bytes, needs to be {}-bytes)",
                have, need
            ),
            MissingField { name } => write!(fmt, "Mandatory header field {} is missing", name),
            InvalidFieldValue { name, raw } => {
                write!(fmt, "Header field {} has an unparseable value ({:?})", name, raw)
            }
            ParseEnum { f, code } => write!(fmt, "Could not parse source ({}) to {}.", code, f),
            ChannelNotFound { i } => write!(fmt, "Channel no. {} not found.", i),
            ChannelNameNotFound { name } => write!(fmt, "No channel named {} found.", name),
            BadDataVector { have, need } => write!(
                fmt,
                "Data vector has {} samples, but header declares {}.",
                have, need
            ),
            RepeatedEndpoint => write!(fmt, "Rainflow reversal concatenation found a repeated endpoint"),
            InvalidEquivalentSignalParams { msg } => write!(fmt, "Invalid equivalent signal parameters: {}", msg),
            NumericConversion { msg } => write!(fmt, "Numeric conversion failed: {}", msg),
        }
    }
}

impl From<RpcError> for String {
    fn from(e: RpcError) -> String {
        e.to_string()
    }
}

impl std::error::Error for RpcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        use self::RpcError::*;
        match self {
            StdIoError(x) => x.source(),
            TryFromSlice(x) => x.source(),
            TryFromUtf8(x) => x.source(),
            _ => None,
        }
    }
}
