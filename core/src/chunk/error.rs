use std::fmt;

/// Format error raised while loading a precompiled chunk.
///
/// Loading is all-or-nothing: once one of these is returned the input must be
/// discarded, no partially decoded prototype is ever handed out.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkError {
    NotAChunk,
    VersionMismatch { found: u8 },
    FormatMismatch { found: u8 },
    Corrupted,
    SizeMismatch { what: &'static str, expected: u8, found: u8 },
    EndiannessMismatch,
    FloatFormatMismatch { found: f64 },
    UnknownConstantTag { tag: u8, offset: usize },
    UnexpectedEof { what: &'static str, offset: usize },
    NestingTooDeep { limit: usize },
    LineInfoMismatch { code: usize, line_info: usize },
    TrailingBytes { count: usize },
}

impl ChunkError {
    /// Header mismatches, as opposed to problems in the function body.
    pub fn is_header_error(&self) -> bool {
        matches!(
            self,
            ChunkError::NotAChunk
                | ChunkError::VersionMismatch { .. }
                | ChunkError::FormatMismatch { .. }
                | ChunkError::Corrupted
                | ChunkError::SizeMismatch { .. }
                | ChunkError::EndiannessMismatch
                | ChunkError::FloatFormatMismatch { .. }
        )
    }
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::NotAChunk => write!(f, "not a precompiled chunk"),
            ChunkError::VersionMismatch { found } => {
                write!(f, "version mismatch (found {:#04x}, expected {:#04x})", found, super::LUAC_VERSION)
            }
            ChunkError::FormatMismatch { found } => {
                write!(f, "format mismatch (found {}, expected {})", found, super::LUAC_FORMAT)
            }
            ChunkError::Corrupted => write!(f, "corrupted chunk"),
            ChunkError::SizeMismatch { what, expected, found } => {
                write!(f, "{} size mismatch (found {}, expected {})", what, found, expected)
            }
            ChunkError::EndiannessMismatch => write!(f, "endianness mismatch"),
            ChunkError::FloatFormatMismatch { found } => write!(f, "float format mismatch (found {})", found),
            ChunkError::UnknownConstantTag { tag, offset } => {
                write!(f, "corrupted chunk: unknown constant tag {:#04x} at offset {}", tag, offset)
            }
            ChunkError::UnexpectedEof { what, offset } => {
                write!(f, "truncated chunk: unexpected end of input while reading {} at offset {}", what, offset)
            }
            ChunkError::NestingTooDeep { limit } => {
                write!(f, "function prototypes nested deeper than {}", limit)
            }
            ChunkError::LineInfoMismatch { code, line_info } => write!(
                f,
                "corrupted chunk: {} line info entries for {} instructions",
                line_info, code
            ),
            ChunkError::TrailingBytes { count } => write!(f, "{} unexpected trailing bytes after chunk", count),
        }
    }
}

impl std::error::Error for ChunkError {}
