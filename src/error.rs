use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unexpected end of input")]
    Truncated,

    #[error("unknown {family} tag: {tag}")]
    UnknownTag { family: &'static str, tag: i32 },

    #[error("malformed header: expected one of {expected:?}, found {found:?}")]
    MalformedHeader {
        expected: &'static [&'static str],
        found: String,
    },

    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    #[error("invalid {what} count: {count}")]
    InvalidCount { what: &'static str, count: i64 },

    #[error("invalid {what} value: {value}")]
    InvalidValue { what: &'static str, value: i64 },

    #[error("string {0:?} cannot be represented in {1}")]
    Unencodable(String, &'static str),

    #[error("io error")]
    Io(#[source] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("bone {bone} has parent {parent}, which is not an earlier bone")]
    BoneParent { bone: usize, parent: i32 },

    #[error("dummy {dummy} has parent {parent}, but the skeleton has {num_bones} bones")]
    DummyParent {
        dummy: usize,
        parent: i32,
        num_bones: usize,
    },

    #[error("channel {channel} targets bone {bone}, but the skeleton has {num_bones} bones")]
    ChannelBone {
        channel: usize,
        bone: i32,
        num_bones: usize,
    },

    #[error("animation has tracks for {animation_bones} bones, but the skeleton has {skeleton_bones}")]
    SkeletonMismatch {
        skeleton_bones: usize,
        animation_bones: usize,
    },
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => Error::Truncated,
            _ => Error::Io(e),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reads a signed element count, rejecting negative values.
pub(crate) fn count(what: &'static str, value: i32) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::InvalidCount {
        what,
        count: value as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eof_becomes_truncated() {
        let e: Error = io::Error::from(io::ErrorKind::UnexpectedEof).into();
        assert!(matches!(e, Error::Truncated));

        let e: Error = io::Error::from(io::ErrorKind::PermissionDenied).into();
        assert!(matches!(e, Error::Io(_)));
    }

    #[test]
    fn negative_counts_are_rejected() {
        assert_eq!(count("bone", 3).unwrap(), 3);
        assert!(matches!(
            count("bone", -1),
            Err(Error::InvalidCount { count: -1, .. })
        ));
    }

    #[test]
    fn io_errors_keep_their_cause() {
        use std::error::Error as _;

        let e: Error = io::Error::new(io::ErrorKind::PermissionDenied, "locked").into();
        let source = e.source().expect("io error has a source");
        assert_eq!(source.to_string(), "locked");
    }
}
