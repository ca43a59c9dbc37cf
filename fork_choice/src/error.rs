use proto_array::Hash256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Folded in from the tree (`proto_array`): unknown parent, duplicate root, unknown
    /// justified/finalized root, invalid best-descendant cache, a `NilNode` ancestor walk, or a
    /// cancelled deep traversal.
    ProtoArray(proto_array::Error),
    /// `UpdateJustifiedCheckpoint` was called with an epoch older than the current justified
    /// epoch. The checkpoint is left unchanged.
    NonMonotonicJustifiedCheckpoint {
        current_epoch: proto_array::Epoch,
        new_epoch: proto_array::Epoch,
    },
    /// `AncestorRoot` (or another read) was asked about a root fork choice has never seen.
    UnknownBlock(Hash256),
}

impl From<proto_array::Error> for Error {
    fn from(e: proto_array::Error) -> Self {
        Error::ProtoArray(e)
    }
}
