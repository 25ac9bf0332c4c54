pub mod atomic;
pub mod collation;
pub mod consts;
pub mod context;
pub mod error;
pub mod node;
pub mod sequence;
pub mod simple_node;
pub mod temporal;
pub mod types;

pub use atomic::{
    ArithmeticOp, AtomicValue, BinaryEncoding, BinaryValue, ComparisonOp, DecimalValue, DoubleValue,
    FloatValue, IntegerKind, IntegerValue, NativeKind, NativeValue, QNameValue, StringKind, StringValue,
};
pub use collation::{Collation, CollationRegistry};
pub use context::{XdmContext, XdmContextBuilder};
pub use error::{Error, ErrorCode, ErrorKind};
pub use node::{NodeCollection, NodeKind, NodeStore, XdmNode};
pub use sequence::{
    Cardinality, EmptyOrder, Group, GroupSpec, GroupedSequence, OrderSpec, OrderedSequence, Sequence,
    SequenceState, SortDirection, SubSequence, ValueSequence, XdmItem,
};
pub use simple_node::{SimpleNode, SimpleNodeBuilder, SimpleStore, attr, elem, ns, text, doc as simple_doc};
pub use temporal::{DateTimeKind, DateTimeValue, DurationKind, DurationValue, TzOffset};
pub use types::{TypeRegistry, XdmType, registry};
