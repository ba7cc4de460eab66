/// Tagged reference to the endpoint that originated a transaction.
///
/// Never lifetime-owning: the reference is resolved against the live pool
/// each time an outcome is delivered, so an endpoint that disconnected
/// mid-transaction is detected rather than dereferenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRef {
    /// The local console.
    Console,
    /// A client connection slot, by index.
    Client(usize),
}

impl std::fmt::Display for EndpointRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointRef::Console => write!(f, "console"),
            EndpointRef::Client(index) => write!(f, "client[{index}]"),
        }
    }
}
