/// Position of a command in its registry.
///
/// Ids are handed out in registration order, which is also the order in
/// which headers are tried against incoming lines.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CommandId(pub(crate) usize);

impl CommandId {
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Identity of the command a line was dispatched to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Matched<T> {
    pub id: CommandId,
    /// Owner given at registration
    pub owner: T,
}

/// Receives the lines routed to a registered command.
///
/// Any `Fn(Matched<T>, &[u8])` closure is a handler:
///
/// ```
/// use at_master::{AtMaster, Matched};
/// use core::cell::Cell;
///
/// let hits = Cell::new(0);
/// let on_ok = |_: Matched<u8>, line: &[u8]| {
///     if line == b"OK" {
///         hits.set(hits.get() + 1);
///     }
/// };
///
/// let mut master: AtMaster<'_, u8, 1> = AtMaster::new();
/// master.register(b"OK", 2, 0, &on_ok).unwrap();
/// master.dispatch(b"OK");
/// assert_eq!(hits.get(), 1);
/// ```
pub trait ResponseHandler<T> {
    /// `line` is the received line without its terminator, cut to the
    /// maximum length given at registration.
    fn on_response(&self, matched: Matched<T>, line: &[u8]);
}

impl<T, F> ResponseHandler<T> for F
where
    F: Fn(Matched<T>, &[u8]),
{
    fn on_response(&self, matched: Matched<T>, line: &[u8]) {
        self(matched, line)
    }
}

/// A registered response header.
pub struct AtCommand<'a, T> {
    pub(crate) header: &'a [u8],
    pub(crate) max_len: usize,
    pub(crate) owner: T,
    pub(crate) handler: &'a dyn ResponseHandler<T>,
}

impl<'a, T: Copy> AtCommand<'a, T> {
    pub fn header(&self) -> &'a [u8] {
        self.header
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn owner(&self) -> T {
        self.owner
    }

    /// An empty header matches every line.
    pub fn matches(&self, line: &[u8]) -> bool {
        line.starts_with(self.header)
    }

    pub(crate) fn truncate<'l>(&self, line: &'l [u8]) -> &'l [u8] {
        &line[..line.len().min(self.max_len)]
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for AtCommand<'_, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AtCommand")
            .field("header", &crate::helpers::LossyStr(self.header))
            .field("max_len", &self.max_len)
            .field("owner", &self.owner)
            .finish()
    }
}
