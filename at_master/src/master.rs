use heapless::Vec;

use crate::{
    command::{AtCommand, CommandId, Matched, ResponseHandler},
    helpers::LossyStr,
    Error,
};

/// Fixed capacity registry of response headers.
///
/// Lines are matched against the registered headers in registration order
/// and the first header that prefixes the line wins. A catch-all entry with
/// an empty header must therefore be registered last, or it shadows every
/// entry after it.
///
/// Entries cannot be removed once registered.
pub struct AtMaster<'a, T, const N: usize> {
    commands: Vec<AtCommand<'a, T>, N>,
}

impl<'a, T: Copy, const N: usize> Default for AtMaster<'a, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Copy, const N: usize> AtMaster<'a, T, N> {
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Register `handler` for every line starting with `header`.
    ///
    /// Lines passed to the handler are cut to `max_len` bytes, so `max_len`
    /// may not be shorter than the header itself.
    pub fn register(
        &mut self,
        header: &'a [u8],
        max_len: usize,
        owner: T,
        handler: &'a dyn ResponseHandler<T>,
    ) -> Result<CommandId, Error> {
        if header.len() > max_len {
            error!(
                "Header {:?} does not fit in {} bytes",
                LossyStr(header),
                max_len
            );
            return Err(Error::InvalidArgs);
        }

        let id = CommandId(self.commands.len());
        self.commands
            .push(AtCommand {
                header,
                max_len,
                owner,
                handler,
            })
            .map_err(|_| {
                error!("AT registry full, dropping {:?}", LossyStr(header));
                Error::Capacity
            })?;

        debug!("Registered {:?} as {:?}", LossyStr(header), id);
        Ok(id)
    }

    /// Route one complete line to the first command whose header prefixes
    /// it. Returns the id of that command, or `None` when nothing matched.
    pub fn dispatch(&self, line: &[u8]) -> Option<CommandId> {
        let (index, command) = self
            .commands
            .iter()
            .enumerate()
            .find(|(_, command)| command.matches(line))?;

        let id = CommandId(index);
        trace!("Dispatching {:?} to {:?}", LossyStr(line), id);
        command.handler.on_response(
            Matched {
                id,
                owner: command.owner,
            },
            command.truncate(line),
        );
        Some(id)
    }

    pub fn get(&self, id: CommandId) -> Option<&AtCommand<'a, T>> {
        self.commands.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &AtCommand<'a, T>> {
        self.commands.iter()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn capacity(&self) -> usize {
        N
    }

    pub fn is_full(&self) -> bool {
        self.commands.is_full()
    }
}
