/// Errors returned by the AT master
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Every registry slot is taken
    Capacity,
    /// The registration parameters are inconsistent
    InvalidArgs,
    /// Serial write error
    Write,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Capacity => f.write_str("AT registry is full"),
            Self::InvalidArgs => f.write_str("invalid AT registration"),
            Self::Write => f.write_str("serial write failed"),
        }
    }
}
